//! Command line front end for the Marketo client
//!
//! Runs a single operation and prints the result as JSON.

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use marketo_core::{MarketoClient, MarketoConfig};
use marketo_types::{AttributeValue, CampaignTarget, LeadIdentifier, LeadKey};
use serde::Serialize;

fn build_cli() -> Command {
    Command::new("marketo")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Marketo SOAP API client")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("JSON configuration file (defaults to MARKETO_* environment variables)")
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("get-lead")
                .about("Look up leads by key")
                .arg(
                    Arg::new("type")
                        .long("type")
                        .value_name("KEY_TYPE")
                        .help("Key type: email, id, cookie, sfdccontactid, sfdcleadid")
                        .required(true),
                )
                .arg(
                    Arg::new("value")
                        .long("value")
                        .value_name("VALUE")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("sync-lead")
                .about("Create or update a lead")
                .arg(
                    Arg::new("key")
                        .long("key")
                        .value_name("ID_OR_EMAIL")
                        .help("Lead to update; omit to create a new lead"),
                )
                .arg(
                    Arg::new("cookie")
                        .long("cookie")
                        .value_name("COOKIE")
                        .help("Tracking cookie to associate with the lead"),
                )
                .arg(
                    Arg::new("attr")
                        .long("attr")
                        .value_name("NAME=VALUE")
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(
            Command::new("campaigns")
                .about("List campaigns available to the API")
                .arg(Arg::new("name").long("name").value_name("NAME")),
        )
        .subcommand(
            Command::new("request-campaign")
                .about("Add leads to a campaign")
                .arg(
                    Arg::new("campaign")
                        .long("campaign")
                        .value_name("ID_OR_NAME")
                        .required(true),
                )
                .arg(
                    Arg::new("lead")
                        .long("lead")
                        .value_name("TYPE=VALUE")
                        .action(ArgAction::Append)
                        .required(true),
                )
                .arg(Arg::new("program").long("program").value_name("PROGRAM"))
                .arg(
                    Arg::new("token")
                        .long("token")
                        .value_name("NAME=VALUE")
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(Command::new("test-connection").about("Check that the endpoint is reachable"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with INFO as default if RUST_LOG not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = build_cli().get_matches();

    let config = match matches.get_one::<String>("config") {
        Some(path) => {
            let config = MarketoConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path))?;
            log::info!("Loaded configuration from {}", path);
            config
        }
        None => MarketoConfig::from_env().context("Failed to load configuration from environment")?,
    };

    let client = MarketoClient::new(config)?;

    match matches.subcommand() {
        Some(("get-lead", args)) => {
            let leads = client
                .get_lead_by(required(args, "type")?, required(args, "value")?)
                .await?;
            print_json(&leads)
        }
        Some(("sync-lead", args)) => {
            let attributes = values(args, "attr")
                .map(|pair| split_pair(pair).map(|(name, value)| (name, parse_attribute_value(&value))))
                .collect::<Result<Vec<_>>>()?;
            let key = args.get_one::<String>("key").map(|k| LeadIdentifier::from(k.as_str()));
            let cookie = args.get_one::<String>("cookie").map(String::as_str);

            let synced = client.sync_lead(attributes, key, cookie).await?;
            print_json(&synced)
        }
        Some(("campaigns", args)) => {
            let name = args.get_one::<String>("name").map(String::as_str);
            let campaigns = client.get_campaigns(name).await?;
            print_json(&campaigns)
        }
        Some(("request-campaign", args)) => {
            let target = campaign_target(args)?;
            let result = client.add_to_campaign(&target).await?;
            print_json(&result)
        }
        Some(("test-connection", _)) => {
            if client.test_connection().await? {
                println!("Marketo endpoint reachable: {}", client.config().endpoint_url());
                Ok(())
            } else {
                bail!("Marketo endpoint not reachable: {}", client.config().endpoint_url())
            }
        }
        _ => bail!("Unknown command"),
    }
}

fn campaign_target(args: &ArgMatches) -> Result<CampaignTarget> {
    let leads = values(args, "lead")
        .map(|pair| split_pair(pair))
        .collect::<Result<Vec<_>>>()?;
    let leads = LeadKey::parse_pairs(leads)?;

    let mut target = CampaignTarget::new(required(args, "campaign")?, leads);

    if let Some(program) = args.get_one::<String>("program") {
        target = target.with_program_name(program.as_str());
    }

    let tokens = values(args, "token")
        .map(|pair| split_pair(pair))
        .collect::<Result<Vec<_>>>()?;
    if !tokens.is_empty() {
        target = target.with_tokens(tokens);
    }

    Ok(target)
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("--{} is required", name))
}

fn values<'a>(args: &'a ArgMatches, name: &str) -> impl Iterator<Item = &'a String> {
    args.get_many::<String>(name).into_iter().flatten()
}

/// `NAME=VALUE` → `(NAME, VALUE)`; the value may itself contain `=`
fn split_pair(pair: &str) -> Result<(String, String)> {
    match pair.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => bail!("Expected NAME=VALUE, got '{}'", pair),
    }
}

fn parse_attribute_value(raw: &str) -> AttributeValue {
    match raw {
        "true" => AttributeValue::Boolean(true),
        "false" => AttributeValue::Boolean(false),
        _ => match raw.parse::<i64>() {
            Ok(n) => AttributeValue::Integer(n),
            Err(_) => AttributeValue::String(raw.to_string()),
        },
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketo_types::{CampaignKey, KeyType};

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_parse_attribute_value() {
        assert_eq!(parse_attribute_value("true"), AttributeValue::Boolean(true));
        assert_eq!(parse_attribute_value("false"), AttributeValue::Boolean(false));
        assert_eq!(parse_attribute_value("250"), AttributeValue::Integer(250));
        assert_eq!(parse_attribute_value("-3"), AttributeValue::Integer(-3));
        assert_eq!(parse_attribute_value("12.5"), AttributeValue::String("12.5".into()));
        assert_eq!(parse_attribute_value("Jane"), AttributeValue::String("Jane".into()));
    }

    #[test]
    fn test_split_pair() {
        assert_eq!(
            split_pair("Title=a=b").unwrap(),
            ("Title".to_string(), "a=b".to_string())
        );
        assert!(split_pair("novalue").is_err());
        assert!(split_pair("=x").is_err());
    }

    #[test]
    fn test_request_campaign_arguments() {
        let matches = build_cli().get_matches_from([
            "marketo",
            "request-campaign",
            "--campaign",
            "321",
            "--lead",
            "email=jane@example.com",
            "--lead",
            "id=17",
            "--program",
            "Spring Webinar",
            "--token",
            "{{my.Speaker}}=Dr. Lee",
        ]);
        let (_, args) = matches.subcommand().unwrap();
        let target = campaign_target(args).unwrap();

        assert_eq!(target.campaign, CampaignKey::Id(321));
        assert_eq!(
            target.leads,
            vec![
                LeadKey::new(KeyType::Email, "jane@example.com"),
                LeadKey::new(KeyType::Id, "17"),
            ]
        );
        assert_eq!(target.program_name.as_deref(), Some("Spring Webinar"));
        assert_eq!(
            target.tokens,
            Some(vec![("{{my.Speaker}}".to_string(), "Dr. Lee".to_string())])
        );
    }
}
