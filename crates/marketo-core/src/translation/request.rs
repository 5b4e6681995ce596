//! Outbound payloads for the remote operations
//!
//! Payloads are typed structs serialized into `serde_json::Value`. Field
//! declaration order is the order the elements go out on the wire.

use crate::constants::CAMPAIGN_SOURCE;
use crate::error::Result;
use log::debug;
use marketo_types::{
    AttributeValue, CampaignKey, CampaignTarget, LeadIdentifier, LeadKey, TYPE_BOOLEAN,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GetLeadParams<'a> {
    lead_key: &'a LeadKey,
}

/// One entry of a lead's attribute list as sent to the remote side
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAttribute {
    pub attr_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attr_type: Option<String>,
    pub attr_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct AttributeList {
    pub attribute: Vec<WireAttribute>,
}

/// Lead record built for a sync call
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct LeadRecord {
    #[serde(rename = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "Email", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "leadAttributeList")]
    pub lead_attribute_list: AttributeList,
}

impl LeadRecord {
    pub fn attributes(&self) -> &[WireAttribute] {
        &self.lead_attribute_list.attribute
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncLeadParams {
    lead_record: LeadRecord,
    return_lead: bool,
    marketo_cookie: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GetCampaignsParams {
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exact_name: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct LeadKeyList<'a> {
    lead_key: Vec<&'a LeadKey>,
}

#[derive(Debug, Clone, Serialize)]
struct ProgramToken<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ProgramTokenList<'a> {
    attrib: Vec<ProgramToken<'a>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestCampaignParams<'a> {
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    campaign_id: Option<i64>,
    lead_list: LeadKeyList<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    program_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    campaign_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    program_token_list: Option<ProgramTokenList<'a>>,
}

/// `getLead` payload: `{leadKey: {keyType, keyValue}}` with the upper-cased key type
pub fn build_get_lead(key: &LeadKey) -> Result<Value> {
    Ok(serde_json::to_value(GetLeadParams { lead_key: key })?)
}

/// Build the record sent by `syncLead`
///
/// A numeric identifier is sent as the remote id, anything else as the email
/// address; without one the remote side creates a new lead. Booleans become
/// `"1"`/`"0"` tagged `boolean`; every other value goes out untyped so the
/// remote side infers the type.
pub fn build_lead_record<I, K, V>(identifier: Option<&LeadIdentifier>, attributes: I) -> LeadRecord
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<AttributeValue>,
{
    let (id, email) = match identifier {
        Some(LeadIdentifier::Id(id)) => (Some(*id), None),
        Some(LeadIdentifier::Email(email)) => (None, Some(email.clone())),
        None => (None, None),
    };

    let attribute = attributes
        .into_iter()
        .map(|(name, value)| {
            let value = value.into();
            let attr_type = match value {
                AttributeValue::Boolean(_) => Some(TYPE_BOOLEAN.to_string()),
                _ => None,
            };
            WireAttribute {
                attr_name: name.into(),
                attr_type,
                attr_value: value.as_wire_string(),
            }
        })
        .collect();

    LeadRecord {
        id,
        email,
        lead_attribute_list: AttributeList { attribute },
    }
}

/// `syncLead` payload: `{leadRecord, returnLead: true, marketoCookie}`; the cookie is null when absent
pub fn build_sync_lead(record: LeadRecord, cookie: Option<&str>) -> Result<Value> {
    Ok(serde_json::to_value(SyncLeadParams {
        lead_record: record,
        return_lead: true,
        marketo_cookie: cookie.map(str::to_string),
    })?)
}

/// `getCampaignsForSource` payload
///
/// When a name filter is requested the payload carries `exactName: true`
/// with an *empty* `name`. Existing integrations depend on this exact
/// request shape, so the requested name is not forwarded.
pub fn build_get_campaigns(name: Option<&str>) -> Result<Value> {
    let params = match name {
        Some(requested) => {
            debug!("Campaign name filter requested: {}", requested);
            GetCampaignsParams {
                source: CAMPAIGN_SOURCE,
                name: Some(String::new()),
                exact_name: Some(true),
            }
        }
        None => GetCampaignsParams {
            source: CAMPAIGN_SOURCE,
            name: None,
            exact_name: None,
        },
    };

    Ok(serde_json::to_value(params)?)
}

/// `requestCampaign` payload
///
/// Tokens are only attached when both the tokens and the program name are
/// present; a partial pair is dropped.
pub fn build_request_campaign(target: &CampaignTarget) -> Result<Value> {
    let (campaign_id, campaign_name) = match &target.campaign {
        CampaignKey::Id(id) => (Some(*id), None),
        CampaignKey::Name(name) => (None, Some(name.as_str())),
    };

    let (program_name, program_token_list) = match (&target.program_name, &target.tokens) {
        (Some(program), Some(tokens)) => (
            Some(program.as_str()),
            Some(ProgramTokenList {
                attrib: tokens
                    .iter()
                    .map(|(name, value)| ProgramToken { name, value })
                    .collect(),
            }),
        ),
        (Some(_), None) | (None, Some(_)) => {
            debug!("Program name and tokens must be supplied together; dropping both");
            (None, None)
        }
        (None, None) => (None, None),
    };

    Ok(serde_json::to_value(RequestCampaignParams {
        source: CAMPAIGN_SOURCE,
        campaign_id,
        lead_list: LeadKeyList {
            lead_key: target.leads.iter().collect(),
        },
        program_name,
        campaign_name,
        program_token_list,
    })?)
}
