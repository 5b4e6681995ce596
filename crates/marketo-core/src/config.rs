//! Configuration management for the Marketo client

use crate::constants::{DEFAULT_CONNECTION_TIMEOUT_SECS, SOAP_API_PATH};
use crate::error::{MarketoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Raw configuration as found in a config file or the environment.
/// Every field is optional here so each missing one can be reported on its own.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default, alias = "user_id")]
    access_id: Option<String>,

    #[serde(default, alias = "encryption_key")]
    secret_key: Option<String>,

    #[serde(default, alias = "soap_host")]
    endpoint_host: Option<String>,

    #[serde(default)]
    connection_timeout_secs: Option<u64>,
}

/// Credentials and endpoint for one Marketo instance
#[derive(Clone, Serialize, Deserialize)]
pub struct MarketoConfig {
    /// API access key (Marketo's "user id")
    pub access_id: String,

    /// Signing key (Marketo's "encryption key")
    pub secret_key: String,

    /// Host of the SOAP endpoint, e.g. `na-c.marketo.com`
    pub endpoint_host: String,

    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,
}

fn default_connection_timeout_secs() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_SECS
}

impl fmt::Debug for MarketoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarketoConfig")
            .field("access_id", &self.access_id)
            .field("secret_key", &"***")
            .field("endpoint_host", &self.endpoint_host)
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .finish()
    }
}

impl MarketoConfig {
    /// Build a configuration from explicit values
    pub fn new(
        access_id: impl Into<String>,
        secret_key: impl Into<String>,
        endpoint_host: impl Into<String>,
    ) -> Result<Self> {
        let config = Self {
            access_id: access_id.into(),
            secret_key: secret_key.into(),
            endpoint_host: endpoint_host.into(),
            connection_timeout_secs: DEFAULT_CONNECTION_TIMEOUT_SECS,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_connection_timeout_secs(mut self, secs: u64) -> Self {
        self.connection_timeout_secs = secs;
        self
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MarketoError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_json_str(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(json)
            .map_err(|e| MarketoError::Config(format!("Failed to parse config: {}", e)))?;

        Self::from_raw_config(raw)
    }

    /// Load configuration from `MARKETO_USER_ID`, `MARKETO_ENCRYPTION_KEY`,
    /// `MARKETO_SOAP_HOST` and optionally `MARKETO_CONNECTION_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Self::from_environment(config::Environment::with_prefix("MARKETO"))
    }

    fn from_environment(environment: config::Environment) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(environment)
            .build()
            .map_err(|e| MarketoError::Config(format!("Failed to read environment: {}", e)))?;

        let raw: RawConfig = settings
            .try_deserialize()
            .map_err(|e| MarketoError::Config(format!("Failed to parse environment: {}", e)))?;

        Self::from_raw_config(raw)
    }

    fn from_raw_config(raw: RawConfig) -> Result<Self> {
        let config = Self {
            access_id: raw.access_id.ok_or(MarketoError::MissingAccessId)?,
            secret_key: raw.secret_key.ok_or(MarketoError::MissingSecretKey)?,
            endpoint_host: raw.endpoint_host.ok_or(MarketoError::MissingEndpointHost)?,
            connection_timeout_secs: raw
                .connection_timeout_secs
                .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_SECS),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration; blank values count as missing
    pub fn validate(&self) -> Result<()> {
        if self.access_id.trim().is_empty() {
            return Err(MarketoError::MissingAccessId);
        }

        if self.secret_key.trim().is_empty() {
            return Err(MarketoError::MissingSecretKey);
        }

        if self.endpoint_host.trim().is_empty() {
            return Err(MarketoError::MissingEndpointHost);
        }

        if self.connection_timeout_secs == 0 {
            return Err(MarketoError::Config(
                "connection_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// SOAP endpoint, e.g. `https://na-c.marketo.com/soap/mktows/1_8`
    pub fn endpoint_url(&self) -> String {
        format!("https://{}{}", self.endpoint_host.trim(), SOAP_API_PATH)
    }

    /// Location of the machine-readable service description
    pub fn service_description_url(&self) -> String {
        format!("{}?WSDL", self.endpoint_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_source(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("MARKETO").source(Some(map))
    }

    #[test]
    fn test_endpoint_urls() {
        let config = MarketoConfig::new("bigcorp1_123", "secret", "na-c.marketo.com").unwrap();
        assert_eq!(config.endpoint_url(), "https://na-c.marketo.com/soap/mktows/1_8");
        assert_eq!(
            config.service_description_url(),
            "https://na-c.marketo.com/soap/mktows/1_8?WSDL"
        );
        assert_eq!(config.connection_timeout_secs, 20);
    }

    #[test]
    fn test_each_missing_field_has_its_own_error() {
        assert!(matches!(
            MarketoConfig::new("", "secret", "host"),
            Err(MarketoError::MissingAccessId)
        ));
        assert!(matches!(
            MarketoConfig::new("id", "  ", "host"),
            Err(MarketoError::MissingSecretKey)
        ));
        assert!(matches!(
            MarketoConfig::new("id", "secret", ""),
            Err(MarketoError::MissingEndpointHost)
        ));
    }

    #[test]
    fn test_from_environment() {
        let config = MarketoConfig::from_environment(env_source(&[
            ("MARKETO_USER_ID", "bigcorp1_123"),
            ("MARKETO_ENCRYPTION_KEY", "s3cr3t"),
            ("MARKETO_SOAP_HOST", "na-c.marketo.com"),
        ]))
        .unwrap();

        assert_eq!(config.access_id, "bigcorp1_123");
        assert_eq!(config.secret_key, "s3cr3t");
        assert_eq!(config.endpoint_host, "na-c.marketo.com");
        assert_eq!(config.connection_timeout_secs, 20);
    }

    #[test]
    fn test_from_environment_missing_secret() {
        let result = MarketoConfig::from_environment(env_source(&[
            ("MARKETO_USER_ID", "bigcorp1_123"),
            ("MARKETO_SOAP_HOST", "na-c.marketo.com"),
        ]));
        assert!(matches!(result, Err(MarketoError::MissingSecretKey)));
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = MarketoConfig::new("id", "very-secret", "host").unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("host"));
    }
}
