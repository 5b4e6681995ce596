//! Marketo SOAP client
//!
//! Every operation builds its payload, signs a fresh authentication header,
//! makes exactly one remote call and normalizes what comes back. The client
//! holds nothing but the immutable configuration and the transport.

use crate::auth::sign_request;
use crate::config::MarketoConfig;
use crate::constants::{
    LEAD_NOT_FOUND_CODE, OP_GET_CAMPAIGNS_FOR_SOURCE, OP_GET_LEAD, OP_REQUEST_CAMPAIGN,
    OP_SYNC_LEAD,
};
use crate::error::{MarketoError, Result};
use crate::soap::{HttpSoapTransport, SoapTransport};
use crate::translation::{
    build_get_campaigns, build_get_lead, build_lead_record, build_request_campaign,
    build_sync_lead, format_leads, normalize_synced_lead,
};
use log::{debug, info, warn};
use marketo_types::{AttributeValue, CampaignTarget, LeadIdentifier, LeadKey, NormalizedLead, SyncedLead};
use serde_json::Value;

pub struct MarketoClient<T = HttpSoapTransport> {
    config: MarketoConfig,
    transport: T,
}

impl MarketoClient<HttpSoapTransport> {
    /// Create a client talking SOAP over HTTPS to the configured host
    pub fn new(config: MarketoConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpSoapTransport::new(&config)?;
        info!("Marketo client ready for {}", transport.endpoint_url());
        Ok(Self { config, transport })
    }

    /// Create a client from `MARKETO_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(MarketoConfig::from_env()?)
    }

    /// Check that the endpoint publishes its service description
    pub async fn test_connection(&self) -> Result<bool> {
        match self.transport.fetch_service_description().await {
            Ok(description) => {
                let looks_valid = description.contains("definitions");
                if looks_valid {
                    info!("Marketo service description fetched ({} bytes)", description.len());
                } else {
                    warn!("Marketo service description does not look like a WSDL document");
                }
                Ok(looks_valid)
            }
            Err(e) => {
                warn!("Failed to reach Marketo: {}", e);
                Ok(false)
            }
        }
    }
}

impl<T: SoapTransport> MarketoClient<T> {
    /// Create a client over any transport
    pub fn with_transport(config: MarketoConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &MarketoConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sign and send one operation
    async fn request(&self, operation: &str, payload: Value) -> Result<Value> {
        let header = sign_request(&self.config.access_id, &self.config.secret_key)?;
        debug!("Invoking {}", operation);
        self.transport.invoke(operation, &payload, &header).await
    }

    /// Look up leads by a free-form key type (`"email"`, `"IDNUM"`, ...) and value
    ///
    /// Returns `Ok(None)` when the remote side reports that no lead matches.
    pub async fn get_lead_by(&self, key_type: &str, key_value: &str) -> Result<Option<Vec<NormalizedLead>>> {
        let key = LeadKey::parse(key_type, key_value)?;
        self.get_lead(&key).await
    }

    /// Look up leads by key; `Ok(None)` is the not-found outcome
    pub async fn get_lead(&self, key: &LeadKey) -> Result<Option<Vec<NormalizedLead>>> {
        let payload = build_get_lead(key)?;

        match self.request(OP_GET_LEAD, payload).await {
            Ok(response) => {
                let leads = format_leads(response)?;
                info!("Found {} lead(s) for {} {}", leads.len(), key.key_type, key.key_value);
                Ok(Some(leads))
            }
            Err(MarketoError::RemoteFault { ref code, .. }) if code == LEAD_NOT_FOUND_CODE => {
                info!("No lead found for {} {}", key.key_type, key.key_value);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Create or update a lead and return the stored record
    ///
    /// `lead_key` picks the target: a numeric key is the remote id, anything
    /// else the email address; `None` creates a new lead.
    pub async fn sync_lead<I, K, V>(
        &self,
        attributes: I,
        lead_key: Option<LeadIdentifier>,
        cookie: Option<&str>,
    ) -> Result<SyncedLead>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        let record = build_lead_record(lead_key.as_ref(), attributes);
        debug!("Syncing lead with {} attribute(s)", record.attributes().len());

        let payload = build_sync_lead(record, cookie)?;
        let response = self.request(OP_SYNC_LEAD, payload).await?;
        let synced = normalize_synced_lead(response)?;

        info!(
            "Synced lead {:?} ({})",
            synced.lead_id(),
            synced.status().unwrap_or("unknown status")
        );
        Ok(synced)
    }

    /// List campaigns available to the API source, returned as the remote sends them
    pub async fn get_campaigns(&self, name: Option<&str>) -> Result<Value> {
        let payload = build_get_campaigns(name)?;
        self.request(OP_GET_CAMPAIGNS_FOR_SOURCE, payload).await
    }

    /// Enroll leads into a campaign, returned as the remote sends it
    pub async fn add_to_campaign(&self, target: &CampaignTarget) -> Result<Value> {
        let payload = build_request_campaign(target)?;
        info!(
            "Requesting campaign {:?} for {} lead(s)",
            target.campaign,
            target.leads.len()
        );
        self.request(OP_REQUEST_CAMPAIGN, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_valid_config() {
        let mut config = MarketoConfig::new("id", "secret", "na-c.marketo.com").unwrap();
        config.secret_key.clear();
        assert!(matches!(
            MarketoClient::new(config),
            Err(MarketoError::MissingSecretKey)
        ));
    }

    #[test]
    fn test_client_creation() {
        let config = MarketoConfig::new("id", "secret", "na-c.marketo.com").unwrap();
        let client = MarketoClient::new(config).unwrap();
        assert_eq!(client.config().access_id, "id");
        assert_eq!(client.transport().endpoint_url(), "https://na-c.marketo.com/soap/mktows/1_8");
    }
}
