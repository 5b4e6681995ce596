//! SOAP-over-HTTP transport

use crate::auth::AuthHeader;
use crate::config::MarketoConfig;
use crate::constants::MKTOWS_NS;
use crate::error::{MarketoError, Result};
use crate::soap::{build_envelope, parse_response, SoapTransport};
use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// How much of an unexpected response body ends up in error messages
const ERROR_SNIPPET_CHARS: usize = 500;

pub struct HttpSoapTransport {
    http_client: HttpClient,
    endpoint_url: String,
    service_description_url: String,
}

impl HttpSoapTransport {
    pub fn new(config: &MarketoConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .connect_timeout(Duration::from_secs(config.connection_timeout_secs))
            .build()
            .map_err(|e| MarketoError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint_url: config.endpoint_url(),
            service_description_url: config.service_description_url(),
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// Fetch the WSDL published next to the endpoint
    pub async fn fetch_service_description(&self) -> Result<String> {
        debug!("Fetching service description from {}", self.service_description_url);

        let response = self
            .http_client
            .get(&self.service_description_url)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(MarketoError::Transport(format!(
                "Service description request failed with status {}: {}",
                status,
                snippet(&body)
            )));
        }

        Ok(body)
    }
}

#[async_trait]
impl SoapTransport for HttpSoapTransport {
    async fn invoke(&self, operation: &str, payload: &Value, header: &AuthHeader) -> Result<Value> {
        let envelope = build_envelope(operation, payload, header)?;
        debug!("POST {} ({}, {} bytes)", self.endpoint_url, operation, envelope.len());

        let response = self
            .http_client
            .post(&self.endpoint_url)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}{}\"", MKTOWS_NS, operation))
            .body(envelope)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!("{} responded with status {} ({} bytes)", operation, status, body.len());

        decode_response(operation, status, &body)
    }
}

/// Judge a SOAP response by its body first and its status second
///
/// Faults usually arrive with a 500, so a fault body wins over any status.
/// A non-success status without a fault body is a transport failure.
fn decode_response(operation: &str, status: StatusCode, body: &str) -> Result<Value> {
    match parse_response(body) {
        Err(fault @ MarketoError::RemoteFault { .. }) => {
            warn!("{} failed: {}", operation, fault);
            Err(fault)
        }
        Ok(content) if status.is_success() => Ok(content),
        Err(e) if status.is_success() => {
            error!("Failed to decode {} response: {}", operation, e);
            Err(e)
        }
        _ => {
            error!("{} returned status {}: {}", operation, status, snippet(body));
            Err(MarketoError::Transport(format!(
                "{} returned status {}: {}",
                operation,
                status,
                snippet(body)
            )))
        }
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(ERROR_SNIPPET_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LEAD_NOT_FOUND: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">
  <SOAP-ENV:Body>
    <SOAP-ENV:Fault>
      <faultcode>SOAP-ENV:Client</faultcode>
      <faultstring>20103 - Lead not found</faultstring>
      <detail>
        <ns1:serviceException xmlns:ns1="http://www.marketo.com/mktows/">
          <name>mktServiceException</name>
          <message>No lead found with EMAIL = nobody@example.com (20103)</message>
          <code>20103</code>
        </ns1:serviceException>
      </detail>
    </SOAP-ENV:Fault>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

    const CAMPAIGNS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/" xmlns:ns1="http://www.marketo.com/mktows/">
  <SOAP-ENV:Body>
    <ns1:successGetCampaignsForSource>
      <result><returnCount>0</returnCount></result>
    </ns1:successGetCampaignsForSource>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

    #[test]
    fn test_fault_with_server_error_status_is_remote_fault() {
        let err = decode_response("getLead", StatusCode::INTERNAL_SERVER_ERROR, LEAD_NOT_FOUND)
            .unwrap_err();
        assert_eq!(err.fault_code(), Some("20103"));
    }

    #[test]
    fn test_fault_with_success_status_is_remote_fault() {
        let err = decode_response("getLead", StatusCode::OK, LEAD_NOT_FOUND).unwrap_err();
        assert_eq!(err.fault_code(), Some("20103"));
    }

    #[test]
    fn test_html_error_page_is_transport_error() {
        let body = "<!DOCTYPE html><html><body><h1>500 Internal Server Error</h1></body></html>";
        let err = decode_response("getLead", StatusCode::INTERNAL_SERVER_ERROR, body).unwrap_err();
        match err {
            MarketoError::Transport(message) => {
                assert!(message.contains("500"));
                assert!(message.contains("Internal Server Error"));
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_body_with_error_status_is_transport_error() {
        let err = decode_response("syncLead", StatusCode::SERVICE_UNAVAILABLE, "").unwrap_err();
        assert!(matches!(err, MarketoError::Transport(_)));
    }

    #[test]
    fn test_truncated_success_body_is_xml_error() {
        let body = r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"><SOAP-ENV:Body>"#;
        let err = decode_response("getLead", StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, MarketoError::Xml(_)));
    }

    #[test]
    fn test_non_soap_success_body_is_malformed() {
        let err = decode_response("getLead", StatusCode::OK, "<status>ok</status>").unwrap_err();
        assert!(matches!(err, MarketoError::MalformedResponse(_)));
        assert!(err.is_transport());
    }

    #[test]
    fn test_success_body_yields_response_content() {
        let content = decode_response("getCampaignsForSource", StatusCode::OK, CAMPAIGNS).unwrap();
        assert_eq!(content, json!({"result": {"returnCount": "0"}}));
    }

    #[test]
    fn test_transport_uses_config_endpoint() {
        let config = MarketoConfig::new("id", "secret", "na-c.marketo.com").unwrap();
        let transport = HttpSoapTransport::new(&config).unwrap();
        assert_eq!(transport.endpoint_url(), "https://na-c.marketo.com/soap/mktows/1_8");
        assert_eq!(
            transport.service_description_url,
            "https://na-c.marketo.com/soap/mktows/1_8?WSDL"
        );
    }

    #[test]
    fn test_snippet_is_char_safe() {
        let body = "ü".repeat(ERROR_SNIPPET_CHARS + 10);
        assert_eq!(snippet(&body).chars().count(), ERROR_SNIPPET_CHARS);
    }
}
