//! Error types for the Marketo client

use thiserror::Error;

/// Main error type for all Marketo operations
#[derive(Error, Debug)]
pub enum MarketoError {
    #[error("Configuration error: access id (MARKETO_USER_ID) is required")]
    MissingAccessId,

    #[error("Configuration error: secret key (MARKETO_ENCRYPTION_KEY) is required")]
    MissingSecretKey,

    #[error("Configuration error: endpoint host (MARKETO_SOAP_HOST) is required")]
    MissingEndpointHost,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Remote fault {code}: {message}")]
    RemoteFault { code: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MarketoError {
    /// Remote-supplied fault code, if this is a service-level failure
    pub fn fault_code(&self) -> Option<&str> {
        match self {
            MarketoError::RemoteFault { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Failures below the service level: connectivity, protocol and decoding
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            MarketoError::Http(_)
                | MarketoError::Transport(_)
                | MarketoError::Xml(_)
                | MarketoError::MalformedResponse(_)
                | MarketoError::Json(_)
        )
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MarketoError::MissingAccessId
                | MarketoError::MissingSecretKey
                | MarketoError::MissingEndpointHost
                | MarketoError::Config(_)
        )
    }
}

impl From<marketo_types::ParseError> for MarketoError {
    fn from(err: marketo_types::ParseError) -> Self {
        MarketoError::Validation(err.to_string())
    }
}

/// Result type for Marketo operations
pub type Result<T> = std::result::Result<T, MarketoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_code_is_exposed() {
        let err = MarketoError::RemoteFault {
            code: "20103".to_string(),
            message: "Lead not found".to_string(),
        };
        assert_eq!(err.fault_code(), Some("20103"));
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "Remote fault 20103: Lead not found");
    }

    #[test]
    fn test_classification() {
        assert!(MarketoError::Transport("timeout".into()).is_transport());
        assert!(MarketoError::MissingSecretKey.is_configuration());
        assert_eq!(MarketoError::MissingAccessId.fault_code(), None);
    }

    #[test]
    fn test_parse_error_becomes_validation() {
        let err: MarketoError = marketo_types::ParseError::UnknownKeyType("fax".into()).into();
        assert!(matches!(err, MarketoError::Validation(ref msg) if msg.contains("fax")));
    }
}
