//! Marketo Core Library
//!
//! Client for the Marketo SOAP API: signs every request, builds operation
//! payloads from typed input and normalizes lead records in the responses.

pub mod auth;
pub mod clients;
pub mod config;
pub mod constants;
pub mod error;
pub mod soap;
pub mod translation;

// Re-export main types for easy access
pub use clients::MarketoClient;
pub use config::MarketoConfig;
pub use error::{MarketoError, Result};
pub use soap::{HttpSoapTransport, SoapTransport};

pub use marketo_types::{
    AttributeValue, CampaignKey, CampaignTarget, KeyType, LeadIdentifier, LeadKey, NormalizedLead,
    SyncedLead,
};
