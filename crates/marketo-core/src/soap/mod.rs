//! SOAP transport: the seam between payload translation and the wire

pub mod envelope;
pub mod http;
pub mod parser;

use crate::auth::AuthHeader;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use envelope::build_envelope;
pub use http::HttpSoapTransport;
pub use parser::{parse_document, parse_response};

/// Performs one named remote operation
///
/// Implementations send `payload` as the operation's request element with
/// `header` attached, and return the content of the response element (an
/// object with a `result` key for mktows). Service-level failures come back
/// as `MarketoError::RemoteFault`.
#[async_trait]
pub trait SoapTransport: Send + Sync {
    async fn invoke(&self, operation: &str, payload: &Value, header: &AuthHeader) -> Result<Value>;
}
