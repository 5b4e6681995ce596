//! Marketo SOAP API constants

/// Path of the mktows 1.8 endpoint on the instance host
pub const SOAP_API_PATH: &str = "/soap/mktows/1_8";

/// Namespace of the request/response elements and the authentication header
pub const MKTOWS_NS: &str = "http://www.marketo.com/mktows/";

/// Fault code the remote side returns when a lookup matches no lead
pub const LEAD_NOT_FOUND_CODE: &str = "20103";

/// Campaign source sent with campaign listing and enrollment calls
pub const CAMPAIGN_SOURCE: &str = "MKTOWS";

/// Connection timeout handed to the transport when none is configured
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 20;

/// Remote operation names
pub const OP_GET_LEAD: &str = "getLead";
pub const OP_SYNC_LEAD: &str = "syncLead";
pub const OP_GET_CAMPAIGNS_FOR_SOURCE: &str = "getCampaignsForSource";
pub const OP_REQUEST_CAMPAIGN: &str = "requestCampaign";
