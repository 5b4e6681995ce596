//! Translation between caller-side shapes and the mktows wire shapes

pub mod request;
pub mod response;

pub use request::{
    build_get_campaigns, build_get_lead, build_lead_record, build_request_campaign,
    build_sync_lead, LeadRecord, WireAttribute,
};
pub use response::{
    attributes_to_wire, flatten_attributes, format_leads, normalize_lead, normalize_synced_lead,
    one_or_many,
};
