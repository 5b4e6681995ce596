//! Shared types for the Marketo SOAP client

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Attribute type tags the remote side uses that map onto local scalars
pub const TYPE_INTEGER: &str = "integer";
pub const TYPE_STRING: &str = "string";
pub const TYPE_BOOLEAN: &str = "boolean";
pub const TYPE_FLOAT: &str = "float";

/// Identifier type used to locate an existing lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    #[serde(rename = "IDNUM")]
    Id,
    #[serde(rename = "COOKIE")]
    Cookie,
    #[serde(rename = "EMAIL")]
    Email,
    #[serde(rename = "SFDCCONTACTID")]
    SfdcContactId,
    #[serde(rename = "SFDCLEADID")]
    SfdcLeadId,
}

impl KeyType {
    /// Upper-cased wire spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Id => "IDNUM",
            KeyType::Cookie => "COOKIE",
            KeyType::Email => "EMAIL",
            KeyType::SfdcContactId => "SFDCCONTACTID",
            KeyType::SfdcLeadId => "SFDCLEADID",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = ParseError;

    /// Case-insensitive; accepts both the wire spelling and the underscored form
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "ID" | "IDNUM" => Ok(KeyType::Id),
            "COOKIE" => Ok(KeyType::Cookie),
            "EMAIL" => Ok(KeyType::Email),
            "SFDC_CONTACT_ID" | "SFDCCONTACTID" => Ok(KeyType::SfdcContactId),
            "SFDC_LEAD_ID" | "SFDCLEADID" => Ok(KeyType::SfdcLeadId),
            _ => Err(ParseError::UnknownKeyType(s.to_string())),
        }
    }
}

/// Key used to locate an existing remote lead
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadKey {
    pub key_type: KeyType,
    pub key_value: String,
}

impl LeadKey {
    pub fn new(key_type: KeyType, key_value: impl Into<String>) -> Self {
        Self {
            key_type,
            key_value: key_value.into(),
        }
    }

    /// Build a key from free-form type text, e.g. `("email", "a@b.c")`
    pub fn parse(key_type: &str, key_value: impl Into<String>) -> Result<Self> {
        Ok(Self::new(key_type.parse()?, key_value))
    }

    /// Build keys from a list of single-key `(type, value)` mappings, preserving order
    pub fn parse_pairs<I, K, V>(pairs: I) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(key_type, key_value)| Self::parse(key_type.as_ref(), key_value))
            .collect()
    }
}

/// A typed attribute scalar
///
/// On the wire every attribute is a string plus an optional type tag.
/// Locally the value is cast to the tagged type when the tag is recognized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Cast a wire value according to its type tag
    pub fn from_wire(value: Option<&str>, attr_type: Option<&str>) -> Self {
        let Some(raw) = value else {
            return AttributeValue::Null;
        };

        match attr_type {
            Some(TYPE_INTEGER) => AttributeValue::Integer(loose_int(raw)),
            Some(TYPE_FLOAT) => AttributeValue::Float(loose_float(raw)),
            Some(TYPE_BOOLEAN) => AttributeValue::Boolean(!(raw.is_empty() || raw == "0")),
            _ => AttributeValue::String(raw.to_string()),
        }
    }

    /// Tagged wire form: `(value, type tag)`
    pub fn to_wire(&self) -> (Option<String>, Option<&'static str>) {
        match self {
            AttributeValue::Null => (None, None),
            AttributeValue::Boolean(b) => (Some(bool_wire(*b).to_string()), Some(TYPE_BOOLEAN)),
            AttributeValue::Integer(i) => (Some(i.to_string()), Some(TYPE_INTEGER)),
            AttributeValue::Float(f) => (Some(f.to_string()), Some(TYPE_FLOAT)),
            AttributeValue::String(s) => (Some(s.clone()), Some(TYPE_STRING)),
        }
    }

    /// Untagged string form, as used when handing values to the remote side for inference
    pub fn as_wire_string(&self) -> Option<String> {
        match self {
            AttributeValue::Null => None,
            AttributeValue::Boolean(b) => Some(bool_wire(*b).to_string()),
            AttributeValue::Integer(i) => Some(i.to_string()),
            AttributeValue::Float(f) => Some(f.to_string()),
            AttributeValue::String(s) => Some(s.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

fn bool_wire(b: bool) -> &'static str {
    if b { "1" } else { "0" }
}

/// Integer value of the leading numeric text, 0 when there is none
///
/// A prefix in decimal or exponent form (`"1.9"`, `"1e3"`) goes through the
/// float cast and is truncated toward zero, so `"1e3"` is 1000.
fn loose_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digit_count = digits.bytes().take_while(|b| b.is_ascii_digit()).count();
    if matches!(digits.as_bytes().get(digit_count), Some(b'.' | b'e' | b'E')) {
        return loose_float(s) as i64;
    }

    let mut value: i64 = 0;
    for b in digits[..digit_count].bytes() {
        let digit = i64::from(b - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}

/// Longest numeric prefix, 0.0 when there is none
fn loose_float(raw: &str) -> f64 {
    let s = raw.trim();
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() {
            return f;
        }
    }

    let numeric_start = s
        .chars()
        .next()
        .map(|c| c.is_ascii_digit() || c == '-' || c == '+' || c == '.')
        .unwrap_or(false);
    if !numeric_start {
        return 0.0;
    }

    (1..s.len())
        .rev()
        .filter(|end| s.is_char_boundary(*end))
        .find_map(|end| s[..end].parse::<f64>().ok().filter(|f| f.is_finite()))
        .unwrap_or(0.0)
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Boolean(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Integer(i64::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttributeValue::Null)
    }
}

/// Identity of the lead a sync call writes to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadIdentifier {
    /// Remote lead id
    Id(i64),
    Email(String),
}

impl From<i64> for LeadIdentifier {
    fn from(value: i64) -> Self {
        LeadIdentifier::Id(value)
    }
}

impl From<i32> for LeadIdentifier {
    fn from(value: i32) -> Self {
        LeadIdentifier::Id(i64::from(value))
    }
}

impl From<&str> for LeadIdentifier {
    /// Integer text is a remote id, anything else an email address.
    /// Remote ids are integers, so `"1.5"` or `"1e3"` stay email text.
    fn from(value: &str) -> Self {
        match value.trim().parse::<i64>() {
            Ok(id) => LeadIdentifier::Id(id),
            Err(_) => LeadIdentifier::Email(value.to_string()),
        }
    }
}

impl From<String> for LeadIdentifier {
    fn from(value: String) -> Self {
        LeadIdentifier::from(value.as_str())
    }
}

/// Campaign reference: by id when numeric, by name otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignKey {
    Id(i64),
    Name(String),
}

impl From<i64> for CampaignKey {
    fn from(value: i64) -> Self {
        CampaignKey::Id(value)
    }
}

impl From<i32> for CampaignKey {
    fn from(value: i32) -> Self {
        CampaignKey::Id(i64::from(value))
    }
}

impl From<&str> for CampaignKey {
    /// Integer text is a campaign id, anything else (`"1.5"` included) a campaign name
    fn from(value: &str) -> Self {
        match value.trim().parse::<i64>() {
            Ok(id) => CampaignKey::Id(id),
            Err(_) => CampaignKey::Name(value.to_string()),
        }
    }
}

impl From<String> for CampaignKey {
    fn from(value: String) -> Self {
        CampaignKey::from(value.as_str())
    }
}

/// Everything needed to enroll leads into a campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignTarget {
    pub campaign: CampaignKey,
    pub leads: Vec<LeadKey>,
    pub program_name: Option<String>,
    /// Program tokens, in caller order
    pub tokens: Option<Vec<(String, String)>>,
}

impl CampaignTarget {
    /// `leads` takes any collection of keys; a single key goes in as `[key]` or `Some(key)`
    pub fn new(campaign: impl Into<CampaignKey>, leads: impl IntoIterator<Item = LeadKey>) -> Self {
        Self {
            campaign: campaign.into(),
            leads: leads.into_iter().collect(),
            program_name: None,
            tokens: None,
        }
    }

    pub fn with_program_name(mut self, program_name: impl Into<String>) -> Self {
        self.program_name = Some(program_name.into());
        self
    }

    pub fn with_tokens<I, K, V>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.tokens = Some(
            tokens
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        );
        self
    }
}

/// A lead record with its attribute list flattened into a mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NormalizedLead {
    /// Remote metadata passed through as-is (Id, Email, ForeignSysPersonId, ...)
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl NormalizedLead {
    /// Remote lead id, whether it arrived as text or a number
    pub fn id(&self) -> Option<i64> {
        match self.fields.get("Id")? {
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.fields.get("Email").and_then(Value::as_str)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

/// Result of an upsert: pass-through status fields plus the normalized record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedLead {
    /// leadId, syncStatus and anything else the remote returns alongside the record
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    #[serde(rename = "leadRecord")]
    pub lead_record: NormalizedLead,
}

impl SyncedLead {
    pub fn lead_id(&self) -> Option<i64> {
        match self.fields.get("leadId")? {
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// CREATED / UPDATED / FAILED, as reported in syncStatus
    pub fn status(&self) -> Option<&str> {
        self.fields
            .get("syncStatus")
            .and_then(|s| s.get("status"))
            .and_then(Value::as_str)
    }
}

/// Errors raised while turning caller input into typed values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unknown lead key type: {0}")]
    UnknownKeyType(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_type_is_case_insensitive() {
        for input in ["email", "EMAIL", "Email", " eMaIl "] {
            assert_eq!(input.parse::<KeyType>().unwrap(), KeyType::Email);
            assert_eq!(input.parse::<KeyType>().unwrap().as_str(), "EMAIL");
        }
    }

    #[test]
    fn test_key_type_aliases() {
        assert_eq!("id".parse::<KeyType>().unwrap().as_str(), "IDNUM");
        assert_eq!("idnum".parse::<KeyType>().unwrap().as_str(), "IDNUM");
        assert_eq!("sfdc_contact_id".parse::<KeyType>().unwrap().as_str(), "SFDCCONTACTID");
        assert_eq!("SfdcLeadId".parse::<KeyType>().unwrap().as_str(), "SFDCLEADID");
        assert_eq!("cookie".parse::<KeyType>().unwrap(), KeyType::Cookie);
    }

    #[test]
    fn test_unknown_key_type_is_rejected() {
        let err = "phone".parse::<KeyType>().unwrap_err();
        assert_eq!(err, ParseError::UnknownKeyType("phone".to_string()));
    }

    #[test]
    fn test_parse_pairs_preserves_order() {
        let keys = LeadKey::parse_pairs(vec![("email", "a@example.com"), ("idnum", "42")]).unwrap();
        assert_eq!(keys[0], LeadKey::new(KeyType::Email, "a@example.com"));
        assert_eq!(keys[1], LeadKey::new(KeyType::Id, "42"));
    }

    #[test]
    fn test_from_wire_casts_tagged_values() {
        assert_eq!(AttributeValue::from_wire(Some("42"), Some("integer")), AttributeValue::Integer(42));
        assert_eq!(AttributeValue::from_wire(Some("2.5"), Some("float")), AttributeValue::Float(2.5));
        assert_eq!(AttributeValue::from_wire(Some("1"), Some("boolean")), AttributeValue::Boolean(true));
        assert_eq!(AttributeValue::from_wire(Some("0"), Some("boolean")), AttributeValue::Boolean(false));
        assert_eq!(AttributeValue::from_wire(Some(""), Some("boolean")), AttributeValue::Boolean(false));
        assert_eq!(AttributeValue::from_wire(Some("007"), Some("string")), AttributeValue::String("007".into()));
    }

    #[test]
    fn test_from_wire_leaves_unknown_types_as_strings() {
        assert_eq!(
            AttributeValue::from_wire(Some("2024-01-01"), Some("date")),
            AttributeValue::String("2024-01-01".into())
        );
        assert_eq!(AttributeValue::from_wire(Some("12"), None), AttributeValue::String("12".into()));
        assert_eq!(AttributeValue::from_wire(None, Some("integer")), AttributeValue::Null);
    }

    #[test]
    fn test_loose_numeric_casts() {
        assert_eq!(AttributeValue::from_wire(Some("12abc"), Some("integer")), AttributeValue::Integer(12));
        assert_eq!(AttributeValue::from_wire(Some("abc"), Some("integer")), AttributeValue::Integer(0));
        assert_eq!(AttributeValue::from_wire(Some("-7"), Some("integer")), AttributeValue::Integer(-7));
        assert_eq!(AttributeValue::from_wire(Some("3.25kg"), Some("float")), AttributeValue::Float(3.25));
        assert_eq!(AttributeValue::from_wire(Some("n/a"), Some("float")), AttributeValue::Float(0.0));
    }

    #[test]
    fn test_integer_cast_of_decimal_and_exponent_text() {
        let int = |raw| AttributeValue::from_wire(Some(raw), Some("integer"));
        assert_eq!(int("1e3"), AttributeValue::Integer(1000));
        assert_eq!(int("2.5E2"), AttributeValue::Integer(250));
        assert_eq!(int("-1e3"), AttributeValue::Integer(-1000));
        assert_eq!(int("1.9"), AttributeValue::Integer(1));
        assert_eq!(int("-1.9"), AttributeValue::Integer(-1));
        assert_eq!(int("1e"), AttributeValue::Integer(1));
        assert_eq!(int("7 days"), AttributeValue::Integer(7));
        assert_eq!(int("9223372036854775807"), AttributeValue::Integer(i64::MAX));
    }

    #[test]
    fn test_boolean_wire_form() {
        assert_eq!(AttributeValue::Boolean(true).to_wire(), (Some("1".to_string()), Some("boolean")));
        assert_eq!(AttributeValue::Boolean(false).to_wire(), (Some("0".to_string()), Some("boolean")));
    }

    #[test]
    fn test_lead_identifier_from_text() {
        assert_eq!(LeadIdentifier::from("1234"), LeadIdentifier::Id(1234));
        assert_eq!(
            LeadIdentifier::from("jane@example.com"),
            LeadIdentifier::Email("jane@example.com".to_string())
        );
    }

    #[test]
    fn test_campaign_key_from_text() {
        assert_eq!(CampaignKey::from("321"), CampaignKey::Id(321));
        assert_eq!(CampaignKey::from("Spring Promo"), CampaignKey::Name("Spring Promo".to_string()));
    }

    #[test]
    fn test_only_integer_text_is_an_id() {
        assert_eq!(CampaignKey::from(" 42 "), CampaignKey::Id(42));
        assert_eq!(CampaignKey::from("1.5"), CampaignKey::Name("1.5".to_string()));
        assert_eq!(CampaignKey::from("1e3"), CampaignKey::Name("1e3".to_string()));
        assert_eq!(LeadIdentifier::from("1.5"), LeadIdentifier::Email("1.5".to_string()));
        assert_eq!(LeadIdentifier::from("1e3"), LeadIdentifier::Email("1e3".to_string()));
    }

    #[test]
    fn test_campaign_target_accepts_single_key_or_collection() {
        let key = LeadKey::new(KeyType::Email, "jane@example.com");

        let from_array = CampaignTarget::new(321, [key.clone()]);
        let from_option = CampaignTarget::new(321, Some(key.clone()));
        let from_vec = CampaignTarget::new(
            "Spring Promo",
            vec![key.clone(), LeadKey::new(KeyType::Id, "17")],
        );

        assert_eq!(from_array.leads, vec![key.clone()]);
        assert_eq!(from_option.leads, vec![key.clone()]);
        assert_eq!(from_vec.leads.len(), 2);
        assert_eq!(from_vec.leads[0], key);
        assert_eq!(from_vec.campaign, CampaignKey::Name("Spring Promo".to_string()));
    }

    #[test]
    fn test_normalized_lead_serializes_flat() {
        let mut lead = NormalizedLead::default();
        lead.fields.insert("Id".into(), Value::String("17".into()));
        lead.fields.insert("Email".into(), Value::String("a@example.com".into()));
        lead.attributes.insert("Score".into(), AttributeValue::Integer(5));

        assert_eq!(lead.id(), Some(17));
        assert_eq!(lead.email(), Some("a@example.com"));

        let json = serde_json::to_value(&lead).unwrap();
        assert_eq!(json["Id"], "17");
        assert_eq!(json["attributes"]["Score"], 5);
    }
}
