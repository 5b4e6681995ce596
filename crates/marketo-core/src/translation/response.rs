//! Inbound response normalization
//!
//! The remote side wraps collections inconsistently: a single lead (or a
//! single attribute) arrives as a bare object, two or more as an array.
//! `one_or_many` is the only place that deals with this.

use crate::error::{MarketoError, Result};
use crate::translation::request::WireAttribute;
use log::debug;
use marketo_types::{AttributeValue, NormalizedLead, SyncedLead};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field holding the raw attribute list on a lead record
const ATTRIBUTE_LIST_FIELD: &str = "leadAttributeList";

/// Array → its items, null → nothing, anything else → a one-element sequence
pub fn one_or_many(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Flatten `{attrName, attrType, attrValue}` entries into a name → value mapping
///
/// Entries that are not well-formed records are skipped. Duplicate names
/// keep the last value.
pub fn flatten_attributes(attributes: Value) -> BTreeMap<String, AttributeValue> {
    let mut flattened = BTreeMap::new();

    for entry in one_or_many(attributes) {
        let Some(record) = entry.as_object() else {
            debug!("Skipping non-record attribute entry: {}", entry);
            continue;
        };

        let Some(name) = record.get("attrName").and_then(Value::as_str) else {
            debug!("Skipping attribute entry without attrName: {}", entry);
            continue;
        };

        let raw_value = match record.get("attrValue") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(if *b { "1" } else { "0" }.to_string()),
            Some(other) => {
                debug!("Skipping attribute {} with structured value: {}", name, other);
                continue;
            }
        };
        let attr_type = record.get("attrType").and_then(Value::as_str);

        flattened.insert(
            name.to_string(),
            AttributeValue::from_wire(raw_value.as_deref(), attr_type),
        );
    }

    flattened
}

/// Tagged attribute list for a flattened mapping; flattening it again gives the same mapping
pub fn attributes_to_wire(attributes: &BTreeMap<String, AttributeValue>) -> Vec<WireAttribute> {
    attributes
        .iter()
        .map(|(name, value)| {
            let (attr_value, attr_type) = value.to_wire();
            WireAttribute {
                attr_name: name.clone(),
                attr_type: attr_type.map(str::to_string),
                attr_value,
            }
        })
        .collect()
}

/// Replace a record's raw attribute list with the flattened `attributes` mapping
pub fn normalize_lead(record: Value) -> Result<NormalizedLead> {
    let mut fields = match record {
        Value::Object(fields) => fields,
        other => {
            return Err(MarketoError::MalformedResponse(format!(
                "lead record is not an object: {}",
                other
            )))
        }
    };

    let attributes = match fields.remove(ATTRIBUTE_LIST_FIELD) {
        // Wire shape is {attribute: [...]}; accept a bare list as well
        Some(Value::Object(mut list)) => flatten_attributes(list.remove("attribute").unwrap_or(Value::Null)),
        Some(list) => flatten_attributes(list),
        None => BTreeMap::new(),
    };

    Ok(NormalizedLead { fields, attributes })
}

/// Normalize a `getLead` response into a sequence of leads, even for a single match
pub fn format_leads(mut response: Value) -> Result<Vec<NormalizedLead>> {
    let records = response
        .pointer_mut("/result/leadRecordList/leadRecord")
        .map(Value::take)
        .unwrap_or(Value::Null);

    let leads = one_or_many(records)
        .into_iter()
        .map(normalize_lead)
        .collect::<Result<Vec<_>>>()?;

    debug!("Normalized {} lead record(s)", leads.len());
    Ok(leads)
}

/// Normalize a `syncLead` response: status fields pass through, the record is flattened
pub fn normalize_synced_lead(response: Value) -> Result<SyncedLead> {
    let result = match response {
        Value::Object(mut body) => body.remove("result"),
        _ => None,
    };

    let Some(Value::Object(mut fields)) = result else {
        return Err(MarketoError::MalformedResponse(
            "syncLead response has no result".to_string(),
        ));
    };

    let record = match fields.remove("leadRecord") {
        Some(Value::Null) | None => {
            return Err(MarketoError::MalformedResponse(
                "syncLead response has no leadRecord".to_string(),
            ))
        }
        Some(record) => record,
    };

    Ok(SyncedLead {
        fields,
        lead_record: normalize_lead(record)?,
    })
}
