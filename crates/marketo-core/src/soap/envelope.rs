//! SOAP 1.1 request envelopes
//!
//! JSON payloads map onto elements: object keys become child elements in
//! key order, arrays become repeated siblings, `null` becomes an empty
//! element with `xsi:nil="true"`.

use crate::auth::AuthHeader;
use crate::constants::MKTOWS_NS;
use crate::error::{MarketoError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;

pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Request element for an operation: `getLead` → `ns1:paramsGetLead`
pub fn request_element_name(operation: &str) -> String {
    let mut chars = operation.chars();
    match chars.next() {
        Some(first) => format!("ns1:params{}{}", first.to_uppercase(), chars.as_str()),
        None => "ns1:params".to_string(),
    }
}

/// Render a complete envelope with the authentication header and the operation payload
pub fn build_envelope(operation: &str, payload: &Value, header: &AuthHeader) -> Result<String> {
    let mut writer = Writer::new(Vec::new());

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut envelope = BytesStart::new("SOAP-ENV:Envelope");
    envelope.push_attribute(("xmlns:SOAP-ENV", SOAP_ENV_NS));
    envelope.push_attribute(("xmlns:ns1", MKTOWS_NS));
    envelope.push_attribute(("xmlns:xsi", XSI_NS));
    emit(&mut writer, Event::Start(envelope))?;

    emit(&mut writer, Event::Start(BytesStart::new("SOAP-ENV:Header")))?;
    write_element(&mut writer, "ns1:AuthenticationHeader", &serde_json::to_value(header)?)?;
    emit(&mut writer, Event::End(BytesEnd::new("SOAP-ENV:Header")))?;

    emit(&mut writer, Event::Start(BytesStart::new("SOAP-ENV:Body")))?;
    write_element(&mut writer, &request_element_name(operation), payload)?;
    emit(&mut writer, Event::End(BytesEnd::new("SOAP-ENV:Body")))?;

    emit(&mut writer, Event::End(BytesEnd::new("SOAP-ENV:Envelope")))?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| MarketoError::Xml(format!("Envelope is not valid UTF-8: {}", e)))
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Array(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
        }
        Value::Null => {
            let mut element = BytesStart::new(name);
            element.push_attribute(("xsi:nil", "true"));
            emit(writer, Event::Empty(element))?;
        }
        Value::Object(children) => {
            emit(writer, Event::Start(BytesStart::new(name)))?;
            for (child_name, child) in children {
                write_element(writer, child_name, child)?;
            }
            emit(writer, Event::End(BytesEnd::new(name)))?;
        }
        Value::String(text) => write_text_element(writer, name, text)?,
        Value::Bool(flag) => write_text_element(writer, name, if *flag { "true" } else { "false" })?,
        Value::Number(number) => write_text_element(writer, name, &number.to_string())?,
    }
    Ok(())
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| MarketoError::Xml(format!("Failed to write envelope: {}", e)))
}
