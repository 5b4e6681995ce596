//! SOAP response parsing.
//!
//! Documents are decoded into a namespace-agnostic JSON tree keyed by local
//! element names: leaf text becomes a string, repeated siblings become an
//! array, `xsi:nil` becomes null. quick-xml does not expand external
//! entities; DOCTYPE declarations are refused outright.

use crate::error::{MarketoError, Result};
use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

/// Element under construction
struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
    nil: bool,
    has_children: bool,
}

impl Frame {
    fn root() -> Self {
        Self {
            name: String::new(),
            children: Map::new(),
            text: String::new(),
            nil: false,
            has_children: false,
        }
    }

    fn open(e: &BytesStart) -> Result<Self> {
        let name = std::str::from_utf8(e.local_name().as_ref())
            .map_err(|err| MarketoError::Xml(format!("Invalid element name: {}", err)))?
            .to_string();

        Ok(Self {
            name,
            nil: is_nil(e),
            ..Self::root()
        })
    }

    fn into_value(self) -> (String, Value) {
        let value = if self.nil {
            Value::Null
        } else if self.has_children {
            Value::Object(self.children)
        } else {
            Value::String(self.text)
        };
        (self.name, value)
    }
}

/// `xsi:nil="true"` (or `"1"`) on an element
fn is_nil(e: &BytesStart) -> bool {
    e.attributes().flatten().any(|attr| {
        attr.key.local_name().as_ref() == b"nil"
            && matches!(attr.value.as_ref(), b"true" | b"1")
    })
}

/// Attach a finished element to its parent, turning repeats into an array
fn insert_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}

fn close(stack: &mut [Frame], frame: Frame) -> Result<()> {
    let parent = stack
        .last_mut()
        .ok_or_else(|| MarketoError::Xml("Unbalanced closing tag".to_string()))?;
    let (name, value) = frame.into_value();
    parent.has_children = true;
    insert_child(&mut parent.children, name, value);
    Ok(())
}

/// Decode an XML document into a JSON tree rooted at the document element
pub fn parse_document(xml: &str) -> Result<Value> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Frame::root()];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => stack.push(Frame::open(e)?),

            Ok(Event::Empty(ref e)) => {
                let frame = Frame::open(e)?;
                close(&mut stack, frame)?;
            }

            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err(MarketoError::Xml("Unbalanced closing tag".to_string()));
                }
                if let Some(frame) = stack.pop() {
                    close(&mut stack, frame)?;
                }
            }

            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| MarketoError::Xml(format!("Invalid text content: {}", err)))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }

            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }

            Ok(Event::DocType(_)) => {
                return Err(MarketoError::Xml(
                    "DOCTYPE declarations are not allowed".to_string(),
                ));
            }

            Ok(Event::Eof) => break,

            Err(e) => {
                return Err(MarketoError::Xml(format!(
                    "XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }

            _ => {}
        }

        buf.clear();
    }

    if stack.len() != 1 {
        return Err(MarketoError::Xml("Unexpected end of document".to_string()));
    }

    let root = stack.remove(0);
    Ok(Value::Object(root.children))
}

/// Decode a SOAP response into the content of its response element
///
/// A `Fault` body becomes `MarketoError::RemoteFault`, preferring the
/// service exception's code and message over the generic fault fields.
pub fn parse_response(xml: &str) -> Result<Value> {
    let mut document = parse_document(xml)?;

    let body = document
        .pointer_mut("/Envelope/Body")
        .map(Value::take)
        .ok_or_else(|| MarketoError::MalformedResponse("No SOAP Body in response".to_string()))?;

    let Value::Object(mut elements) = body else {
        return Err(MarketoError::MalformedResponse("Empty SOAP Body in response".to_string()));
    };

    if let Some(fault) = elements.remove("Fault") {
        return Err(fault_to_error(&fault));
    }

    let mut elements = elements.into_iter();
    match elements.next() {
        Some((name, content)) => {
            debug!("Received {}", name);
            if elements.next().is_some() {
                warn!("SOAP Body of {} has more than one element; ignoring the rest", name);
            }
            Ok(content)
        }
        None => Err(MarketoError::MalformedResponse("Empty SOAP Body in response".to_string())),
    }
}

fn fault_to_error(fault: &Value) -> MarketoError {
    let text = |pointer: &str| {
        fault
            .pointer(pointer)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let code = text("/detail/serviceException/code")
        .or_else(|| text("/faultcode"))
        .unwrap_or_else(|| "unknown".to_string());
    let message = text("/detail/serviceException/message")
        .or_else(|| text("/faultstring"))
        .unwrap_or_else(|| "Unknown fault".to_string());

    MarketoError::RemoteFault { code, message }
}
