//! XML bodies decoded into the same tree shape as JSON ones.

use crate::domain::model::RawResponse;
use crate::utils::error::{Result, ZipCodeError};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

struct Element {
    name: String,
    children: Map<String, Value>,
    text: String,
}

fn xml_error(e: impl std::fmt::Display) -> ZipCodeError {
    ZipCodeError::Xml {
        message: e.to_string(),
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Value>, name: String, value: Value) {
    let Some(parent) = stack.last_mut() else {
        *root = Some(value);
        return;
    };

    // Leaf values are strings and nested elements objects, so an array here
    // can only come from repeated siblings.
    match parent.children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.children.insert(name, value);
        }
    }
}

/// Parse `xml`, returning the document element's content. Leaf elements become
/// strings (empty ones `""`), repeated siblings become arrays. Attributes are
/// ignored.
pub fn parse_document(xml: &str) -> Result<RawResponse> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => stack.push(Element {
                name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                children: Map::new(),
                text: String::new(),
            }),
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                attach(&mut stack, &mut root, name, Value::String(String::new()));
            }
            Event::Text(t) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&t.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(c) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(xml_error("unexpected closing tag"));
                };
                let value = if element.children.is_empty() {
                    Value::String(element.text)
                } else {
                    Value::Object(element.children)
                };
                attach(&mut stack, &mut root, element.name, value);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(xml_error("document ended inside an element"));
    }

    match root {
        Some(Value::String(text)) if text.is_empty() => Ok(Value::Object(Map::new())),
        Some(value) => Ok(value),
        None => Err(xml_error("document has no root element")),
    }
}
