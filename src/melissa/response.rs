//! Generic decoding of WebSmart XML responses.
//!
//! The service's response schema is not modelled. The body is turned into a
//! tree where element names are keys, repeated siblings become lists and
//! leaf elements become text.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use crate::error::WebsmartError;

/// key holding an element's attributes
pub const ATTRIBUTES_KEY: &str = "@attributes";
/// key holding the text of an element that also carries attributes
pub const TEXT_KEY: &str = "#text";

/// A node of a decoded response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseValue {
    Text(String),
    Map(ResponseMap),
    List(Vec<ResponseValue>),
}

impl ResponseValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ResponseMap> {
        match self {
            ResponseValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Child `key` of a map node.
    pub fn get(&self, key: &str) -> Option<&ResponseValue> {
        self.as_map()?.get(key)
    }

    /// The items of a list node, or the node itself.
    ///
    /// A single `<Record>` decodes to a map while several decode to a list;
    /// this reads both the same way.
    pub fn items(&self) -> &[ResponseValue] {
        match self {
            ResponseValue::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }
}

/// Ordered key/value children of an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMap {
    entries: Vec<(String, ResponseValue)>,
}

impl ResponseMap {
    pub fn get(&self, key: &str) -> Option<&ResponseValue> {
        self.entries.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResponseValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a child element, collapsing repeated names into a list.
    fn push_child(&mut self, key: String, value: ResponseValue) {
        let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| *k == key) else {
            self.entries.push((key, value));
            return;
        };
        // element values are never lists, so a list here comes from a repeat
        match existing {
            ResponseValue::List(items) => items.push(value),
            _ => {
                let first = std::mem::replace(existing, ResponseValue::List(Vec::with_capacity(2)));
                if let ResponseValue::List(items) = existing {
                    items.push(first);
                    items.push(value);
                }
            }
        }
    }
}

/// Decoded body of a WebSmart response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    root: String,
    body: ResponseValue,
}

impl ServiceResponse {
    /// name of the document element, e.g. `ResponseArray`
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn body(&self) -> &ResponseValue {
        &self.body
    }

    pub fn into_body(self) -> ResponseValue {
        self.body
    }

    pub fn get(&self, key: &str) -> Option<&ResponseValue> {
        self.body.get(key)
    }
}

impl Serialize for ResponseValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResponseValue::Text(text) => serializer.serialize_str(text),
            ResponseValue::List(items) => serializer.collect_seq(items),
            ResponseValue::Map(map) => map.serialize(serializer),
        }
    }
}

impl Serialize for ResponseMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// serialized as `{ "<root>": <body> }`
impl Serialize for ServiceResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.root, &self.body)?;
        map.end()
    }
}

/// element being read
struct OpenElement {
    name: String,
    attributes: ResponseMap,
    children: ResponseMap,
    text: String,
}

impl OpenElement {
    fn open(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| format!("invalid element name: {e}"))?
            .to_string();

        let mut attributes = ResponseMap::default();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| format!("invalid attribute on <{name}>: {e}"))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| format!("invalid attribute name on <{name}>: {e}"))?
                .to_string();
            let value = attr.unescape_value()
                .map_err(|e| format!("invalid attribute value on <{name}>: {e}"))?
                .into_owned();
            attributes.push_child(key, ResponseValue::Text(value));
        }

        Ok(Self {
            name,
            attributes,
            children: ResponseMap::default(),
            text: String::new(),
        })
    }

    fn into_value(self) -> (String, ResponseValue) {
        if self.children.is_empty() && self.attributes.is_empty() {
            return (self.name, ResponseValue::Text(self.text));
        }

        let mut map = ResponseMap::default();
        if !self.attributes.is_empty() {
            map.entries.push((ATTRIBUTES_KEY.to_string(), ResponseValue::Map(self.attributes)));
        }
        if self.children.is_empty() {
            if !self.text.is_empty() {
                map.entries.push((TEXT_KEY.to_string(), ResponseValue::Text(self.text)));
            }
        } else {
            map.entries.extend(self.children.entries);
        }
        (self.name, ResponseValue::Map(map))
    }
}

/// Decode a response body into a [`ServiceResponse`].
///
/// Fails with [`WebsmartError::MalformedResponse`] when the body is not
/// UTF-8, not well-formed, or does not hold exactly one root element.
pub fn decode_response(body: &[u8]) -> Result<ServiceResponse, WebsmartError> {
    let text = std::str::from_utf8(body).map_err(|e| {
        WebsmartError::malformed(format!("body is not valid UTF-8: {e}"), String::from_utf8_lossy(body))
    })?;
    decode_str(text).map_err(|reason| WebsmartError::malformed(reason, text))
}

fn decode_str(text: &str) -> Result<ServiceResponse, String> {
    // leaf text is kept exactly as sent; whitespace between elements is
    // dropped by `append_text` and `OpenElement::into_value`
    let mut reader = Reader::from_str(text);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<(String, ResponseValue)> = None;

    loop {
        let event = reader.read_event()
            .map_err(|e| format!("error at position {}: {e}", reader.buffer_position()))?;
        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err("more than one root element".to_string());
                }
                stack.push(OpenElement::open(&start)?);
            }
            Event::Empty(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err("more than one root element".to_string());
                }
                let element = OpenElement::open(&start)?;
                close_element(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let element = stack.pop()
                    .ok_or_else(|| "closing tag without an open element".to_string())?;
                close_element(&mut stack, &mut root, element);
            }
            Event::Text(content) => {
                let content = content.unescape().map_err(|e| format!("invalid text: {e}"))?;
                append_text(&mut stack, &content)?;
            }
            Event::CData(content) => {
                let content = String::from_utf8(content.into_inner().into_owned())
                    .map_err(|e| format!("invalid CDATA section: {e}"))?;
                append_text(&mut stack, &content)?;
            }
            Event::Eof => break,
            // declaration, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unexpected end of document inside <{}>", open.name));
    }
    let (root, body) = root.ok_or_else(|| "no root element".to_string())?;
    Ok(ServiceResponse { root, body })
}

fn close_element(stack: &mut [OpenElement], root: &mut Option<(String, ResponseValue)>, element: OpenElement) {
    let (name, value) = element.into_value();
    match stack.last_mut() {
        Some(parent) => parent.children.push_child(name, value),
        None => *root = Some((name, value)),
    }
}

fn append_text(stack: &mut [OpenElement], content: &str) -> Result<(), String> {
    match stack.last_mut() {
        Some(open) => {
            open.text.push_str(content);
            Ok(())
        }
        None if content.trim().is_empty() => Ok(()),
        None => Err("text outside of the root element".to_string()),
    }
}
