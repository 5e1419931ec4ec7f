//! SOAP envelope construction and decoding.
//!
//! Requests are built as `xmltree` element trees and serialised once; replies
//! are parsed and their `s:Body` converted into a generic [`serde_json::Value`]
//! tree (objects for elements with children, strings for leaves, arrays for
//! repeated siblings) so callers can pick out whichever fields they need.

use serde_json::{Map, Value};
use xmltree::{Element, EmitterConfig, Namespace, XMLNode};

use crate::error::SoapError;

/// Namespace of the SOAP 1.1 envelope
pub const ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Encoding style attached to every outgoing envelope
pub const ENCODING_STYLE: &str = "http://schemas.xmlsoap.org/soap/encoding/";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// One RPC action to be sent to the device.
///
/// Parameters keep their insertion order; devices of this family reject
/// arguments that arrive out of the order given in the service description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    /// Action name, e.g. `Play`
    pub action: String,
    /// Service namespace URI, e.g. `urn:schemas-nds-com:service:SkyPlay:2`
    pub service_uri: String,
    /// Ordered `(name, value)` parameters
    pub params: Vec<(String, String)>,
}

impl ActionRequest {
    pub fn new(action: impl Into<String>, service_uri: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            service_uri: service_uri.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Value of the `SOAPACTION` header for this request, quotes included
    pub fn soap_action(&self) -> String {
        format!("\"{}#{}\"", self.service_uri, self.action)
    }
}

/// Build the `<u:Action xmlns:u="...">` payload element for a request.
pub fn action_payload(request: &ActionRequest) -> Element {
    let mut action = prefixed_element("u", &request.action, &request.service_uri);

    for (name, value) in &request.params {
        let mut param = Element::new(name);
        param.children.push(XMLNode::Text(value.clone()));
        action.children.push(XMLNode::Element(param));
    }

    action
}

/// Wrap a payload in the SOAP envelope and serialise it with an XML declaration.
pub fn build_envelope(payload: Element) -> Result<String, SoapError> {
    let mut envelope = prefixed_element("s", "Envelope", ENVELOPE_NS);
    envelope
        .attributes
        .insert("s:encodingStyle".to_string(), ENCODING_STYLE.to_string());

    let mut body = Element::new("Body");
    body.prefix = Some("s".to_string());
    body.namespace = Some(ENVELOPE_NS.to_string());
    body.children.push(XMLNode::Element(payload));
    envelope.children.push(XMLNode::Element(body));

    let mut out = Vec::new();
    envelope
        .write_with_config(
            &mut out,
            EmitterConfig::new().write_document_declaration(false),
        )
        .map_err(|e| SoapError::Parse(format!("Failed to serialise envelope: {}", e)))?;

    let xml = String::from_utf8(out)
        .map_err(|e| SoapError::Parse(format!("Envelope is not valid UTF-8: {}", e)))?;

    Ok(format!("{}{}", XML_DECLARATION, xml))
}

/// Parse a reply envelope and return the decoded contents of its body.
///
/// The returned value is always an object keyed by the qualified names of the
/// body's children (for example `u:GetMediaInfoResponse`). A `Fault` body is
/// turned into [`SoapError::Fault`].
pub fn decode_envelope(xml: &str) -> Result<Value, SoapError> {
    let root = Element::parse(xml.as_bytes()).map_err(|e| SoapError::Parse(e.to_string()))?;

    if root.name != "Envelope" {
        return Err(SoapError::Parse(format!(
            "Expected SOAP Envelope, found <{}>",
            qualified_name(&root)
        )));
    }

    let body = root
        .get_child("Body")
        .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))?;

    if let Some(fault) = body.get_child("Fault") {
        return Err(SoapError::Fault(fault_code(fault)));
    }

    let mut map = Map::new();
    collect_children(body, &mut map);
    Ok(Value::Object(map))
}

/// Convert an element into the generic tree shape used for responses.
pub fn element_to_value(element: &Element) -> Value {
    let has_children = element.children.iter().any(|n| n.as_element().is_some());

    if !has_children && element.attributes.is_empty() {
        let text = element.get_text().map(|t| t.into_owned()).unwrap_or_default();
        return Value::String(text);
    }

    let mut map = Map::new();
    for (name, value) in &element.attributes {
        map.insert(name.clone(), Value::String(value.clone()));
    }
    collect_children(element, &mut map);

    if let Some(text) = element.get_text() {
        let text = text.trim();
        if !text.is_empty() {
            map.insert("$t".to_string(), Value::String(text.to_string()));
        }
    }

    Value::Object(map)
}

fn collect_children(element: &Element, map: &mut Map<String, Value>) {
    for child in element.children.iter().filter_map(XMLNode::as_element) {
        let key = qualified_name(child);
        let value = element_to_value(child);

        match map.get_mut(&key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key, value);
            }
        }
    }
}

fn qualified_name(element: &Element) -> String {
    match &element.prefix {
        Some(prefix) => format!("{}:{}", prefix, element.name),
        None => element.name.clone(),
    }
}

fn prefixed_element(prefix: &str, name: &str, uri: &str) -> Element {
    let mut element = Element::new(name);
    element.prefix = Some(prefix.to_string());
    element.namespace = Some(uri.to_string());

    let mut namespaces = Namespace::empty();
    namespaces.put(prefix, uri);
    element.namespaces = Some(namespaces);

    element
}

fn fault_code(fault: &Element) -> u16 {
    fault
        .get_child("detail")
        .and_then(|d| d.get_child("UPnPError"))
        .and_then(|e| e.get_child("errorCode"))
        .and_then(|c| c.get_text())
        .and_then(|t| t.trim().parse::<u16>().ok())
        .unwrap_or(500)
}
