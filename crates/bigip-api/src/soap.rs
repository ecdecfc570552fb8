// SOAP envelope rendering and response parsing
//
// Both the iControl portal and the activation service speak SOAP 1.1 with
// RPC/encoded bodies. Requests are rendered from a small value model;
// responses are parsed into a lightweight element tree and searched by
// local name, so namespace prefixes chosen by either server don't matter.

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

use tracing::trace;

use crate::error::Error;

const ENVELOPE_OPEN: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/""#,
    r#" xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/""#,
    r#" xmlns:xsd="http://www.w3.org/2001/XMLSchema""#,
    r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#,
    r#" SOAP-ENV:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">"#,
    "<SOAP-ENV:Body>",
);
const ENVELOPE_CLOSE: &str = "</SOAP-ENV:Body></SOAP-ENV:Envelope>";

// ── Request model ───────────────────────────────────────────────────

/// A parameter value in an RPC/encoded call.
#[derive(Debug, Clone)]
pub enum SoapValue {
    /// `xsd:string`
    Text(String),
    /// `SOAP-ENC:Array` of `xsd:string`
    TextArray(Vec<String>),
    /// Anonymous struct, rendered as nested elements.
    Struct(Vec<(&'static str, SoapValue)>),
}

/// A single RPC call: `<m:{method} xmlns:m="{namespace}">params…</m:{method}>`.
#[derive(Debug, Clone)]
pub struct SoapCall {
    namespace: String,
    method: &'static str,
    params: Vec<(&'static str, SoapValue)>,
}

impl SoapCall {
    pub fn new(namespace: impl Into<String>, method: &'static str) -> Self {
        Self {
            namespace: namespace.into(),
            method,
            params: Vec::new(),
        }
    }

    /// Append a parameter (builder style).
    pub fn param(mut self, name: &'static str, value: SoapValue) -> Self {
        self.params.push((name, value));
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Render the full SOAP envelope.
    pub fn to_envelope(&self) -> String {
        let mut out = String::from(ENVELOPE_OPEN);
        out.push_str(&format!(
            r#"<m:{method} xmlns:m="{ns}">"#,
            method = self.method,
            ns = escape(self.namespace.as_str()),
        ));
        for (name, value) in &self.params {
            render_value(&mut out, name, value);
        }
        out.push_str(&format!("</m:{}>", self.method));
        out.push_str(ENVELOPE_CLOSE);
        out
    }
}

fn render_value(out: &mut String, name: &str, value: &SoapValue) {
    match value {
        SoapValue::Text(text) => {
            out.push_str(&format!(
                r#"<{name} xsi:type="xsd:string">{}</{name}>"#,
                escape(text.as_str())
            ));
        }
        SoapValue::TextArray(items) => {
            out.push_str(&format!(
                r#"<{name} xsi:type="SOAP-ENC:Array" SOAP-ENC:arrayType="xsd:string[{}]">"#,
                items.len()
            ));
            for item in items {
                out.push_str("<item>");
                out.push_str(&escape(item.as_str()));
                out.push_str("</item>");
            }
            out.push_str(&format!("</{name}>"));
        }
        SoapValue::Struct(fields) => {
            out.push_str(&format!("<{name}>"));
            for (field, inner) in fields {
                render_value(out, field, inner);
            }
            out.push_str(&format!("</{name}>"));
        }
    }
}

// ── Response model ──────────────────────────────────────────────────

/// A parsed XML element, keyed by local name (prefixes stripped).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            attributes.push((key, value.into_owned()));
        }
        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    /// Parse a document and return a synthetic root holding its top-level
    /// elements.
    pub fn parse(xml: &str) -> Result<Self, Error> {
        let fail = |message: String| Error::Deserialization {
            message,
            body: xml.to_owned(),
        };

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack = vec![Self {
            name: "#document".into(),
            ..Self::default()
        }];

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => stack.push(Self::from_start(&start).map_err(fail)?),
                Ok(Event::Empty(start)) => {
                    let node = Self::from_start(&start).map_err(fail)?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                }
                Ok(Event::End(_)) => {
                    if stack.len() < 2 {
                        return Err(fail("unbalanced closing tag".into()));
                    }
                    if let Some(node) = stack.pop() {
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(node);
                        }
                    }
                }
                Ok(Event::Text(text)) => {
                    let text = text.unescape().map_err(|e| fail(e.to_string()))?;
                    if let Some(node) = stack.last_mut() {
                        node.text.push_str(&text);
                    }
                }
                Ok(Event::CData(data)) => {
                    let raw = data.into_inner();
                    if let Some(node) = stack.last_mut() {
                        node.text.push_str(&String::from_utf8_lossy(&raw));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(fail(e.to_string())),
            }
        }

        if stack.len() != 1 {
            return Err(fail("unexpected end of document".into()));
        }
        stack.pop().ok_or_else(|| fail("empty document".into()))
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First descendant (depth-first, self excluded) with the given local name.
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Attribute value by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text content of this element.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text of each `<item>` child (SOAP-ENC arrays).
    pub fn items(&self) -> Vec<String> {
        self.children
            .iter()
            .filter(|c| c.name == "item")
            .map(|c| c.text.clone())
            .collect()
    }
}

// ── Envelope handling ───────────────────────────────────────────────

/// Parse a SOAP response body and return the `<Body>` element.
///
/// A `<Fault>` anywhere in the body becomes `Error::SoapFault`.
pub fn parse_body(xml: &str) -> Result<XmlNode, Error> {
    let document = XmlNode::parse(xml)?;
    let body = document
        .find("Body")
        .cloned()
        .ok_or_else(|| Error::Deserialization {
            message: "SOAP response has no Body element".into(),
            body: xml.to_owned(),
        })?;

    if let Some(fault) = body.find("Fault") {
        let code = fault
            .find("faultcode")
            .map_or_else(|| "unknown".to_owned(), |n| n.text.clone());
        let message = fault
            .find("faultstring")
            .map(|n| n.text.clone())
            .unwrap_or_default();
        return Err(Error::SoapFault {
            code,
            message,
        });
    }

    Ok(body)
}

/// The `<return>` element of an RPC response, if the method returns a value.
pub fn return_value(body: &XmlNode) -> Option<&XmlNode> {
    body.children.first().and_then(|response| {
        response
            .child("return")
            .or_else(|| response.children.first())
    })
}

// ── HTTP exchange ───────────────────────────────────────────────────

/// POST an envelope and parse the response body.
///
/// Servers return faults with HTTP 500, so the body is inspected before the
/// status code; a non-success status without a fault is reported as a
/// synthetic `SoapFault`.
pub(crate) async fn exchange(
    request: reqwest::RequestBuilder,
    call: &SoapCall,
    soap_action: &str,
    timeout_secs: u64,
) -> Result<XmlNode, Error> {
    let resp = request
        .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
        .header("SOAPAction", soap_action)
        .body(call.to_envelope())
        .send()
        .await
        .map_err(|e| Error::from_transport(e, timeout_secs))?;

    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Authentication {
            message: format!("{} rejected the supplied credentials", call.method()),
        });
    }

    let body = resp
        .text()
        .await
        .map_err(|e| Error::from_transport(e, timeout_secs))?;
    trace!(method = call.method(), %status, "SOAP response received");

    match parse_body(&body) {
        Ok(parsed) if status.is_success() => Ok(parsed),
        Err(err @ Error::SoapFault { .. }) => Err(err),
        Err(err) if status.is_success() => Err(err),
        _ => Err(Error::SoapFault {
            code: format!("HTTP {}", status.as_u16()),
            message: body.chars().take(200).collect(),
        }),
    }
}
