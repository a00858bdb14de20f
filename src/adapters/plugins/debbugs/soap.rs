//! Minimal SOAP 1.1 encoding for the Debbugs interface.
//!
//! Debbugs speaks rpc/encoded SOAP. Requests are small enough to be
//! written by hand; responses are parsed into a lightweight element tree
//! and walked by the client.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::domain::errors::{DomainError, DomainResult};

/// Namespace of the Debbugs SOAP methods.
pub const DEBBUGS_NAMESPACE: &str = "Debbugs/SOAP";

/// A request argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoapArg<'a> {
    Int(u64),
    IntArray(&'a [u64]),
    StrArray(&'a [&'a str]),
}

/// Build the envelope for calling `method` with named arguments.
pub fn build_envelope(method: &str, args: &[(&str, SoapArg<'_>)]) -> String {
    let mut params = String::new();
    for (name, arg) in args {
        match arg {
            SoapArg::Int(value) => {
                params.push_str(&format!("<{name} xsi:type=\"xsd:int\">{value}</{name}>"));
            }
            SoapArg::IntArray(values) => {
                params.push_str(&format!(
                    "<{name} xsi:type=\"soapenc:Array\" soapenc:arrayType=\"xsd:int[{}]\">",
                    values.len()
                ));
                for value in *values {
                    params.push_str(&format!("<item xsi:type=\"xsd:int\">{value}</item>"));
                }
                params.push_str(&format!("</{name}>"));
            }
            SoapArg::StrArray(values) => {
                params.push_str(&format!(
                    "<{name} xsi:type=\"soapenc:Array\" soapenc:arrayType=\"xsd:anyType[{}]\">",
                    values.len()
                ));
                for value in *values {
                    params.push_str(&format!(
                        "<item xsi:type=\"xsd:string\">{}</item>",
                        escape(*value)
                    ));
                }
                params.push_str(&format!("</{name}>"));
            }
        }
    }

    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
            "<soap:Envelope",
            " xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\"",
            " xmlns:soapenc=\"http://schemas.xmlsoap.org/soap/encoding/\"",
            " xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"",
            " xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\"",
            " soap:encodingStyle=\"http://schemas.xmlsoap.org/soap/encoding/\">",
            "<soap:Body><ns1:{method} xmlns:ns1=\"{ns}\">{params}</ns1:{method}></soap:Body>",
            "</soap:Envelope>"
        ),
        method = method,
        ns = DEBBUGS_NAMESPACE,
        params = params,
    )
}

/// An XML element with namespace prefixes stripped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    fn from_start(start: &BytesStart<'_>) -> DomainResult<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| parse_error(format!("bad attribute on <{name}>: {e}")))?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| parse_error(format!("bad attribute value on <{name}>: {e}")))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Depth-first search for the first element called `name`.
    pub fn find(&self, name: &str) -> Option<&Self> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Text content, with `xsd:base64Binary` payloads decoded.
    pub fn value(&self) -> DomainResult<String> {
        let is_base64 = self
            .attribute("type")
            .is_some_and(|t| t.ends_with("base64Binary"));
        if !is_base64 {
            return Ok(self.text.clone());
        }

        let compact: String = self.text.split_whitespace().collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| parse_error(format!("bad base64 in <{}>: {e}", self.name)))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn is_nil(&self) -> bool {
        self.attribute("nil") == Some("true")
    }
}

fn parse_error(message: String) -> DomainError {
    DomainError::ParseFailed(format!("SOAP response: {message}"))
}

/// Parse a whole XML document into an element tree.
pub fn parse_document(xml: &str) -> DomainResult<XmlNode> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![XmlNode {
        name: "#document".to_string(),
        ..XmlNode::default()
    }];

    loop {
        let event = reader
            .read_event()
            .map_err(|e| parse_error(format!("at byte {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(start) => stack.push(XmlNode::from_start(&start)?),
            Event::Empty(start) => {
                let node = XmlNode::from_start(&start)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(parse_error("unbalanced closing tag".to_string()));
                }
                if let Some(node) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| parse_error(format!("bad text: {e}")))?;
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(document), true) if !document.children.is_empty() => Ok(document),
        (Some(_), true) => Err(parse_error("empty document".to_string())),
        _ => Err(parse_error("unclosed element".to_string())),
    }
}

/// Return value of a SOAP call: the first element inside `<{method}Response>`.
///
/// A `<Fault>` in the body becomes a [`DomainError::TrackerFailed`]. Calls
/// that return nothing yield `None`.
pub fn response_value<'a>(document: &'a XmlNode, method: &str) -> DomainResult<Option<&'a XmlNode>> {
    let body = document
        .find("Body")
        .ok_or_else(|| parse_error("missing SOAP Body".to_string()))?;

    if let Some(fault) = body.child("Fault") {
        let reason = fault
            .child("faultstring")
            .map(|f| f.text.trim().to_string())
            .unwrap_or_default();
        return Err(DomainError::TrackerFailed(format!(
            "{method} returned a SOAP fault: {reason}"
        )));
    }

    let response_name = format!("{method}Response");
    let response = body
        .child(&response_name)
        .ok_or_else(|| parse_error(format!("missing <{response_name}>")))?;
    Ok(response.children.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_escapes_string_items() {
        let xml = build_envelope(
            "get_bugs",
            &[("query", SoapArg::StrArray(&["package", "a&b"]))],
        );
        assert!(xml.contains("<ns1:get_bugs xmlns:ns1=\"Debbugs/SOAP\">"));
        assert!(xml.contains("soapenc:arrayType=\"xsd:anyType[2]\""));
        assert!(xml.contains("<item xsi:type=\"xsd:string\">a&amp;b</item>"));

        // The request must itself be well-formed.
        let parsed = parse_document(&xml).unwrap();
        let query = parsed.find("query").unwrap();
        assert_eq!(query.children[1].text, "a&b");
    }

    #[test]
    fn test_envelope_int_arguments() {
        let xml = build_envelope(
            "get_status",
            &[("bugs", SoapArg::IntArray(&[100, 200]))],
        );
        assert!(xml.contains("<item xsi:type=\"xsd:int\">100</item><item xsi:type=\"xsd:int\">200</item>"));

        let xml = build_envelope("get_bug_log", &[("bugnumber", SoapArg::Int(42))]);
        assert!(xml.contains("<bugnumber xsi:type=\"xsd:int\">42</bugnumber>"));
    }

    #[test]
    fn test_parse_strips_prefixes_and_decodes_base64() {
        let xml = r#"<?xml version="1.0"?>
            <soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"
                           xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
              <soap:Body>
                <get_bug_logResponse xmlns="urn:Debbugs/SOAP">
                  <soapenc:Array xmlns:soapenc="http://schemas.xmlsoap.org/soap/encoding/">
                    <item>
                      <header xsi:type="xsd:base64Binary">RnJvbTogSsO2cmc=</header>
                      <body xsi:type="xsd:string">fish &amp; chips</body>
                    </item>
                  </soapenc:Array>
                </get_bug_logResponse>
              </soap:Body>
            </soap:Envelope>"#;

        let doc = parse_document(xml).unwrap();
        let value = response_value(&doc, "get_bug_log").unwrap().unwrap();
        assert_eq!(value.name, "Array");

        let item = &value.children[0];
        assert_eq!(item.child("header").unwrap().value().unwrap(), "From: Jörg");
        assert_eq!(item.child("body").unwrap().value().unwrap(), "fish & chips");
    }

    #[test]
    fn test_fault_becomes_tracker_error() {
        let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
              <soap:Body>
                <soap:Fault>
                  <faultcode>soap:Server</faultcode>
                  <faultstring>Bad query</faultstring>
                </soap:Fault>
              </soap:Body>
            </soap:Envelope>"#;

        let doc = parse_document(xml).unwrap();
        let err = response_value(&doc, "get_bugs").unwrap_err();
        match err {
            DomainError::TrackerFailed(msg) => assert!(msg.contains("Bad query"), "got: {msg}"),
            other => panic!("expected TrackerFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_response_has_no_value() {
        let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
              <soap:Body><get_statusResponse xmlns="urn:Debbugs/SOAP"/></soap:Body>
            </soap:Envelope>"#;

        let doc = parse_document(xml).unwrap();
        assert!(response_value(&doc, "get_status").unwrap().is_none());
    }

    #[test]
    fn test_malformed_documents_are_rejected() {
        assert!(matches!(
            parse_document("<a><b></a>"),
            Err(DomainError::ParseFailed(_))
        ));
        assert!(matches!(parse_document(""), Err(DomainError::ParseFailed(_))));
        assert!(matches!(
            parse_document("<a><b></b>"),
            Err(DomainError::ParseFailed(_))
        ));
        let doc = parse_document("<a/>").unwrap();
        assert!(matches!(
            response_value(&doc, "get_bugs"),
            Err(DomainError::ParseFailed(_))
        ));
    }
}
