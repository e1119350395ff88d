//! Status document parser
//!
//! Reads a Monit XML status body into a small owned element tree and exposes
//! the children of `/monit/services` as [`ServiceEntry`] values.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

const ROOT: &str = "monit";
const SERVICES: &str = "services";

/// Deepest element nesting accepted in a status document
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("malformed status document: {0}")]
    MalformedDocument(String),
}

pub type Result<T> = std::result::Result<T, DocumentError>;

fn malformed(reason: impl Into<String>) -> DocumentError {
    DocumentError::MalformedDocument(reason.into())
}

/// XML element with its attributes, child elements and text content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First child element with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Walk a `/`-separated path of child element names
    pub fn find(&self, path: &str) -> Option<&Element> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |element, segment| element.child(segment))
    }
}

/// One `<service>` entry of the status document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry(Element);

impl ServiceEntry {
    /// The `name` attribute
    pub fn name(&self) -> Option<&str> {
        self.0.attribute("name")
    }

    /// Text of the `<type>` child
    pub fn type_code(&self) -> Option<&str> {
        self.0.child("type").map(|element| element.text.as_str())
    }

    /// Text at `path` relative to the entry; empty elements yield `""`
    pub fn lookup(&self, path: &str) -> Option<&str> {
        self.0.find(path).map(|element| element.text.as_str())
    }

    pub fn element(&self) -> &Element {
        &self.0
    }
}

/// Parsed status document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDocument {
    services: Vec<ServiceEntry>,
}

impl StatusDocument {
    /// Parse a raw body and locate `/monit/services`
    pub fn parse(body: &str) -> Result<Self> {
        let root = parse_tree(body)?;

        if root.name != ROOT {
            return Err(malformed(format!(
                "expected root element <{}>, found <{}>",
                ROOT, root.name
            )));
        }

        let services = root
            .children
            .into_iter()
            .find(|child| child.name == SERVICES)
            .ok_or_else(|| malformed(format!("missing /{}/{}", ROOT, SERVICES)))?;

        Ok(Self {
            services: services.children.into_iter().map(ServiceEntry).collect(),
        })
    }

    pub fn services(&self) -> &[ServiceEntry] {
        &self.services
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

fn parse_tree(body: &str) -> Result<Element> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                check_depth(stack.len())?;
                stack.push(open_element(&start)?);
            }
            Ok(Event::Empty(start)) => {
                check_depth(stack.len())?;
                let element = open_element(&start)?;
                attach(element, &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed("unexpected closing tag"))?;
                attach(element, &mut stack, &mut root)?;
            }
            Ok(Event::Text(text)) => {
                let text = text
                    .unescape()
                    .map_err(|e| malformed(format!("invalid text: {}", e)))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(data)) => {
                let data = std::str::from_utf8(&data)
                    .map_err(|e| malformed(format!("invalid UTF-8 in CDATA: {}", e)))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(data);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(malformed(format!(
                    "at position {}: {}",
                    reader.error_position(),
                    e
                )));
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(format!("unclosed element <{}>", open.name)));
    }

    root.ok_or_else(|| malformed("document has no root element"))
}

fn check_depth(open: usize) -> Result<()> {
    if open >= MAX_DEPTH {
        return Err(malformed(format!(
            "elements nested deeper than {} levels",
            MAX_DEPTH
        )));
    }
    Ok(())
}

fn open_element(start: &BytesStart<'_>) -> Result<Element> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| malformed(format!("invalid element name: {}", e)))?
        .to_string();

    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| malformed(format!("invalid attribute: {}", e)))?;
        let key = std::str::from_utf8(attribute.key.as_ref())
            .map_err(|e| malformed(format!("invalid attribute name: {}", e)))?
            .to_string();
        let value = attribute
            .unescape_value()
            .map_err(|e| malformed(format!("invalid attribute value: {}", e)))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn attach(element: Element, stack: &mut [Element], root: &mut Option<Element>) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(malformed(format!(
            "multiple root elements (second is <{}>)",
            element.name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROCESS_DOC: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<monit>
  <server><uptime>1000</uptime></server>
  <services>
    <service name="cpu0">
      <type>3</type>
      <uptime>120</uptime>
      <memory><percent>1.2</percent><kilobyte>2048</kilobyte></memory>
      <cpu><percent>0.5</percent></cpu>
      <status/>
    </service>
    <service name="rootfs">
      <type>0</type>
      <block><percent>41.3</percent></block>
    </service>
  </services>
</monit>"#;

    #[test]
    fn test_parse_services_in_order() {
        let doc = StatusDocument::parse(PROCESS_DOC).unwrap();
        assert_eq!(doc.len(), 2);

        let names: Vec<_> = doc.services().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec![Some("cpu0"), Some("rootfs")]);
    }

    #[test]
    fn test_entry_lookup() {
        let doc = StatusDocument::parse(PROCESS_DOC).unwrap();
        let process = &doc.services()[0];

        assert_eq!(process.type_code(), Some("3"));
        assert_eq!(process.lookup("uptime"), Some("120"));
        assert_eq!(process.lookup("memory/percent"), Some("1.2"));
        assert_eq!(process.lookup("/cpu/percent"), Some("0.5"));
        assert_eq!(process.lookup("status"), Some(""));
        assert_eq!(process.lookup("memory/missing"), None);
        assert_eq!(process.lookup("block/percent"), None);
    }

    #[test]
    fn test_entities_unescaped() {
        let body = r#"<monit><services><service name="a&amp;b"><type>7</type><program><output>x &lt; y</output></program></service></services></monit>"#;
        let doc = StatusDocument::parse(body).unwrap();
        let entry = &doc.services()[0];

        assert_eq!(entry.name(), Some("a&b"));
        assert_eq!(entry.lookup("program/output"), Some("x < y"));
    }

    #[test]
    fn test_empty_services() {
        let doc = StatusDocument::parse("<monit><services/></monit>").unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_missing_services_path() {
        let err = StatusDocument::parse("<monit><server/></monit>").unwrap_err();
        assert!(matches!(err, DocumentError::MalformedDocument(reason) if reason.contains("/monit/services")));
    }

    #[test]
    fn test_wrong_root() {
        let err = StatusDocument::parse("<status><services/></status>").unwrap_err();
        assert!(matches!(err, DocumentError::MalformedDocument(_)));
    }

    #[test]
    fn test_not_xml() {
        assert!(StatusDocument::parse("").is_err());
        assert!(StatusDocument::parse("{\"status\": \"OK\"}").is_err());
        assert!(StatusDocument::parse("<monit><services>").is_err());
        assert!(StatusDocument::parse("<monit><services></monit>").is_err());
    }

    fn nested_body(depth: usize) -> String {
        format!(
            r#"<monit><services><service name="x"><type>3</type>{}{}</service></services></monit>"#,
            "<a>".repeat(depth),
            "</a>".repeat(depth)
        )
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let body = nested_body(20_000);

        // Small stack, like a runtime worker thread
        let result = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || StatusDocument::parse(&body))
            .unwrap()
            .join()
            .unwrap();

        let err = result.unwrap_err();
        assert!(matches!(err, DocumentError::MalformedDocument(reason) if reason.contains("nested")));
    }

    #[test]
    fn test_nesting_within_limit() {
        // monit/services/service take three levels
        let document = StatusDocument::parse(&nested_body(MAX_DEPTH - 3)).unwrap();
        assert_eq!(document.len(), 1);
        assert_eq!(document.services()[0].type_code(), Some("3"));

        assert!(StatusDocument::parse(&nested_body(MAX_DEPTH - 2)).is_err());
    }
}
