//! Minimal XML tree used for content descriptors, vault properties and
//! vendor status responses.
//!
//! Parsing is done with `quick-xml`; the writer produces the FileVault
//! document-view layout (one attribute per line).

use crate::core::{PackMgrError, PackMgrResult};
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First descendant element (depth-first) with the given name, including self
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.find(name))
    }

    /// Concatenated text content of direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<String>()
    }
}

fn start_to_element(start: &BytesStart<'_>) -> PackMgrResult<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    let mut element = XmlElement::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| PackMgrError::parse("XML attribute", e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| PackMgrError::parse("XML attribute value", e))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn push_node(stack: &mut [XmlElement], root: &mut Option<XmlElement>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if let XmlNode::Element(e) = node {
                if root.is_none() {
                    *root = Some(e);
                }
            }
        }
    }
}

/// Parse an XML document and return its root element
pub fn parse(xml: &str) -> PackMgrResult<XmlElement> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(start_to_element(&start)?),
            Ok(Event::Empty(start)) => {
                let element = start_to_element(&start)?;
                push_node(&mut stack, &mut root, XmlNode::Element(element));
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or_else(|| {
                    PackMgrError::parse("XML document", "unexpected closing tag")
                })?;
                push_node(&mut stack, &mut root, XmlNode::Element(element));
            }
            Ok(Event::Text(text)) => {
                let text = text
                    .unescape()
                    .map_err(|e| PackMgrError::parse("XML text", e))?
                    .into_owned();
                if !stack.is_empty() {
                    push_node(&mut stack, &mut root, XmlNode::Text(text));
                }
            }
            Ok(Event::CData(data)) => {
                let text = String::from_utf8_lossy(&data).to_string();
                push_node(&mut stack, &mut root, XmlNode::Text(text));
            }
            Ok(Event::Comment(comment)) => {
                let text = String::from_utf8_lossy(&comment).to_string();
                if !stack.is_empty() {
                    push_node(&mut stack, &mut root, XmlNode::Comment(text));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(PackMgrError::parse(
                    format!("XML document at position {}", reader.buffer_position()),
                    e,
                ))
            }
        }
    }

    if !stack.is_empty() {
        return Err(PackMgrError::parse(
            "XML document",
            format!("unclosed element <{}>", stack[stack.len() - 1].name),
        ));
    }
    root.ok_or_else(|| PackMgrError::parse("XML document", "no root element"))
}

/// Serialize a tree in document-view layout
///
/// Namespace declarations stay on the opening line, every other attribute
/// gets its own line. Whitespace-only text is dropped and re-indented.
pub fn write_docview(root: &XmlElement) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    write_element(&mut out, root, 0);
    out
}

fn write_element(out: &mut String, element: &XmlElement, level: usize) {
    let indent = INDENT.repeat(level);
    out.push_str(&indent);
    out.push('<');
    out.push_str(&element.name);

    for (key, value) in element.attributes.iter().filter(|(k, _)| is_ns_decl(k)) {
        out.push_str(&format!(" {}=\"{}\"", key, escape_attribute(value)));
    }
    for (key, value) in element.attributes.iter().filter(|(k, _)| !is_ns_decl(k)) {
        out.push('\n');
        out.push_str(&indent);
        out.push_str(INDENT);
        out.push_str(&format!("{}=\"{}\"", key, escape_attribute(value)));
    }

    let children: Vec<&XmlNode> = element
        .children
        .iter()
        .filter(|c| !matches!(c, XmlNode::Text(t) if t.trim().is_empty()))
        .collect();

    if children.is_empty() {
        out.push_str("/>\n");
        return;
    }

    if let [XmlNode::Text(text)] = children.as_slice() {
        out.push('>');
        out.push_str(&escape(text.as_str()));
        out.push_str(&format!("</{}>\n", element.name));
        return;
    }

    out.push_str(">\n");
    for child in children {
        match child {
            XmlNode::Element(e) => write_element(out, e, level + 1),
            XmlNode::Text(t) => {
                out.push_str(&INDENT.repeat(level + 1));
                out.push_str(&escape(t.trim()));
                out.push('\n');
            }
            XmlNode::Comment(c) => {
                out.push_str(&INDENT.repeat(level + 1));
                out.push_str(&format!("<!--{}-->\n", c));
            }
        }
    }
    out.push_str(&indent);
    out.push_str(&format!("</{}>\n", element.name));
}

/// Escape an attribute value so that line breaks and tabs survive
/// attribute value normalization of the reading parser
fn escape_attribute(value: &str) -> String {
    escape(value)
        .replace('\n', "&#xa;")
        .replace('\r', "&#xd;")
        .replace('\t', "&#x9;")
}

fn is_ns_decl(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}
