//! Minimal element tree over device replies.
//!
//! Junos wraps free-text payloads (configuration dumps, command output) in
//! XML elements without guaranteeing the text is strictly well-formed. The
//! tree therefore records, for every element, the byte range of its raw
//! inner content in the source document, so callers can take a body
//! verbatim instead of re-serializing parsed text. End-tag names are not
//! checked.

use std::ops::Range;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ParseError;

/// One element of a parsed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Local name, namespace prefix removed.
    pub name: String,

    /// Attributes as (local name, raw value), in document order.
    pub attributes: Vec<(String, String)>,

    /// Unescaped direct text content, empty when the element has none.
    pub text: String,

    /// Child elements in document order.
    pub children: Vec<Node>,

    /// Byte range of the raw inner content in the source document.
    pub inner: Range<usize>,
}

impl Node {
    fn start(e: &BytesStart<'_>, inner_start: usize) -> Self {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        let attributes = e
            .attributes()
            .filter_map(|a| a.ok())
            .map(|a| {
                (
                    String::from_utf8_lossy(a.key.local_name().as_ref()).into_owned(),
                    String::from_utf8_lossy(&a.value).into_owned(),
                )
            })
            .collect();

        Self {
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
            inner: inner_start..inner_start,
        }
    }

    /// Raw inner content of this element within `source`.
    pub fn inner_raw<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.inner.clone()).unwrap_or("")
    }

    /// Value of an attribute by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first direct child with the given name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim())
    }

    /// First element with the given name, searching depth-first and
    /// including `self`.
    pub fn find(&self, name: &str) -> Option<&Node> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Every element with the given name below `self`, in document order.
    pub fn descendants_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Node>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            }
            child.descendants_named(name, out);
        }
    }
}

/// Parse the first root element of `source`.
///
/// Declarations, comments and anything after the root element are ignored.
pub fn parse(source: &str) -> Result<Node, ParseError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = false;

    let mut stack: Vec<Node> = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event()?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                stack.push(Node::start(&e, after));
            }
            Event::Empty(e) => {
                let node = Node::start(&e, after);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Ok(node),
                }
            }
            Event::End(_) => {
                let mut node = stack.pop().ok_or_else(|| {
                    ParseError::Malformed("closing tag without open tag".to_string())
                })?;
                node.inner.end = before;

                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => return Ok(node),
                }
            }
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    let text = match e.unescape() {
                        Ok(text) => text.into_owned(),
                        Err(_) => String::from_utf8_lossy(&e).into_owned(),
                    };
                    if !text.trim().is_empty() {
                        current.text.push_str(&text);
                    }
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.is_empty() {
        Err(ParseError::Malformed("no root element found".to_string()))
    } else {
        Err(ParseError::Malformed(
            "unclosed element(s) at end of document".to_string(),
        ))
    }
}
