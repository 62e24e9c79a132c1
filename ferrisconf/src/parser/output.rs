//! Command output unwrapping.
//!
//! Junos answers `<command>` with its output wrapped in an element named
//! after the command, e.g.
//!
//! ```text
//! <configuration-information>
//! <configuration-output>
//! set description uplink
//! </configuration-output>
//! </configuration-information>
//! ```
//!
//! The wrapper is removed and its raw content returned. A wrapper holding
//! nothing but empty elements is reported as [`EMPTY_OUTPUT`].

use std::sync::LazyLock;

use regex::Regex;

use super::set_dump::EMPTY_OUTPUT;
use super::tree::{self, Node};
use crate::error::ParseError;

/// A body made of one self-closing element and nothing else.
static EMPTY_ELEMENT: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^<[A-Za-z0-9_:.\-]+[ \t\r\n]*/>$"));

/// Whether `body` is a single self-closing element such as `<output/>`.
pub fn is_empty_element(body: &str) -> Result<bool, ParseError> {
    let pattern = EMPTY_ELEMENT
        .as_ref()
        .map_err(|e| ParseError::InvalidPattern(e.clone()))?;
    Ok(pattern.is_match(body.trim()))
}

/// No text anywhere along a chain of single children.
fn is_blank(node: &Node) -> bool {
    node.text.trim().is_empty()
        && match node.children.as_slice() {
            [] => true,
            [only] => is_blank(only),
            _ => false,
        }
}

/// Reduce the body of a command reply to the command output.
///
/// Bodies that are not a single element (plain text, several siblings,
/// or markup the tree cannot read) are returned unchanged.
pub fn command_output(body: &str) -> Result<String, ParseError> {
    if body.trim().is_empty() || is_empty_element(body)? {
        return Ok(EMPTY_OUTPUT.to_string());
    }

    let wrapped = format!("<command-reply>{}</command-reply>", body);
    let Ok(document) = tree::parse(&wrapped) else {
        return Ok(body.to_string());
    };

    let root = match document.children.as_slice() {
        [root] if document.text.trim().is_empty() => root,
        _ => return Ok(body.to_string()),
    };

    if is_blank(root) {
        return Ok(EMPTY_OUTPUT.to_string());
    }
    Ok(root.inner_raw(&wrapped).to_string())
}
