//! NETCONF `hello` exchange.

use indexmap::IndexSet;

use super::tree;
use crate::error::ParseError;

/// NETCONF base namespace.
pub const NETCONF_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// Capability announced by this client.
pub const BASE_CAPABILITY: &str = "urn:ietf:params:netconf:base:1.0";

/// Build the client hello message.
pub fn client_hello() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <hello xmlns=\"{}\"><capabilities><capability>{}</capability></capabilities></hello>",
        NETCONF_NS, BASE_CAPABILITY
    )
}

/// The server hello.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hello {
    /// Session id assigned by the device.
    pub session_id: Option<u32>,

    /// Announced capabilities, in order, without duplicates.
    pub capabilities: IndexSet<String>,
}

impl Hello {
    /// Decode a server hello message.
    pub fn parse(message: &str) -> Result<Self, ParseError> {
        let root = tree::parse(message)?;
        if root.name != "hello" {
            return Err(ParseError::Malformed(format!(
                "expected <hello>, found <{}>",
                root.name
            )));
        }

        let capabilities = root
            .child("capabilities")
            .map(|caps| {
                caps.children_named("capability")
                    .map(|c| c.text.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let session_id = root
            .child_text("session-id")
            .and_then(|id| id.parse().ok());

        Ok(Self {
            session_id,
            capabilities,
        })
    }

    /// Whether a capability starting with `prefix` was announced.
    pub fn supports(&self, prefix: &str) -> bool {
        self.capabilities.iter().any(|c| c.starts_with(prefix))
    }
}
