//! `rpc-reply` envelope decoding.

use super::tree::{self, Node};
use crate::error::ParseError;

/// Severity value that marks an entry as non-fatal.
pub const WARNING_SEVERITY: &str = "warning";

/// Severity of an `rpc-error` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Reported but not fatal.
    Warning,
    /// Anything other than `warning`.
    Error,
}

impl Severity {
    /// Classify a raw `error-severity` value.
    pub fn parse(value: &str) -> Self {
        if value.trim() == WARNING_SEVERITY {
            Severity::Warning
        } else {
            Severity::Error
        }
    }
}

/// One `rpc-error` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyError {
    /// `error-severity`.
    pub severity: Severity,
    /// `error-path`, as sent by the device.
    pub path: String,
    /// `error-info/bad-element`, as sent by the device.
    pub element: String,
    /// `error-message`, as sent by the device.
    pub message: String,
}

impl ReplyError {
    pub(crate) fn from_node(node: &Node) -> Self {
        let text = |name: &str| {
            node.child(name)
                .map(|c| c.text.clone())
                .unwrap_or_default()
        };

        let element = node
            .child("error-info")
            .and_then(|info| info.child("bad-element"))
            .or_else(|| node.child("bad-element"))
            .map(|c| c.text.clone())
            .unwrap_or_default();

        Self {
            severity: Severity::parse(&text("error-severity")),
            path: text("error-path"),
            element,
            message: text("error-message"),
        }
    }

    /// Whether this entry is a warning.
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// The message with surrounding whitespace removed.
    pub fn message(&self) -> &str {
        self.message.trim()
    }

    /// Render a fatal commit entry in the three-line form
    /// `[<path>]\n    <element>\nError: <message>`.
    pub fn format_fatal(&self) -> String {
        format!(
            "[{}]\n    {}\nError: {}",
            trim_field(&self.path),
            trim_field(&self.element),
            trim_field(&self.message)
        )
    }
}

fn trim_field(field: &str) -> &str {
    field.trim_matches(|c: char| c == '[' || c == ']' || c.is_whitespace())
}

/// A decoded `rpc-reply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcReply {
    /// `message-id` attribute, when present.
    pub message_id: Option<String>,

    /// `rpc-error` entries that are direct children of the reply, in order.
    pub errors: Vec<ReplyError>,

    /// Whether a direct `<ok/>` child is present.
    pub ok: bool,

    /// Raw inner content of the reply, byte-for-byte.
    pub body: String,
}

impl RpcReply {
    /// Decode one framed message.
    pub fn parse(message: &str) -> Result<Self, ParseError> {
        let root = tree::parse(message)?;
        if root.name != "rpc-reply" {
            return Err(ParseError::Malformed(format!(
                "expected <rpc-reply>, found <{}>",
                root.name
            )));
        }

        Ok(Self {
            message_id: root.attribute("message-id").map(str::to_string),
            errors: root
                .children_named("rpc-error")
                .map(ReplyError::from_node)
                .collect(),
            ok: root.child("ok").is_some(),
            body: root.inner_raw(message).to_string(),
        })
    }

    /// Whether the device reported any `rpc-error`.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Message of the first reported error.
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_reply() {
        let raw = "<rpc-reply xmlns=\"urn:ietf:params:xml:ns:netconf:base:1.0\" message-id=\"3\">\n<ok/>\n</rpc-reply>";
        let reply = RpcReply::parse(raw).unwrap();
        assert!(reply.ok);
        assert!(!reply.has_errors());
        assert_eq!(reply.message_id.as_deref(), Some("3"));
        assert_eq!(reply.body, "\n<ok/>\n");
    }

    #[test]
    fn test_errors_in_order() {
        let raw = r#"<rpc-reply>
<rpc-error>
<error-severity>warning</error-severity>
<error-message>statement has no contents; ignored</error-message>
</rpc-error>
<rpc-error>
<error-type>protocol</error-type>
<error-severity>error</error-severity>
<error-path>[edit interfaces]</error-path>
<error-info>
<bad-element>ge-0/0/99</bad-element>
</error-info>
<error-message>
syntax error
</error-message>
</rpc-error>
</rpc-reply>"#;
        let reply = RpcReply::parse(raw).unwrap();
        assert_eq!(reply.errors.len(), 2);
        assert!(reply.errors[0].is_warning());
        assert_eq!(reply.errors[1].severity, Severity::Error);
        assert_eq!(reply.errors[1].element, "ge-0/0/99");
        assert_eq!(reply.first_error(), Some("statement has no contents; ignored"));
        assert_eq!(reply.errors[1].message(), "syntax error");
    }

    #[test]
    fn test_body_is_raw() {
        let raw = "<rpc-reply><configuration-output>\nset description \"a &amp; b\"\n</configuration-output></rpc-reply>";
        let reply = RpcReply::parse(raw).unwrap();
        assert_eq!(
            reply.body,
            "<configuration-output>\nset description \"a &amp; b\"\n</configuration-output>"
        );
    }

    #[test]
    fn test_wrong_root() {
        let err = RpcReply::parse("<hello/>").unwrap_err();
        assert!(err.to_string().contains("<hello>"));
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("warning"), Severity::Warning);
        assert_eq!(Severity::parse(" warning\n"), Severity::Warning);
        assert_eq!(Severity::parse("error"), Severity::Error);
        assert_eq!(Severity::parse(""), Severity::Error);
    }

    #[test]
    fn test_format_fatal() {
        let entry = ReplyError {
            severity: Severity::Error,
            path: "\n[edit security policies]\n".into(),
            element: "\npolicy allow-all\n".into(),
            message: "\nmissing mandatory statement: 'match'\n".into(),
        };
        assert_eq!(
            entry.format_fatal(),
            "[edit security policies]\n    policy allow-all\nError: missing mandatory statement: 'match'"
        );
    }
}
