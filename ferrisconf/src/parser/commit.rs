//! Commit reply evaluation.
//!
//! A commit reply is checked in order:
//!
//! 1. `rpc-error` entries attached directly to the reply.
//! 2. The canonical `\n<ok/>\n` body.
//! 3. A `commit-results` document and the `rpc-error` entries beneath it.
//!
//! In steps 1 and 3 entries are walked in document order: warnings are
//! collected until the first non-warning entry, which aborts the commit and
//! is returned together with the warnings seen so far.

use super::reply::{ReplyError, RpcReply};
use super::tree;
use crate::error::{Error, ParseError, Result, TransactionError};

/// Body of a reply to a commit that succeeded without any message.
pub const OK_BODY: &str = "\n<ok/>\n";

/// Successful commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Warnings reported by the device, in order.
    pub warnings: Vec<String>,
}

/// Entries of a `commit-results` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResults {
    /// Every `rpc-error` below `commit-results`, in document order.
    pub errors: Vec<ReplyError>,
}

impl CommitResults {
    /// Decode a reply body holding a `commit-results` element.
    pub fn parse(body: &str) -> std::result::Result<Self, ParseError> {
        let decode_error = || ParseError::Decode {
            what: "commit-results",
            size: body.len(),
        };

        // the body may hold several top-level elements
        let wrapped = format!("<commit-reply>{}</commit-reply>", body);
        let root = tree::parse(&wrapped).map_err(|_| decode_error())?;
        let results = root.find("commit-results").ok_or_else(decode_error)?;

        let mut entries = Vec::new();
        results.descendants_named("rpc-error", &mut entries);

        Ok(Self {
            errors: entries.into_iter().map(ReplyError::from_node).collect(),
        })
    }
}

/// Walk entries in order, pushing warnings until the first fatal entry.
fn partition(
    entries: &[ReplyError],
    warnings: &mut Vec<String>,
    render: impl Fn(&ReplyError) -> String,
) -> Option<String> {
    for entry in entries {
        if entry.is_warning() {
            warnings.push(entry.message().to_string());
        } else {
            return Some(render(entry));
        }
    }
    None
}

/// Evaluate the reply to `commit-configuration`.
pub fn evaluate(reply: &RpcReply) -> Result<CommitOutcome> {
    let mut warnings = Vec::new();

    if let Some(message) = partition(&reply.errors, &mut warnings, |e| e.message().to_string()) {
        return Err(TransactionError::Commit { message, warnings }.into());
    }

    if reply.body == OK_BODY {
        return Ok(CommitOutcome { warnings });
    }

    let results = match CommitResults::parse(&reply.body) {
        Ok(results) => results,
        // a structural <ok/> with nothing else to decode
        Err(_) if reply.ok && !reply.body.contains("commit-results") => {
            return Ok(CommitOutcome { warnings });
        }
        Err(e) => return Err(Error::Parse(e)),
    };

    if let Some(message) = partition(&results.errors, &mut warnings, ReplyError::format_fatal) {
        return Err(TransactionError::Commit { message, warnings }.into());
    }

    Ok(CommitOutcome { warnings })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(raw: &str) -> RpcReply {
        RpcReply::parse(raw).unwrap()
    }

    fn commit_failure(result: Result<CommitOutcome>) -> (String, Vec<String>) {
        match result {
            Err(Error::Transaction(TransactionError::Commit { message, warnings })) => {
                (message, warnings)
            }
            other => panic!("expected commit error, got {:?}", other),
        }
    }

    #[test]
    fn test_ok_body() {
        let outcome = evaluate(&reply("<rpc-reply>\n<ok/>\n</rpc-reply>")).unwrap();
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_commit_success_document() {
        let raw = r#"<rpc-reply>
<commit-results>
<routing-engine>
<name>re0</name>
<commit-success/>
</routing-engine>
</commit-results>
</rpc-reply>"#;
        let outcome = evaluate(&reply(raw)).unwrap();
        assert_eq!(outcome, CommitOutcome::default());
    }

    #[test]
    fn test_two_warnings_then_fatal() {
        let raw = r#"<rpc-reply>
<commit-results>
<routing-engine>
<name>re0</name>
<rpc-error>
<error-severity>warning</error-severity>
<error-path>[edit interfaces]</error-path>
<error-message>first warning</error-message>
</rpc-error>
<rpc-error>
<error-severity>warning</error-severity>
<error-message>second warning</error-message>
</rpc-error>
<rpc-error>
<error-severity>error</error-severity>
<error-path>
[edit security zones]
</error-path>
<error-info>
<bad-element>security-zone trust</bad-element>
</error-info>
<error-message>
interface ge-0/0/1.0 is used in two zones
</error-message>
</rpc-error>
<rpc-error>
<error-severity>warning</error-severity>
<error-message>after the fatal one</error-message>
</rpc-error>
</routing-engine>
</commit-results>
</rpc-reply>"#;

        let (message, warnings) = commit_failure(evaluate(&reply(raw)));
        assert_eq!(warnings, ["first warning", "second warning"]);
        assert_eq!(
            message,
            "[edit security zones]\n    security-zone trust\nError: interface ge-0/0/1.0 is used in two zones"
        );
    }

    #[test]
    fn test_direct_errors_fail_fast() {
        let raw = r#"<rpc-reply>
<rpc-error>
<error-severity>warning</error-severity>
<error-message>uncommitted changes will be discarded on exit</error-message>
</rpc-error>
<rpc-error>
<error-severity>error</error-severity>
<error-message>configuration check-out failed</error-message>
</rpc-error>
</rpc-reply>"#;

        let (message, warnings) = commit_failure(evaluate(&reply(raw)));
        assert_eq!(message, "configuration check-out failed");
        assert_eq!(warnings, ["uncommitted changes will be discarded on exit"]);
    }

    #[test]
    fn test_direct_warning_then_results() {
        let raw = r#"<rpc-reply>
<rpc-error>
<error-severity>warning</error-severity>
<error-message>direct warning</error-message>
</rpc-error>
<commit-results>
<rpc-error>
<error-severity>warning</error-severity>
<error-message>nested warning</error-message>
</rpc-error>
</commit-results>
</rpc-reply>"#;

        let outcome = evaluate(&reply(raw)).unwrap();
        assert_eq!(outcome.warnings, ["direct warning", "nested warning"]);
    }

    #[test]
    fn test_undecodable_body() {
        let raw = "<rpc-reply><unexpected>data</unexpected></rpc-reply>";
        match evaluate(&reply(raw)) {
            Err(Error::Parse(ParseError::Decode { what, size })) => {
                assert_eq!(what, "commit-results");
                assert_eq!(size, "<unexpected>data</unexpected>".len());
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }
}
