//! `load-configuration` reply decoding.
//!
//! Junos reports rejected statements inside the results element rather
//! than directly on the reply:
//!
//! ```text
//! <load-configuration-results>
//! <rpc-error>
//! <error-severity>error</error-severity>
//! <error-message>syntax error</error-message>
//! </rpc-error>
//! <load-error-count>1</load-error-count>
//! </load-configuration-results>
//! ```

use log::debug;

use super::reply::{ReplyError, RpcReply};
use super::tree;

/// Element that carries the outcome of a load.
pub const LOAD_RESULTS: &str = "load-configuration-results";

/// Entries reported for one `load-configuration`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadResults {
    /// Direct `rpc-error` entries and those below `load-configuration-results`,
    /// in document order.
    pub errors: Vec<ReplyError>,
}

impl LoadResults {
    /// Collect every entry of a load reply.
    pub fn from_reply(reply: &RpcReply) -> Self {
        if !reply.body.contains(LOAD_RESULTS) {
            return Self {
                errors: reply.errors.clone(),
            };
        }

        let wrapped = format!("<load-reply>{}</load-reply>", reply.body);
        let root = match tree::parse(&wrapped) {
            Ok(root) => root,
            Err(e) => {
                debug!("Unreadable {} ({}), keeping direct errors", LOAD_RESULTS, e);
                return Self {
                    errors: reply.errors.clone(),
                };
            }
        };

        let mut entries = Vec::new();
        for child in &root.children {
            if child.name == "rpc-error" {
                entries.push(child);
            } else if child.name == LOAD_RESULTS {
                child.descendants_named("rpc-error", &mut entries);
            }
        }

        Self {
            errors: entries.into_iter().map(ReplyError::from_node).collect(),
        }
    }

    /// Every message, concatenated without a separator.
    pub fn messages(&self) -> String {
        self.errors.iter().map(|e| e.message()).collect()
    }
}
