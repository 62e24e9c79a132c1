//! RPC payloads sent by the session and the transaction controller.

use quick_xml::escape::partial_escape;

use crate::parser::NETCONF_NS;

pub const GET_SYSTEM_INFORMATION: &str = "<get-system-information/>";
pub const LOCK_CANDIDATE: &str = "<lock><target><candidate/></target></lock>";
pub const UNLOCK_CANDIDATE: &str = "<unlock><target><candidate/></target></unlock>";
pub const CLEAR_CANDIDATE: &str = "<delete-config><target><candidate/></target></delete-config>";
pub const CLOSE_SESSION: &str = "<close-session/>";

/// `<command format="text">` with the CLI command as text content.
pub fn command(text: &str) -> String {
    format!("<command format=\"text\">{}</command>", partial_escape(text))
}

/// Load `lines` into the candidate as set statements.
pub fn load_configuration_set(lines: &[String]) -> String {
    format!(
        "<load-configuration action=\"set\" format=\"text\"><configuration-set>{}</configuration-set></load-configuration>",
        partial_escape(&lines.join("\n"))
    )
}

/// Commit the candidate with a log message.
pub fn commit_configuration(log: &str) -> String {
    format!(
        "<commit-configuration><log>{}</log></commit-configuration>",
        partial_escape(log)
    )
}

/// Wrap an operation in the `rpc` envelope.
pub fn envelope(message_id: u64, body: &str) -> String {
    format!(
        "<rpc message-id=\"{}\" xmlns=\"{}\">{}</rpc>",
        message_id, NETCONF_NS, body
    )
}
