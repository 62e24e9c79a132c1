//! Decoders for device replies.
//!
//! Only envelopes are parsed structurally. Payloads that carry device text
//! (command output, configuration dumps) are handed back as the raw inner
//! content of their element.

mod commit;
mod hello;
mod load;
mod output;
mod reply;
mod set_dump;
mod system_info;
mod tree;

pub use commit::{CommitOutcome, CommitResults, OK_BODY, evaluate as evaluate_commit};
pub use hello::{BASE_CAPABILITY, Hello, NETCONF_NS, client_hello};
pub use load::{LOAD_RESULTS, LoadResults};
pub use output::{command_output, is_empty_element};
pub use reply::{ReplyError, RpcReply, Severity, WARNING_SEVERITY};
pub use set_dump::{
    ConfigDump, EMPTY_OUTPUT, OUTPUT_CLOSE, OUTPUT_OPEN, SET_PREFIX, show_config_command,
};
pub use system_info::Facts;
