//! Scripted transport used by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Result, TransportError};
use crate::transport::Transport;

pub(crate) const SERVER_HELLO: &str = r#"<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
<capabilities>
<capability>urn:ietf:params:netconf:base:1.0</capability>
<capability>urn:ietf:params:netconf:capability:candidate:1.0</capability>
<capability>http://xml.juniper.net/netconf/junos/1.0</capability>
</capabilities>
<session-id>1701</session-id>
</hello>"#;

pub(crate) const SYSTEM_INFORMATION: &str = r#"
<system-information>
<hardware-model>vsrx</hardware-model>
<os-name>junos</os-name>
<os-version>23.2R1.13</os-version>
<serial-number>59A1B2C3D4E5</serial-number>
<host-name>lab-vsrx</host-name>
</system-information>
"#;

/// Everything the session wrote, shared with the test after the transport
/// has been moved into a session.
#[derive(Clone, Default)]
pub(crate) struct Sent {
    messages: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl Sent {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// Sent messages containing `needle`.
    pub(crate) fn count(&self, needle: &str) -> usize {
        self.messages().iter().filter(|m| m.contains(needle)).count()
    }

    pub(crate) fn last(&self) -> Option<String> {
        self.messages().last().cloned()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub(crate) struct MockTransport {
    replies: VecDeque<String>,
    sent: Sent,
    fail_close: bool,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A transport that completes `Session::open`.
    pub(crate) fn device() -> Self {
        Self::new()
            .raw(SERVER_HELLO)
            .reply(SYSTEM_INFORMATION)
    }

    /// Queue an `rpc-reply` with `body` as its content.
    pub(crate) fn reply(self, body: &str) -> Self {
        self.raw(&format!("<rpc-reply>{}</rpc-reply>", body))
    }

    pub(crate) fn ok(self) -> Self {
        self.reply("\n<ok/>\n")
    }

    /// Queue an `rpc-reply` holding one error of the given severity.
    pub(crate) fn error(self, severity: &str, message: &str) -> Self {
        self.reply(&format!(
            "\n<rpc-error>\n<error-severity>{}</error-severity>\n<error-message>\n{}\n</error-message>\n</rpc-error>\n",
            severity, message
        ))
    }

    /// Queue the reply to `show configuration ... | display set relative`,
    /// in the shape the device sends it. No statements gives the reply for
    /// a missing section.
    pub(crate) fn config_dump(self, statements: &[&str]) -> Self {
        let mut body = String::from("\n<configuration-information>\n<configuration-output>\n");
        for statement in statements {
            body.push_str(statement);
            body.push('\n');
        }
        body.push_str("</configuration-output>\n</configuration-information>\n");
        self.reply(&body)
    }

    /// Queue a `load-configuration` reply rejecting statements, one error
    /// per message, nested under `load-configuration-results`.
    pub(crate) fn load_errors(self, messages: &[&str]) -> Self {
        let mut body = String::from("\n<load-configuration-results>\n");
        for message in messages {
            body.push_str(&format!(
                "<rpc-error>\n<error-severity>error</error-severity>\n<error-message>\n{}\n</error-message>\n</rpc-error>\n",
                message
            ));
        }
        body.push_str(&format!(
            "<load-error-count>{}</load-error-count>\n</load-configuration-results>\n",
            messages.len()
        ));
        self.reply(&body)
    }

    /// Queue a message verbatim.
    pub(crate) fn raw(mut self, message: &str) -> Self {
        self.replies.push_back(message.to_string());
        self
    }

    pub(crate) fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub(crate) fn sent(&self) -> Sent {
        self.sent.clone()
    }
}

impl Transport for MockTransport {
    async fn send(&mut self, message: &str) -> Result<()> {
        self.sent.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn receive(&mut self) -> Result<String> {
        self.replies
            .pop_front()
            .ok_or_else(|| TransportError::Disconnected.into())
    }

    async fn close(&mut self) -> Result<()> {
        self.sent.closed.store(true, Ordering::SeqCst);
        if self.fail_close {
            return Err(TransportError::Disconnected.into());
        }
        Ok(())
    }
}
