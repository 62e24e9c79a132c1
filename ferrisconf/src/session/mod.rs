//! NETCONF session over a [`Transport`].
//!
//! A [`Session`] performs the hello exchange, gathers device facts and then
//! runs one RPC at a time. Replies are reduced to plain strings here; the
//! candidate configuration workflow lives in [`Transaction`].
//!
//! # Example
//!
//! ```rust,no_run
//! use ferrisconf::session::Session;
//! use ferrisconf::transport::{AuthMethod, SshConfig, SshTransport};
//!
//! # async fn example() -> Result<(), ferrisconf::Error> {
//! let config = SshConfig::new("192.0.2.10", "automation", AuthMethod::Password("secret".to_string().into()));
//! let transport = SshTransport::connect(&config).await?;
//! let mut session = Session::open(transport).await?;
//!
//! println!("{} running {}", session.facts().host_name(), session.facts().os_version());
//! let output = session.run_command("show chassis alarms").await?;
//! println!("{}", output);
//!
//! session.close(std::time::Duration::from_millis(500)).await?;
//! # Ok(())
//! # }
//! ```

#[cfg(test)]
pub(crate) mod mock;
pub mod rpc;
mod transaction;

use std::time::Duration;

use indexmap::IndexSet;
use log::{debug, trace, warn};

pub use transaction::{Batch, DEFAULT_LOCK_INTERVAL, DEFAULT_LOCK_TIMEOUT, Transaction};

use crate::error::{Result, SessionError};
use crate::parser::{Facts, Hello, LoadResults, RpcReply, client_hello, command_output};
use crate::transport::{SshTransport, Transport};

/// An open NETCONF session.
pub struct Session<T: Transport = SshTransport> {
    transport: T,
    hello: Hello,
    facts: Facts,
    message_id: u64,

    /// Whether this session holds the candidate lock.
    pub(crate) locked: bool,
}

impl<T: Transport> Session<T> {
    /// Exchange hellos and gather facts.
    pub async fn open(mut transport: T) -> Result<Self> {
        transport.send(&client_hello()).await?;
        let raw = transport.receive().await?;
        let hello = Hello::parse(&raw).map_err(|e| SessionError::Hello {
            message: e.to_string(),
        })?;

        debug!(
            "NETCONF session {:?} established, {} capabilities",
            hello.session_id,
            hello.capabilities.len()
        );

        let mut session = Self {
            transport,
            hello,
            facts: Facts::default(),
            message_id: 0,
            locked: false,
        };

        let reply = session.exec(rpc::GET_SYSTEM_INFORMATION).await?;
        if reply.has_errors() {
            let message = reply
                .errors
                .iter()
                .map(|e| e.message())
                .collect::<Vec<_>>()
                .join("\n");
            return Err(SessionError::Facts { message }.into());
        }
        session.facts = Facts::parse(&reply.body)?;

        debug!(
            "Device {} ({}, {} {})",
            session.facts.host_name(),
            session.facts.hardware_model(),
            session.facts.os_name(),
            session.facts.os_version()
        );

        Ok(session)
    }

    /// Send one operation and decode its reply.
    pub(crate) async fn exec(&mut self, operation: &str) -> Result<RpcReply> {
        self.message_id += 1;
        let id = self.message_id;

        trace!("rpc {} >> {}", id, operation);
        self.transport.send(&rpc::envelope(id, operation)).await?;

        let raw = self.transport.receive().await?;
        trace!("rpc {} << {}", id, raw);

        let reply = RpcReply::parse(&raw)?;
        if let Some(reply_id) = &reply.message_id {
            if *reply_id != id.to_string() {
                warn!("Reply message-id {} does not match request {}", reply_id, id);
            }
        }

        debug!(
            "rpc {}: {} error(s), {} byte body",
            id,
            reply.errors.len(),
            reply.body.len()
        );
        Ok(reply)
    }

    /// Run a CLI command and return its text output.
    ///
    /// The element wrapping the output is removed. A reply with no body, or
    /// one whose wrapper holds no text, yields
    /// [`EMPTY_OUTPUT`](crate::parser::EMPTY_OUTPUT). The first device error
    /// fails the call.
    pub async fn run_command(&mut self, command: &str) -> Result<String> {
        let reply = self.exec(&rpc::command(command)).await?;
        if let Some(message) = reply.first_error() {
            return Err(SessionError::Command {
                message: message.to_string(),
            }
            .into());
        }

        Ok(command_output(&reply.body)?)
    }

    /// Send a caller-built operation and return the untouched reply body.
    pub async fn run_raw_command(&mut self, operation: &str) -> Result<String> {
        let reply = self.exec(operation).await?;
        if let Some(message) = reply.first_error() {
            return Err(SessionError::Command {
                message: message.to_string(),
            }
            .into());
        }
        Ok(reply.body)
    }

    /// Load set statements into the candidate configuration.
    ///
    /// Device errors do not fail the call: every reported message, whether
    /// attached to the reply or to `load-configuration-results`, is
    /// concatenated into the returned string, which is empty after a clean
    /// load.
    pub async fn load_config_set(&mut self, lines: &[String]) -> Result<String> {
        let reply = self.exec(&rpc::load_configuration_set(lines)).await?;
        let messages = LoadResults::from_reply(&reply).messages();

        if !messages.is_empty() {
            debug!("load-configuration reported: {}", messages);
        }
        Ok(messages)
    }

    /// Close the session.
    ///
    /// The transport is closed and `drain_delay` is slept whatever the
    /// outcome of `<close-session/>`; the first failure is returned after
    /// that.
    pub async fn close(mut self, drain_delay: Duration) -> Result<()> {
        debug!("Closing NETCONF session {:?}", self.hello.session_id);

        let rpc_result = match self.exec(rpc::CLOSE_SESSION).await {
            Ok(reply) => match reply.first_error() {
                Some(message) => Err(SessionError::Command {
                    message: message.to_string(),
                }
                .into()),
                None => Ok(()),
            },
            Err(e) => Err(e),
        };
        let close_result = self.transport.close().await;

        tokio::time::sleep(drain_delay).await;

        rpc_result.and(close_result)
    }

    /// Start a candidate configuration transaction.
    pub fn transaction(&mut self) -> Transaction<'_, T> {
        Transaction::new(self)
    }

    /// Facts gathered when the session opened.
    pub fn facts(&self) -> &Facts {
        &self.facts
    }

    /// The server hello.
    pub fn hello(&self) -> &Hello {
        &self.hello
    }

    /// Session id assigned by the device.
    pub fn session_id(&self) -> Option<u32> {
        self.hello.session_id
    }

    /// Capabilities announced by the device.
    pub fn capabilities(&self) -> &IndexSet<String> {
        &self.hello.capabilities
    }

    /// Whether the candidate lock is held by this session.
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}
