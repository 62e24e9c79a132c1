//! SSH transport layer wrapping russh.
//!
//! This module provides the low-level connection management: credential
//! resolution, connection setup with a compatibility cipher list, and the
//! `netconf` subsystem channel that carries framed messages.

mod ciphers;
pub mod config;
mod ssh;

use std::future::Future;

pub use ciphers::{COMPAT_CIPHERS, preferred};
pub use config::{AuthMethod, Credentials, NETCONF_PORT, SshConfig};
pub use ssh::SshTransport;

use crate::error::Result;

/// A bidirectional NETCONF message pipe.
///
/// [`SshTransport`] is the production implementation; a [`Session`] only
/// relies on this trait, so it can be driven by any message source.
///
/// [`Session`]: crate::session::Session
pub trait Transport: Send {
    /// Send one complete message. The transport adds the framing.
    fn send(&mut self, message: &str) -> impl Future<Output = Result<()>> + Send;

    /// Wait for the next complete message, without framing.
    fn receive(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Shut the connection down.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
