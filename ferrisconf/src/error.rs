//! Error types for ferrisconf.
//!
//! Device-side RPC failures are reported with different policies depending
//! on the operation (first message, accumulated warnings, or a soft string),
//! so each layer keeps its own enum and the crate-level [`Error`] only nests
//! them.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for ferrisconf operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// NETCONF session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Reply decoding errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Candidate transaction errors
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    /// Client settings are incomplete or inconsistent
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// No usable credential form was supplied
    #[error("{message}")]
    Auth { message: String },

    /// Failed to reach the host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: russh::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// The device rejected the credentials
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key could not be read or decoded
    #[error("SSH key error: {0}")]
    Key(String),

    /// The netconf subsystem channel was closed by the peer
    #[error("Connection disconnected")]
    Disconnected,

    /// The connection attempt did not complete in time
    #[error("Connection to {host}:{port} timed out after {after:?}")]
    Timeout {
        host: String,
        port: u16,
        after: Duration,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// The error returned when no credential form is populated.
    pub(crate) fn no_credentials() -> Self {
        TransportError::Auth {
            message: "no credentials available".to_string(),
        }
    }
}

/// NETCONF session errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The server hello was missing or unusable
    #[error("NETCONF hello failed: {message}")]
    Hello { message: String },

    /// The device answered `get-system-information` with errors
    #[error("failed to gather facts: {message}")]
    Facts { message: String },

    /// A single RPC was rejected by the device
    #[error("{message}")]
    Command { message: String },

    /// The session has already been closed
    #[error("Session closed")]
    Closed,
}

/// Reply decoding errors.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The envelope could not be tokenized
    #[error("failed to parse XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Structural problem in the envelope
    #[error("malformed reply: {0}")]
    Malformed(String),

    /// The body did not have the expected shape; only the payload size is
    /// kept so large configuration dumps stay out of log lines
    #[error("failed to decode {what} from reply data ({size} bytes)")]
    Decode { what: &'static str, size: usize },

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Candidate configuration transaction errors.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// Commit rejected; `warnings` holds the warnings reported before the
    /// fatal entry
    #[error("{message}")]
    Commit {
        message: String,
        warnings: Vec<String>,
    },

    /// Clearing the candidate configuration failed
    #[error("failed to clear candidate configuration: {message}")]
    Clear { message: String },

    /// Releasing the candidate lock failed
    #[error("failed to unlock candidate configuration: {message}")]
    Unlock { message: String },

    /// The candidate lock could not be acquired in time
    #[error("candidate configuration lock attempt aborted after {0:?}")]
    LockTimeout(Duration),

    /// The device reported errors while loading set statements
    #[error("{message}")]
    LoadRejected { message: String },

    /// A mutation failed after locking; `clear` is set when the follow-up
    /// clear failed too
    #[error("{}", aborted_message(.source, .clear))]
    Aborted {
        source: Box<Error>,
        clear: Option<Box<Error>>,
    },
}

fn aborted_message(source: &Error, clear: &Option<Box<Error>>) -> String {
    match clear {
        Some(clear) => format!("{source} (additionally: {clear})"),
        None => source.to_string(),
    }
}

impl TransactionError {
    /// Warnings that accompanied a failed commit, if any.
    pub fn warnings(&self) -> &[String] {
        match self {
            TransactionError::Commit { warnings, .. } => warnings,
            TransactionError::Aborted { source, .. } => match source.as_ref() {
                Error::Transaction(inner) => inner.warnings(),
                _ => &[],
            },
            _ => &[],
        }
    }
}

/// Result type alias using ferrisconf's Error.
pub type Result<T> = std::result::Result<T, Error>;
