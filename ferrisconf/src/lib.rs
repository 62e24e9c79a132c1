//! # Ferrisconf
//!
//! Async NETCONF session and candidate-transaction core for Junos devices.
//!
//! Ferrisconf opens a NETCONF 1.0 session over the SSH `netconf` subsystem,
//! runs operational commands and pushes set-style configuration through a
//! lock / load / commit / clear / unlock cycle.
//!
//! ## Features
//!
//! - Async SSH connections via russh with a firmware-compatible cipher list
//! - `]]>]]>` message framing with incremental delimiter search
//! - Commit replies split into ordered warnings and the first fatal error
//! - `display set relative` dumps decoded into plain statements
//! - A [`resource::Resource`] contract for typed configuration objects
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ferrisconf::{Batch, ClientBuilder, DeviceLock};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ferrisconf::Error> {
//!     let client = ClientBuilder::new("192.0.2.10")
//!         .username("automation")
//!         .password("secret")
//!         .build()?;
//!     let lock = DeviceLock::new();
//!
//!     let mut batch = Batch::new();
//!     batch.push_set("interfaces ge-0/0/1 description \"to core\"");
//!
//!     let outcome = client.configure(&lock, &batch, "describe uplink").await?;
//!     println!("committed with {} warning(s)", outcome.warnings.len());
//!
//!     let dump = client.read(&lock, "interfaces ge-0/0/1").await?;
//!     for line in dump.lines() {
//!         println!("{}", line);
//!     }
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod client;
pub mod error;
pub mod parser;
pub mod resource;
pub mod session;
pub mod transport;

// Re-export main types for convenience
pub use client::{Client, ClientBuilder, ClientConfig, DeviceLock};
pub use error::{Error, Result};
pub use parser::{CommitOutcome, ConfigDump, EMPTY_OUTPUT, Facts};
pub use resource::Resource;
pub use session::{Batch, Session, Transaction};
pub use transport::{AuthMethod, SshConfig, SshTransport, Transport};
