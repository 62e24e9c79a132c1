//! Channel layer for NETCONF message framing.
//!
//! This module turns the raw byte stream of the `netconf` SSH subsystem
//! into discrete messages.

mod buffer;

pub use buffer::{END_OF_MESSAGE, FrameBuffer};
