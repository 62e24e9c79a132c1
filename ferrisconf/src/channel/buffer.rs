//! Message buffer for NETCONF 1.0 end-of-message framing.
//!
//! Every message on a NETCONF 1.0 channel is terminated by `]]>]]>`. Data
//! arrives from the SSH channel in arbitrary chunks, so a delimiter may be
//! split across reads and one read may carry several messages.
//!
//! Only the bytes that arrived since the last search (plus a delimiter-sized
//! overlap) are scanned, so large configuration dumps are not rescanned from
//! the start on every chunk.

use bytes::{Buf, BytesMut};
use memchr::memmem;

/// NETCONF 1.0 end-of-message marker.
pub const END_OF_MESSAGE: &[u8] = b"]]>]]>";

/// Buffer for accumulating channel output and splitting it into messages.
#[derive(Debug)]
pub struct FrameBuffer {
    /// The accumulated, not yet framed bytes.
    buffer: BytesMut,

    /// Offset up to which the buffer is known not to contain a delimiter.
    searched: usize,
}

impl FrameBuffer {
    /// Create an empty frame buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
            searched: 0,
        }
    }

    /// Extend the buffer with new channel data.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete message, without its delimiter.
    ///
    /// Returns `None` until a full delimiter has been received.
    pub fn next_message(&mut self) -> Option<Vec<u8>> {
        // back up far enough to catch a delimiter split across chunks
        let start = self.searched.saturating_sub(END_OF_MESSAGE.len() - 1);

        match memmem::find(&self.buffer[start..], END_OF_MESSAGE) {
            Some(pos) => {
                let end = start + pos;
                let message = self.buffer.split_to(end).to_vec();
                self.buffer.advance(END_OF_MESSAGE.len());
                self.searched = 0;
                Some(message)
            }
            None => {
                self.searched = self.buffer.len();
                None
            }
        }
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discard everything buffered.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.searched = 0;
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
