//! SSH algorithm preferences for older device firmware.
//!
//! Junos releases still deployed in the field only speak a subset of the
//! ciphers russh prefers by default. The allow-list below is appended to the
//! russh defaults so modern devices keep negotiating the default order while
//! older ones find a cipher they support, including one legacy CBC mode.

use std::borrow::Cow;

use russh::{Preferred, cipher};

/// Ciphers appended to the russh defaults, in order.
pub const COMPAT_CIPHERS: &[cipher::Name] = &[
    // AEAD
    cipher::CHACHA20_POLY1305,
    cipher::AES_256_GCM,
    // CTR
    cipher::AES_128_CTR,
    cipher::AES_192_CTR,
    cipher::AES_256_CTR,
    // legacy CBC
    cipher::AES_128_CBC,
];

/// Build the algorithm preferences used for every device connection.
pub fn preferred() -> Preferred {
    let defaults = Preferred::default();

    let mut ciphers: Vec<cipher::Name> = defaults.cipher.to_vec();
    for name in COMPAT_CIPHERS {
        if !ciphers.contains(name) {
            ciphers.push(*name);
        }
    }

    Preferred {
        cipher: Cow::Owned(ciphers),
        ..defaults
    }
}
