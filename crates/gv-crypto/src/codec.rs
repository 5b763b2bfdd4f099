//! Integrity-tagged message codec
//!
//! The message body is encrypted as `message || INTEGRITY_MARKER`. On decode
//! the marker must be present at the very end; if it is not, the key was
//! wrong even when the cipher layer happened to hand back valid UTF-8.
//! This is the signal the retrieval session relies on to tell a wrong key
//! from a good one.
//!
//! Because the marker is always appended, an empty message still produces a
//! non-empty ciphertext and decodes to `Some("")`.

use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use crate::field::{decrypt_field, FieldCipher};
use crate::keys::SymmetricKey;

/// Fixed, public suffix. Structural check only; it is not a secret.
pub const INTEGRITY_MARKER: &str = "::ghostvault:integrity:v1";

/// Encrypt a message with its integrity marker.
pub fn encode_message(
    cipher: &FieldCipher,
    message: &str,
    key: &SymmetricKey,
) -> anyhow::Result<String> {
    let mut tagged = Zeroizing::new(String::with_capacity(
        message.len() + INTEGRITY_MARKER.len(),
    ));
    tagged.push_str(message);
    tagged.push_str(INTEGRITY_MARKER);
    cipher.encrypt(&tagged, key)
}

/// Decrypt a message and verify its integrity marker.
pub fn decode_message(ciphertext: &str, key: &SymmetricKey) -> Option<String> {
    let mut plaintext = decrypt_field(ciphertext, key)?;

    match plaintext.strip_suffix(INTEGRITY_MARKER).map(str::len) {
        Some(len) => {
            plaintext.truncate(len);
            Some(plaintext)
        }
        None => {
            debug!("message decrypted without integrity marker");
            plaintext.zeroize();
            None
        }
    }
}
