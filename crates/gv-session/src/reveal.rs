//! Decrypting a fetched secret into what the recipient sees.

use gv_core::limits::MAX_ATTACHMENTS;
use gv_core::EncryptedSecret;
use gv_crypto::{decode_data_uri, decode_message, decrypt_field, SymmetricKey};
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// A decrypted attachment. Wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct RevealedFile {
    name: String,
    mime: String,
    bytes: Vec<u8>,
}

impl RevealedFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// e.g. "12.3 KB" or "1.20 MB"
    pub fn display_size(&self) -> String {
        format_size(self.size())
    }
}

impl std::fmt::Debug for RevealedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealedFile")
            .field("name", &"[REDACTED]")
            .field("mime", &self.mime)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// The terminal payload of a successful session. Wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct RevealedSecret {
    message: String,
    files: Vec<RevealedFile>,
}

impl RevealedSecret {
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Surviving attachments, in their original order.
    pub fn files(&self) -> &[RevealedFile] {
        &self.files
    }
}

impl std::fmt::Debug for RevealedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealedSecret")
            .field("message", &"[REDACTED]")
            .field("files", &self.files)
            .finish()
    }
}

/// Decrypt `secret` under `key`.
///
/// `None` only when the message fails its integrity check: that is the
/// authoritative wrong-key signal. Attachments whose name or content do
/// not decrypt are dropped one by one without affecting the rest.
///
/// Only the first [`MAX_ATTACHMENTS`] entries are decrypted; no sender can
/// produce more, so any extra entries did not come from one.
pub fn reveal(secret: &EncryptedSecret, key: &SymmetricKey) -> Option<RevealedSecret> {
    let message = decode_message(&secret.content, key)?;

    if secret.files.len() > MAX_ATTACHMENTS {
        warn!(
            count = secret.files.len(),
            max = MAX_ATTACHMENTS,
            "fetched secret lists too many attachments; ignoring the excess"
        );
    }

    let files = secret
        .files
        .iter()
        .take(MAX_ATTACHMENTS)
        .enumerate()
        .filter_map(|(index, file)| {
            let name = decrypt_field(&file.encrypted_name, key);
            let content = decrypt_field(&file.file_data, key).map(Zeroizing::new);
            let data = content.as_deref().and_then(|c| decode_data_uri(c));

            match (name, data) {
                (Some(name), Some(mut data)) => Some(RevealedFile {
                    name,
                    mime: std::mem::take(&mut data.mime),
                    bytes: std::mem::take(&mut data.bytes),
                }),
                (name, _) => {
                    debug!(index, name_ok = name.is_some(), "dropping undecryptable attachment");
                    None
                }
            }
        })
        .collect();

    Some(RevealedSecret { message, files })
}

/// Human-readable size, KB below one MiB and MB above.
pub fn format_size(bytes: usize) -> String {
    let kb = bytes as f64 / 1024.0;
    if kb > 1024.0 {
        format!("{:.2} MB", kb / 1024.0)
    } else {
        format!("{kb:.1} KB")
    }
}
