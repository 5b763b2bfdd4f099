//! Secret assembly: plaintext secret + key → wire payload
//!
//! Pure: no I/O. The result goes to the storage service's create call,
//! and the key never leaves this process.

use gv_core::limits;
use gv_core::{EncryptedFile, EncryptedSecret, GvResult, LimitError, PlainSecret};
use tracing::debug;
use zeroize::Zeroizing;

use crate::codec::encode_message;
use crate::datauri::encode_data_uri;
use crate::field::FieldCipher;
use crate::keys::SymmetricKey;

/// Builds [`EncryptedSecret`]s with a fixed [`FieldCipher`].
#[derive(Debug, Clone, Default)]
pub struct SecretAssembler {
    cipher: FieldCipher,
}

impl SecretAssembler {
    pub fn new(cipher: FieldCipher) -> Self {
        Self { cipher }
    }

    /// Validate and encrypt `secret`.
    ///
    /// Out-of-range input is a [`LimitError`]; nothing is clamped here.
    /// Attachment order is preserved: position is the only thing tying an
    /// encrypted name to its encrypted content.
    pub fn build(
        &self,
        secret: &PlainSecret,
        key: &SymmetricKey,
        requires_password: bool,
        ttl_hours: u32,
    ) -> GvResult<EncryptedSecret> {
        check(secret, key, requires_password, ttl_hours)?;

        let content = encode_message(&self.cipher, &secret.message, key)?;

        let mut files = Vec::with_capacity(secret.attachments.len());
        for file in &secret.attachments {
            let data_uri = Zeroizing::new(encode_data_uri(&file.mime, &file.bytes));
            files.push(EncryptedFile {
                encrypted_name: self.cipher.encrypt(&file.name, key)?,
                file_data: self.cipher.encrypt(&data_uri, key)?,
            });
        }

        debug!(
            files = files.len(),
            requires_password, ttl_hours, "assembled secret payload"
        );

        Ok(EncryptedSecret {
            content,
            requires_password,
            expires_in_hours: Some(ttl_hours),
            files,
        })
    }
}

/// Assemble a payload with the default KDF parameters.
pub fn build_payload(
    secret: &PlainSecret,
    key: &SymmetricKey,
    requires_password: bool,
    ttl_hours: u32,
) -> GvResult<EncryptedSecret> {
    SecretAssembler::default().build(secret, key, requires_password, ttl_hours)
}

fn check(
    secret: &PlainSecret,
    key: &SymmetricKey,
    requires_password: bool,
    ttl_hours: u32,
) -> Result<(), LimitError> {
    limits::check_ttl(ttl_hours)?;
    limits::check_message(&secret.message)?;
    limits::check_attachment_count(secret.attachments.len())?;
    for file in &secret.attachments {
        limits::check_attachment_size(&file.name, file.bytes.len())?;
    }

    if secret.message.is_empty() && secret.attachments.is_empty() {
        return Err(LimitError::EmptySecret);
    }

    // A password in the link fragment, or a link key nobody will ever see
    if key.requires_password() != requires_password {
        return Err(LimitError::KeyModeMismatch { requires_password });
    }
    if requires_password {
        limits::check_password(key.expose())?;
    }
    Ok(())
}
