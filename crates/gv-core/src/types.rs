use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// An attachment as picked by the sender, before encryption
#[derive(Clone, PartialEq, Eq)]
pub struct PlainFile {
    pub name: String,
    /// MIME type; empty means unknown
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl PlainFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }
}

impl std::fmt::Debug for PlainFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlainFile")
            .field("name", &"[REDACTED]")
            .field("mime", &self.mime)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// The sender's plaintext: a message plus up to three attachments
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PlainSecret {
    pub message: String,
    /// Order is significant: it is the only link between an encrypted
    /// name and its encrypted content on the wire.
    pub attachments: Vec<PlainFile>,
}

impl PlainSecret {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, file: PlainFile) -> Self {
        self.attachments.push(file);
        self
    }
}

impl std::fmt::Debug for PlainSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlainSecret")
            .field("message", &"[REDACTED]")
            .field("attachments", &self.attachments)
            .finish()
    }
}

/// One attachment on the wire: both fields are Field Cipher output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedFile {
    pub encrypted_name: String,
    /// Ciphertext of the attachment's base64 data URI
    pub file_data: String,
}

/// Wire form of a secret. Only ciphertext and routing metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedSecret {
    /// Integrity-tagged ciphertext of the message
    pub content: String,
    pub requires_password: bool,
    /// Requested lifetime; sent on create, absent from fetch responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_hours: Option<u32>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<EncryptedFile>,
}

/// Returned by the storage service on create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSecretHandle {
    pub uuid: String,
    pub requires_password: bool,
    pub expires_at: DateTime<Utc>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
