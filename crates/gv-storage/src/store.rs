use async_trait::async_trait;
use gv_core::{EncryptedSecret, StoredSecretHandle};
use thiserror::Error;

/// Failures reported by the storage service or the path to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Unknown uuid, or already burned by an earlier read
    #[error("secret not found")]
    NotFound,

    #[error("secret expired")]
    Expired,

    #[error("storage service returned HTTP {status}")]
    Server { status: u16 },

    /// Unreachable, refused, or timed out
    #[error("storage service unreachable: {0}")]
    Transport(String),

    #[error("unexpected response from storage service: {0}")]
    InvalidResponse(String),
}

/// Create/fetch contract of the storage service.
///
/// `create` is not idempotent: every call stores a new secret.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn create(&self, secret: &EncryptedSecret) -> Result<StoredSecretHandle, StoreError>;

    /// Retrieve (and, server-side, burn) a secret.
    async fn fetch(&self, uuid: &str) -> Result<EncryptedSecret, StoreError>;
}

#[async_trait]
impl<T: SecretStore + ?Sized> SecretStore for std::sync::Arc<T> {
    async fn create(&self, secret: &EncryptedSecret) -> Result<StoredSecretHandle, StoreError> {
        (**self).create(secret).await
    }

    async fn fetch(&self, uuid: &str) -> Result<EncryptedSecret, StoreError> {
        (**self).fetch(uuid).await
    }
}

/// Identifiers are interpolated into request paths; keep them to
/// uuid-ish characters.
pub(crate) fn is_valid_uuid(uuid: &str) -> bool {
    !uuid.is_empty()
        && uuid.len() <= 64
        && uuid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
