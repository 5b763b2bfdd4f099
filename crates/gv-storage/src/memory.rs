//! In-process burn-on-read store.
//!
//! Behaves like the real service: the first fetch removes the secret, and
//! a fetch after expiry reports `Expired` (then removes it). Useful for
//! tests and offline demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use gv_core::limits;
use gv_core::{EncryptedSecret, StoredSecretHandle};
use tokio::sync::Mutex;
use tracing::debug;

use crate::store::{SecretStore, StoreError};

struct Entry {
    secret: EncryptedSecret,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct MemorySecretStore {
    entries: Mutex<HashMap<String, Entry>>,
    fetches: AtomicUsize,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `fetch` calls served so far, successful or not.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Move a stored secret's expiry, e.g. into the past.
    pub async fn set_expiry(&self, uuid: &str, expires_at: DateTime<Utc>) -> bool {
        match self.entries.lock().await.get_mut(uuid) {
            Some(entry) => {
                entry.expires_at = expires_at;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn create(&self, secret: &EncryptedSecret) -> Result<StoredSecretHandle, StoreError> {
        let hours = secret
            .expires_in_hours
            .ok_or_else(|| StoreError::InvalidResponse("expires_in_hours is required".into()))?;
        if limits::check_ttl(hours).is_err() {
            return Err(StoreError::Server { status: 422 });
        }

        let uuid = uuid::Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::hours(i64::from(hours));

        // Stored form matches what the API serves back: no TTL field
        let mut stored = secret.clone();
        stored.expires_in_hours = None;

        self.entries.lock().await.insert(
            uuid.clone(),
            Entry {
                secret: stored,
                expires_at,
            },
        );
        debug!(uuid = %uuid, files = secret.files.len(), "stored secret");

        Ok(StoredSecretHandle {
            uuid,
            requires_password: secret.requires_password,
            expires_at,
        })
    }

    async fn fetch(&self, uuid: &str) -> Result<EncryptedSecret, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let entry = self
            .entries
            .lock()
            .await
            .remove(uuid)
            .ok_or(StoreError::NotFound)?;

        if entry.expires_at <= Utc::now() {
            debug!(uuid, "fetch after expiry");
            return Err(StoreError::Expired);
        }

        debug!(uuid, "secret burned on read");
        Ok(entry.secret)
    }
}
