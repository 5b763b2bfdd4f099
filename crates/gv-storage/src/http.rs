//! reqwest client for the secrets API
//!
//! Endpoints:
//!   POST /api/v1/secrets          store an EncryptedSecret, returns a handle
//!   GET  /api/v1/secrets/{uuid}   fetch (and burn) a secret

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use gv_core::{EncryptedSecret, StoredSecretHandle};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::store::{is_valid_uuid, SecretStore, StoreError};

const SECRETS_PATH: &str = "/api/v1/secrets";

/// Minimal config needed to build a client
/// (full config lives in gv-core's ApiConfig)
#[derive(Clone)]
pub struct HttpStoreConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for HttpStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStoreConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Storage service over HTTP. Cheap to clone; immutable once built.
#[derive(Debug, Clone)]
pub struct HttpSecretStore {
    client: Client,
    base_url: String,
}

impl HttpSecretStore {
    pub fn new(cfg: &HttpStoreConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !cfg.api_key.is_empty() {
            let mut key =
                HeaderValue::from_str(&cfg.api_key).context("API key is not a valid header value")?;
            key.set_sensitive(true);
            headers.insert(HeaderName::from_static("x-api-key"), key);
        }

        let client = Client::builder()
            .timeout(cfg.timeout)
            .default_headers(headers)
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn secrets_url(&self) -> String {
        format!("{}{SECRETS_PATH}", self.base_url)
    }

    fn secret_url(&self, uuid: &str) -> String {
        format!("{}{SECRETS_PATH}/{uuid}", self.base_url)
    }
}

#[async_trait]
impl SecretStore for HttpSecretStore {
    async fn create(&self, secret: &EncryptedSecret) -> Result<StoredSecretHandle, StoreError> {
        let response = self
            .client
            .post(self.secrets_url())
            .json(secret)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if let Some(err) = classify_status(status) {
            debug!(status = status.as_u16(), "create rejected");
            return Err(err);
        }

        response
            .json::<StoredSecretHandle>()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }

    async fn fetch(&self, uuid: &str) -> Result<EncryptedSecret, StoreError> {
        if !is_valid_uuid(uuid) {
            return Err(StoreError::NotFound);
        }

        let response = self
            .client
            .get(self.secret_url(uuid))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if let Some(err) = classify_status(status) {
            debug!(uuid, status = status.as_u16(), "fetch rejected");
            return Err(err);
        }

        response
            .json::<EncryptedSecret>()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }
}

/// Map a response status onto the error taxonomy; `None` for success.
pub fn classify_status(status: StatusCode) -> Option<StoreError> {
    match status {
        s if s.is_success() => None,
        StatusCode::NOT_FOUND => Some(StoreError::NotFound),
        StatusCode::GONE => Some(StoreError::Expired),
        s => Some(StoreError::Server { status: s.as_u16() }),
    }
}

fn transport_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Transport("request timed out".into())
    } else {
        StoreError::Transport(e.to_string())
    }
}

/// Build a client from gv-core config.
///
/// If `enforce_tls` is true and the base URL uses HTTP, this returns an error.
/// Otherwise, a warning is logged for non-HTTPS endpoints.
pub fn build_from_core_config(api: &gv_core::config::ApiConfig) -> Result<HttpSecretStore> {
    if api.base_url.starts_with("http://") {
        if api.enforce_tls {
            anyhow::bail!(
                "secrets API uses plaintext HTTP ({}), but enforce_tls is enabled. \
                 Use an HTTPS endpoint or set api.enforce_tls = false for local development.",
                api.base_url
            );
        }
        warn!(
            base_url = %api.base_url,
            "secrets API uses plaintext HTTP; the API key and ciphertext travel unencrypted. \
             Set api.enforce_tls = true and use HTTPS in production."
        );
    }

    HttpSecretStore::new(&HttpStoreConfig {
        base_url: api.base_url.clone(),
        api_key: api.api_key.clone(),
        timeout: Duration::from_secs(api.timeout_secs),
    })
}
