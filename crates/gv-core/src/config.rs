use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GvError, GvResult};
use crate::limits::{MAX_TTL_HOURS, MIN_TTL_HOURS};

/// Top-level client configuration (loaded from ghostvault.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GvConfig {
    pub api: ApiConfig,
    pub share: ShareConfig,
    pub crypto: CryptoConfig,
    pub log: LogConfig,
}

impl GvConfig {
    /// Load from a TOML file, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> GvResult<Self> {
        match Self::read(path)? {
            Some(config) => Ok(config),
            None => {
                tracing::warn!(
                    "config file not found: {}  (using defaults)",
                    path.display()
                );
                Ok(Self::default())
            }
        }
    }

    /// Read and validate a TOML file. `None` when the file does not exist;
    /// nothing is logged, so this is safe to call before a subscriber is up.
    pub fn read(path: &Path) -> GvResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| GvError::Config(format!("parsing {}: {e}", path.display())))?;
        config.validate()?;
        Ok(Some(config))
    }

    pub fn validate(&self) -> GvResult<()> {
        if self.api.timeout_secs == 0 {
            return Err(GvError::Config("api.timeout_secs must be positive".into()));
        }
        if !(MIN_TTL_HOURS..=MAX_TTL_HOURS).contains(&self.share.default_ttl_hours) {
            return Err(GvError::Config(format!(
                "share.default_ttl_hours must be within {MIN_TTL_HOURS}..={MAX_TTL_HOURS}"
            )));
        }
        Ok(())
    }
}

/// Storage service client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base address of the secrets API (default: http://localhost:8000)
    pub base_url: String,
    /// Static API credential sent as `X-API-KEY`
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Refuse plaintext HTTP endpoints
    pub enforce_tls: bool,
}

/// How share links are rendered
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Public origin of the reveal page, used as the link prefix
    pub public_url: String,
    /// Expiry used when `create` is not given `--ttl` (default: 24)
    pub default_ttl_hours: u32,
}

/// Field Cipher key derivation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB)
    pub argon2_mem_cost_kib: u32,
    /// Argon2id time cost (iterations, default: 3)
    pub argon2_time_cost: u32,
    /// Argon2id parallelism (default: 4)
    pub argon2_parallelism: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            api_key: String::new(),
            timeout_secs: 30,
            enforce_tls: false,
        }
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            public_url: "http://localhost:5173".into(),
            default_ttl_hours: 24,
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            argon2_mem_cost_kib: 65536,
            argon2_time_cost: 3,
            argon2_parallelism: 4,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}
