//! Key derivation: symmetric key string + per-field salt → field key (Argon2id)

use argon2::{Algorithm, Argon2, Params, Version};
use gv_core::config::CryptoConfig;
use zeroize::Zeroize;

use crate::keys::SymmetricKey;
use crate::{KEY_SIZE, SALT_SIZE};

/// A 256-bit AEAD key derived for exactly one field.
///
/// Zeroized on drop to prevent secrets lingering in memory.
pub struct FieldKey {
    bytes: [u8; KEY_SIZE],
}

impl FieldKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for FieldKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Argon2id parameters for KDF
///
/// These travel in every ciphertext header, so a reader never needs to
/// know what the writer was configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl KdfParams {
    /// Ceilings accepted from a ciphertext header. Anything above is
    /// treated as a corrupt or hostile header. A secret carries at most
    /// seven fields, so these bound the work a forged payload can demand.
    pub const MAX_MEM_COST_KIB: u32 = 256 * 1024;
    pub const MAX_TIME_COST: u32 = 8;
    pub const MAX_PARALLELISM: u32 = 8;

    pub fn from_config(config: &CryptoConfig) -> Self {
        Self {
            mem_cost_kib: config.argon2_mem_cost_kib,
            time_cost: config.argon2_time_cost,
            parallelism: config.argon2_parallelism,
        }
    }

    /// Check against Argon2's own minimums and our ceilings.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.mem_cost_kib > Self::MAX_MEM_COST_KIB
            || self.time_cost > Self::MAX_TIME_COST
            || self.parallelism > Self::MAX_PARALLELISM
        {
            anyhow::bail!(
                "Argon2id params above ceiling: m={} t={} p={}",
                self.mem_cost_kib,
                self.time_cost,
                self.parallelism
            );
        }
        self.to_argon2().map(|_| ())
    }

    fn to_argon2(self) -> anyhow::Result<Params> {
        Params::new(
            self.mem_cost_kib,
            self.time_cost,
            self.parallelism,
            Some(KEY_SIZE),
        )
        .map_err(|e| anyhow::anyhow!("invalid Argon2id params: {e}"))
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

/// Derive a 256-bit field key from the symmetric key and salt using Argon2id.
///
/// The salt is 16 random bytes drawn per field and stored in the ciphertext
/// header (it does not need to be secret).
pub fn derive_field_key(
    key: &SymmetricKey,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> anyhow::Result<FieldKey> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2()?);

    let mut out = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(key.expose().as_bytes(), salt, &mut out)
        .map_err(|e| anyhow::anyhow!("Argon2id KDF failed: {e}"))?;

    Ok(FieldKey::from_bytes(out))
}
