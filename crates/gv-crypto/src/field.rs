//! Field Cipher: authenticated string encryption used for every field
//!
//! Ciphertext format (standard base64 of):
//! ```text
//! [1 byte: version = 1]
//! [4 bytes: Argon2id m_cost BE][4 bytes: t_cost BE][4 bytes: p_cost BE]
//! [16 bytes: random salt]
//! [24 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag]
//! AAD = everything before the nonce
//! ```
//!
//! Every call draws a fresh salt and nonce, so encrypting the same text
//! twice never yields the same string. Decryption needs nothing but the
//! ciphertext and the key.
//!
//! Decryption never errors. Malformed input, a wrong key, non-UTF-8 output
//! and an empty plaintext all come back as `None`; wrong passwords are an
//! everyday outcome, not an exceptional one.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use tracing::debug;

use crate::kdf::{derive_field_key, KdfParams};
use crate::keys::SymmetricKey;
use crate::{NONCE_SIZE, SALT_SIZE, TAG_SIZE};

const FORMAT_VERSION: u8 = 1;

/// version + three u32 params + salt
const AAD_SIZE: usize = 1 + 4 * 3 + SALT_SIZE;

const HEADER_SIZE: usize = AAD_SIZE + NONCE_SIZE;

/// Encrypts fields with a fixed set of KDF parameters.
#[derive(Debug, Clone, Default)]
pub struct FieldCipher {
    params: KdfParams,
}

impl FieldCipher {
    pub fn new(params: KdfParams) -> anyhow::Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Encrypt `plaintext` under `key`.
    ///
    /// An empty plaintext yields an empty string: a field that was never
    /// populated must not grow a ciphertext.
    pub fn encrypt(&self, plaintext: &str, key: &SymmetricKey) -> anyhow::Result<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut salt = [0u8; SALT_SIZE];
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        let mut rng = rand::thread_rng();
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut nonce_bytes);

        let field_key = derive_field_key(key, &salt, &self.params)?;
        let cipher = XChaCha20Poly1305::new(field_key.as_bytes().into());

        let aad = build_aad(&self.params, &salt);
        let ciphertext = cipher
            .encrypt(
                XNonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: &aad,
                },
            )
            .map_err(|e| anyhow::anyhow!("field encryption failed: {e}"))?;

        let mut out = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
        out.extend_from_slice(&aad);
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(out))
    }
}

/// Encrypt a field with the default KDF parameters.
pub fn encrypt_field(plaintext: &str, key: &SymmetricKey) -> anyhow::Result<String> {
    FieldCipher::default().encrypt(plaintext, key)
}

/// Decrypt a field. `None` means "nothing usable", whatever the cause.
pub fn decrypt_field(ciphertext: &str, key: &SymmetricKey) -> Option<String> {
    if ciphertext.is_empty() {
        return None;
    }

    match open(ciphertext, key) {
        Ok(plaintext) if plaintext.is_empty() => None,
        Ok(plaintext) => Some(plaintext),
        Err(e) => {
            debug!(error = %e, "field decryption failed");
            None
        }
    }
}

fn open(ciphertext: &str, key: &SymmetricKey) -> anyhow::Result<String> {
    let raw = STANDARD
        .decode(ciphertext.trim())
        .map_err(|e| anyhow::anyhow!("base64 decode: {e}"))?;

    if raw.len() < HEADER_SIZE + TAG_SIZE {
        anyhow::bail!(
            "field ciphertext too short: {} bytes (minimum {})",
            raw.len(),
            HEADER_SIZE + TAG_SIZE
        );
    }
    if raw[0] != FORMAT_VERSION {
        anyhow::bail!("unknown field format version {}", raw[0]);
    }

    let (aad, rest) = raw.split_at(AAD_SIZE);
    let (nonce_bytes, sealed) = rest.split_at(NONCE_SIZE);

    let params = KdfParams {
        mem_cost_kib: read_u32(&aad[1..5]),
        time_cost: read_u32(&aad[5..9]),
        parallelism: read_u32(&aad[9..13]),
    };
    params.validate()?;

    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&aad[13..]);

    let field_key = derive_field_key(key, &salt, &params)?;
    let cipher = XChaCha20Poly1305::new(field_key.as_bytes().into());

    let plaintext = cipher
        .decrypt(
            XNonce::from_slice(nonce_bytes),
            Payload { msg: sealed, aad },
        )
        .map_err(|_| anyhow::anyhow!("field decryption failed: wrong key or corrupted data"))?;

    String::from_utf8(plaintext).map_err(|e| anyhow::anyhow!("decrypted field is not UTF-8: {e}"))
}

fn build_aad(params: &KdfParams, salt: &[u8; SALT_SIZE]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(AAD_SIZE);
    aad.push(FORMAT_VERSION);
    aad.extend_from_slice(&params.mem_cost_kib.to_be_bytes());
    aad.extend_from_slice(&params.time_cost.to_be_bytes());
    aad.extend_from_slice(&params.parallelism.to_be_bytes());
    aad.extend_from_slice(salt);
    aad
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}
