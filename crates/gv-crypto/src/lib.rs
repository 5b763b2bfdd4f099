//! gv-crypto: Client-side encryption for GhostVault
//!
//! Nothing in here talks to the network. The storage service only ever sees
//! the output of [`build_payload`].
//!
//! Layering:
//! ```text
//! SymmetricKey (generated 16-char key, or user password)
//!   └── Field Cipher: Argon2id(key, random salt) → XChaCha20-Poly1305, random nonce
//!         ├── Message Codec: message || INTEGRITY_MARKER  (wrong-key detector)
//!         ├── file name
//!         └── file content as base64 data URI
//! ```

pub mod codec;
pub mod datauri;
pub mod field;
pub mod kdf;
pub mod keys;
pub mod payload;

pub use codec::{decode_message, encode_message, INTEGRITY_MARKER};
pub use datauri::{decode_data_uri, encode_data_uri, DataUri};
pub use field::{decrypt_field, encrypt_field, FieldCipher};
pub use kdf::{derive_field_key, FieldKey, KdfParams};
pub use keys::{generate_key, KeyOrigin, SymmetricKey, DEFAULT_KEY_LENGTH, KEY_ALPHABET};
pub use payload::{build_payload, SecretAssembler};

/// Size of a derived field key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of the per-field Argon2id salt
pub const SALT_SIZE: usize = 16;
