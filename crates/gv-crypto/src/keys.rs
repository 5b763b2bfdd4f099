//! Symmetric keys: generated link keys and user passwords

use gv_core::limits;
use gv_core::LimitError;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};

/// Length of a generated key when the sender does not pick a password.
pub const DEFAULT_KEY_LENGTH: usize = 16;

/// Characters a generated key is drawn from (68 symbols).
///
/// `%` is left out so the key can sit in a URL fragment without ever
/// looking like a percent-escape.
pub const KEY_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@$^&*";

/// Where a key came from, which decides how it travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    /// Random key carried in the link fragment
    Generated,
    /// Human-chosen password, never transmitted
    Password,
}

/// The single secret that locks every field of a secret.
///
/// Never persisted and never sent to the storage service.
pub struct SymmetricKey {
    secret: SecretString,
    origin: KeyOrigin,
}

impl SymmetricKey {
    /// A sender-chosen password. Enforces the minimum length.
    pub fn password(password: impl Into<String>) -> Result<Self, LimitError> {
        let password = password.into();
        limits::check_password(&password)?;
        Ok(Self {
            secret: SecretString::from(password),
            origin: KeyOrigin::Password,
        })
    }

    /// A recipient's password guess. No length check: an old or short
    /// guess simply fails to decrypt.
    pub fn password_attempt(guess: &str) -> Self {
        Self {
            secret: SecretString::from(guess.to_string()),
            origin: KeyOrigin::Password,
        }
    }

    /// The key as read back from a link fragment.
    pub fn from_fragment(fragment: &str) -> Self {
        Self {
            secret: SecretString::from(fragment.to_string()),
            origin: KeyOrigin::Generated,
        }
    }

    pub fn origin(&self) -> KeyOrigin {
        self.origin
    }

    /// Password keys must be re-entered by the recipient.
    pub fn requires_password(&self) -> bool {
        self.origin == KeyOrigin::Password
    }

    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl Clone for SymmetricKey {
    fn clone(&self) -> Self {
        Self {
            secret: SecretString::from(self.expose().to_string()),
            origin: self.origin,
        }
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("origin", &self.origin)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random key of `length` characters from [`KEY_ALPHABET`].
///
/// Uses the thread-local CSPRNG (ChaCha, seeded from the OS).
pub fn generate_key(length: usize) -> SymmetricKey {
    let mut rng = rand::thread_rng();
    let key: String = (0..length)
        .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
        .collect();

    SymmetricKey {
        secret: SecretString::from(key),
        origin: KeyOrigin::Generated,
    }
}
