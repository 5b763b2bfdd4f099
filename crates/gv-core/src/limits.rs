//! Constraints enforced where plaintext enters the system.
//!
//! The UI may clamp raw input for convenience; everything past that point
//! rejects out-of-range values with a [`LimitError`].

use crate::error::LimitError;

/// Maximum message length, in characters (Unicode scalar values).
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Maximum number of attachments per secret.
pub const MAX_ATTACHMENTS: usize = 3;

/// Maximum raw size of a single attachment (10 MiB).
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

pub const MIN_TTL_HOURS: u32 = 1;
pub const MAX_TTL_HOURS: u32 = 168;

/// Minimum length of a user-chosen password.
pub const MIN_PASSWORD_CHARS: usize = 6;

pub fn check_message(message: &str) -> Result<(), LimitError> {
    let len = message.chars().count();
    if len > MAX_MESSAGE_CHARS {
        return Err(LimitError::MessageTooLong {
            len,
            max: MAX_MESSAGE_CHARS,
        });
    }
    Ok(())
}

pub fn check_attachment_count(count: usize) -> Result<(), LimitError> {
    if count > MAX_ATTACHMENTS {
        return Err(LimitError::TooManyAttachments {
            count,
            max: MAX_ATTACHMENTS,
        });
    }
    Ok(())
}

pub fn check_attachment_size(name: &str, size: usize) -> Result<(), LimitError> {
    if size > MAX_ATTACHMENT_BYTES {
        return Err(LimitError::AttachmentTooLarge {
            name: name.to_string(),
            size,
            max: MAX_ATTACHMENT_BYTES,
        });
    }
    Ok(())
}

pub fn check_ttl(hours: u32) -> Result<(), LimitError> {
    if !(MIN_TTL_HOURS..=MAX_TTL_HOURS).contains(&hours) {
        return Err(LimitError::TtlOutOfRange {
            hours,
            min: MIN_TTL_HOURS,
            max: MAX_TTL_HOURS,
        });
    }
    Ok(())
}

pub fn check_password(password: &str) -> Result<(), LimitError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_CHARS {
        return Err(LimitError::PasswordTooShort {
            len,
            min: MIN_PASSWORD_CHARS,
        });
    }
    Ok(())
}
