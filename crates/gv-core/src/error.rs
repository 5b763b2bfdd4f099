use thiserror::Error;

pub type GvResult<T> = Result<T, GvError>;

#[derive(Debug, Error)]
pub enum GvError {
    #[error("secret rejected: {0}")]
    Limit(#[from] LimitError),

    #[error("malformed link: {0}")]
    MalformedLink(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Boundary contract violations. These are caller errors, never clamped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitError {
    #[error("message is {len} characters (maximum {max})")]
    MessageTooLong { len: usize, max: usize },

    #[error("{count} attachments (maximum {max})")]
    TooManyAttachments { count: usize, max: usize },

    #[error("attachment {name:?} is {size} bytes (maximum {max})")]
    AttachmentTooLarge { name: String, size: usize, max: usize },

    #[error("expiry of {hours}h is outside {min}..={max}")]
    TtlOutOfRange { hours: u32, min: u32, max: u32 },

    #[error("password is {len} characters (minimum {min})")]
    PasswordTooShort { len: usize, min: usize },

    #[error("secret has neither a message nor attachments")]
    EmptySecret,

    #[error("requires_password={requires_password} does not match the key's origin")]
    KeyModeMismatch { requires_password: bool },
}
