use gv_storage::StoreError;
use thiserror::Error;

/// What is wrong with a link that can never be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFault {
    /// No secret id in the address
    MissingId,
    /// No key in the fragment of a link that needs one
    MissingKey,
    /// The fragment key does not open the secret
    BadKey,
}

/// Every error a retrieval session can surface. Presentation text is
/// derived from the kind via [`ErrorKind::user_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("storage service unreachable")]
    Transport,

    #[error("secret not found or already viewed")]
    NotFound,

    #[error("secret expired")]
    Expired,

    #[error("storage service error")]
    Server,

    /// A bad key on the link path is indistinguishable from a bad link
    #[error("malformed link ({0:?})")]
    MalformedLink(LinkFault),

    /// Local to the password prompt; never terminal
    #[error("incorrect password")]
    IncorrectPassword,
}

impl ErrorKind {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Transport => {
                "Could not reach the server. Check your connection and try again."
            }
            Self::NotFound => "Secret not found. It may have already been viewed and burned.",
            Self::Expired => "This secret has expired and is no longer available.",
            Self::Server => "Server error. Please try again later.",
            Self::MalformedLink(LinkFault::MissingId) => "Invalid link: missing secret id.",
            Self::MalformedLink(LinkFault::MissingKey) => {
                "Missing encryption key in the link. Ask the sender for the full link."
            }
            Self::MalformedLink(LinkFault::BadKey) => {
                "Decryption failed. The key in the link is invalid or broken."
            }
            Self::IncorrectPassword => "Incorrect password. Please try again.",
        }
    }

    /// Worth suggesting a manual retry. Nothing is retried automatically.
    pub fn suggests_retry(&self) -> bool {
        matches!(self, Self::Transport | Self::Server)
    }
}

impl From<&StoreError> for ErrorKind {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::Expired => Self::Expired,
            StoreError::Transport(_) => Self::Transport,
            StoreError::Server { .. } | StoreError::InvalidResponse(_) => Self::Server,
        }
    }
}
