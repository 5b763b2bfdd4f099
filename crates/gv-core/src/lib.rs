pub mod config;
pub mod error;
pub mod limits;
pub mod locator;
pub mod types;

pub use error::{GvError, GvResult, LimitError};
pub use locator::Locator;
pub use types::{EncryptedFile, EncryptedSecret, PlainFile, PlainSecret, StoredSecretHandle};
