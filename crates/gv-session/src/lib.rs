//! gv-session: the recipient side of a secret link
//!
//! ```text
//! Loading ──fetch error──────────────────────────────▶ Failed
//!    │ ──no password, key in fragment, decrypts──────▶ Revealed
//!    │ ──no password, no fragment / bad key──────────▶ Failed
//!    └──password required──▶ PasswordRequired ──ok──▶ Revealed
//!                               ▲      │
//!                               └──────┘ incorrect password
//! ```
//!
//! One fetch per session, ever. The storage service burns the secret on
//! that fetch, so there is nothing to retry against.

pub mod error;
pub mod reveal;
pub mod session;

pub use error::{ErrorKind, LinkFault};
pub use reveal::{format_size, RevealedFile, RevealedSecret};
pub use session::{FetchTicket, RetrievalSession, SessionState};
