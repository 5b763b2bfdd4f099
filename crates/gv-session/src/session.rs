//! Retrieval state machine: one session per opened link.

use std::sync::atomic::{AtomicU64, Ordering};

use gv_core::{EncryptedSecret, Locator};
use gv_crypto::SymmetricKey;
use gv_storage::{SecretStore, StoreError};
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::error::{ErrorKind, LinkFault};
use crate::reveal::{reveal, RevealedSecret};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting on the single fetch
    Loading,
    /// Ciphertext is held locally; waiting for the recipient's password.
    /// `error` is set after an incorrect attempt.
    PasswordRequired { error: Option<ErrorKind> },
    /// Terminal
    Revealed(RevealedSecret),
    /// Terminal
    Failed(ErrorKind),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::PasswordRequired { .. } => "password_required",
            Self::Revealed(_) => "revealed",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revealed(_) | Self::Failed(_))
    }
}

/// Proof that this session issued its one fetch. Results carried back
/// under another session's ticket are ignored.
#[derive(Debug)]
pub struct FetchTicket {
    session_id: u64,
    uuid: String,
}

impl FetchTicket {
    pub fn uuid(&self) -> &str {
        &self.uuid
    }
}

/// Owns the session state. Nothing else mutates it.
///
/// [`close`](RetrievalSession::close) or dropping the session is teardown:
/// revealed plaintext is wiped, and any fetch still in flight has nowhere
/// to land.
#[derive(Debug)]
pub struct RetrievalSession {
    id: u64,
    locator: Option<Locator>,
    state: SessionState,
    fetch_issued: bool,
    /// Ciphertext kept only while waiting for a password
    pending: Option<EncryptedSecret>,
    closed: bool,
}

impl RetrievalSession {
    pub fn new(locator: Locator) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            locator: Some(locator),
            state: SessionState::Loading,
            fetch_issued: false,
            pending: None,
            closed: false,
        }
    }

    /// Open a session for a share URL. A URL with no secret id fails
    /// immediately and never fetches.
    pub fn from_url(url: &str) -> Self {
        match Locator::parse(url) {
            Ok(locator) => Self::new(locator),
            Err(e) => {
                debug!(error = %e, "unparsable secret link");
                Self {
                    id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
                    locator: None,
                    state: SessionState::Failed(ErrorKind::MalformedLink(LinkFault::MissingId)),
                    fetch_issued: true,
                    pending: None,
                    closed: false,
                }
            }
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn fetch_issued(&self) -> bool {
        self.fetch_issued
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Tear the session down. Revealed plaintext is zeroized in place, held
    /// ciphertext is released, and every later call is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.fetch_issued = true;
        self.pending = None;
        if let SessionState::Revealed(secret) = &mut self.state {
            secret.zeroize();
        }
        debug!(session = self.id, state = self.state.name(), "session closed");
    }

    /// Claim the session's single fetch. Returns `None` on every call
    /// after the first.
    pub fn begin(&mut self) -> Option<FetchTicket> {
        if self.fetch_issued {
            debug!(session = self.id, "fetch already issued; ignoring");
            return None;
        }
        self.fetch_issued = true;

        let uuid = self.locator.as_ref()?.uuid.clone();
        info!(session = self.id, uuid = %uuid, "fetching secret");
        Some(FetchTicket {
            session_id: self.id,
            uuid,
        })
    }

    /// Apply the outcome of the fetch issued by [`begin`](Self::begin).
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<EncryptedSecret, StoreError>,
    ) -> &SessionState {
        if self.closed || ticket.session_id != self.id || self.state != SessionState::Loading {
            debug!(
                session = self.id,
                ticket_session = ticket.session_id,
                state = self.state.name(),
                "ignoring stale fetch result"
            );
            return &self.state;
        }

        let secret = match result {
            Ok(secret) => secret,
            Err(e) => {
                let kind = ErrorKind::from(&e);
                if kind.suggests_retry() {
                    warn!(session = self.id, error = %e, "secret fetch failed");
                } else {
                    info!(session = self.id, error = %e, "secret unavailable");
                }
                return self.transition(SessionState::Failed(kind));
            }
        };

        if secret.requires_password {
            self.pending = Some(secret);
            return self.transition(SessionState::PasswordRequired { error: None });
        }

        let fragment = self.locator.as_ref().and_then(|l| l.fragment.as_deref());
        let next = match fragment {
            None => SessionState::Failed(ErrorKind::MalformedLink(LinkFault::MissingKey)),
            Some(fragment) => match reveal(&secret, &SymmetricKey::from_fragment(fragment)) {
                Some(revealed) => SessionState::Revealed(revealed),
                None => SessionState::Failed(ErrorKind::MalformedLink(LinkFault::BadKey)),
            },
        };
        self.transition(next)
    }

    /// Issue the fetch (at most once per session) and apply its result.
    ///
    /// If this future is dropped before the fetch resolves, the session
    /// stays in `Loading` for good; the fetch is never reissued.
    pub async fn start<S>(&mut self, store: &S) -> &SessionState
    where
        S: SecretStore + ?Sized,
    {
        match self.begin() {
            Some(ticket) => {
                let result = store.fetch(ticket.uuid()).await;
                self.complete(ticket, result)
            }
            None => &self.state,
        }
    }

    /// Try a password. Only meaningful in `PasswordRequired`; a wrong
    /// password keeps the session there with a local error, as many times
    /// as the recipient likes.
    pub fn submit_password(&mut self, password: &str) -> &SessionState {
        if self.closed || !matches!(self.state, SessionState::PasswordRequired { .. }) {
            debug!(
                session = self.id,
                state = self.state.name(),
                "password submitted outside the prompt; ignoring"
            );
            return &self.state;
        }

        let revealed = match (&self.pending, password.is_empty()) {
            (Some(secret), false) => reveal(secret, &SymmetricKey::password_attempt(password)),
            _ => None,
        };

        match revealed {
            Some(revealed) => {
                self.pending = None;
                self.transition(SessionState::Revealed(revealed))
            }
            None => {
                debug!(session = self.id, "incorrect password");
                self.state = SessionState::PasswordRequired {
                    error: Some(ErrorKind::IncorrectPassword),
                };
                &self.state
            }
        }
    }

    fn transition(&mut self, next: SessionState) -> &SessionState {
        info!(
            session = self.id,
            from = self.state.name(),
            to = next.name(),
            "session transition"
        );
        self.state = next;
        &self.state
    }
}
