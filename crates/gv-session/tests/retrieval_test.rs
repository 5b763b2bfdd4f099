//! End-to-end retrieval: assemble → store → share link → session → reveal.
//!
//! Uses the in-memory burn-on-read store, plus small mock stores for
//! call counting and transport failures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gv_core::{EncryptedSecret, Locator, PlainFile, PlainSecret, StoredSecretHandle};
use gv_crypto::{generate_key, FieldCipher, KdfParams, SecretAssembler, SymmetricKey};
use gv_session::{ErrorKind, LinkFault, RetrievalSession, SessionState};
use gv_storage::{MemorySecretStore, SecretStore, StoreError};

const PUBLIC_URL: &str = "https://ghostvault.app";

fn assembler() -> SecretAssembler {
    SecretAssembler::new(
        FieldCipher::new(KdfParams {
            mem_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        })
        .expect("test params"),
    )
}

/// Store `secret` and return its share URL.
async fn share(
    store: &MemorySecretStore,
    secret: &PlainSecret,
    key: &SymmetricKey,
    ttl_hours: u32,
) -> (StoredSecretHandle, String) {
    let payload = assembler()
        .build(secret, key, key.requires_password(), ttl_hours)
        .expect("assemble");
    let handle = store.create(&payload).await.expect("create");
    let url = Locator::for_handle(&handle, key.expose()).to_url(PUBLIC_URL);
    (handle, url)
}

fn revealed(state: &SessionState) -> &gv_session::RevealedSecret {
    match state {
        SessionState::Revealed(secret) => secret,
        other => panic!("expected Revealed, got {other:?}"),
    }
}

/// Counts fetches and delegates to an inner store.
struct CountingStore<S> {
    inner: S,
    fetches: AtomicUsize,
}

#[async_trait]
impl<S: SecretStore> SecretStore for CountingStore<S> {
    async fn create(&self, secret: &EncryptedSecret) -> Result<StoredSecretHandle, StoreError> {
        self.inner.create(secret).await
    }

    async fn fetch(&self, uuid: &str) -> Result<EncryptedSecret, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(uuid).await
    }
}

/// A service that never answers.
struct HangingStore {
    fetches: AtomicUsize,
}

#[async_trait]
impl SecretStore for HangingStore {
    async fn create(&self, _: &EncryptedSecret) -> Result<StoredSecretHandle, StoreError> {
        Err(StoreError::Transport("unreachable".into()))
    }

    async fn fetch(&self, _: &str) -> Result<EncryptedSecret, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

struct OfflineStore;

#[async_trait]
impl SecretStore for OfflineStore {
    async fn create(&self, _: &EncryptedSecret) -> Result<StoredSecretHandle, StoreError> {
        Err(StoreError::Transport("connection refused".into()))
    }

    async fn fetch(&self, _: &str) -> Result<EncryptedSecret, StoreError> {
        Err(StoreError::Transport("connection refused".into()))
    }
}

#[tokio::test]
async fn happy_path_without_password() {
    let store = MemorySecretStore::new();
    let key = generate_key(16);
    let (handle, url) = share(&store, &PlainSecret::new("hello"), &key, 1).await;

    assert_eq!(url, format!("{PUBLIC_URL}/s/{}#{}", handle.uuid, key.expose()));

    let mut session = RetrievalSession::from_url(&url);
    let state = session.start(&store).await;

    let secret = revealed(state);
    assert_eq!(secret.message(), "hello");
    assert!(secret.files().is_empty());
}

#[tokio::test]
async fn happy_path_with_attachments() {
    let store = MemorySecretStore::new();
    let key = generate_key(16);
    let secret = PlainSecret::new("keys attached")
        .with_attachment(PlainFile::new("id_ed25519", "", b"-----BEGIN".to_vec()))
        .with_attachment(PlainFile::new("notes.md", "text/markdown", b"# hi".to_vec()));
    let (_, url) = share(&store, &secret, &key, 24).await;

    let mut session = RetrievalSession::from_url(&url);
    let secret = revealed(session.start(&store).await);

    let names: Vec<_> = secret.files().iter().map(|f| f.name()).collect();
    assert_eq!(names, ["id_ed25519", "notes.md"]);
    assert_eq!(secret.files()[1].mime(), "text/markdown");
    assert_eq!(secret.files()[1].bytes(), b"# hi");
}

#[tokio::test]
async fn password_wrong_then_right() {
    let store = MemorySecretStore::new();
    let key = SymmetricKey::password("correct horse battery").unwrap();
    let (handle, url) = share(&store, &PlainSecret::new("behind a password"), &key, 1).await;

    assert!(handle.requires_password);
    assert!(!url.contains('#'), "password must never appear in the link");

    let mut session = RetrievalSession::from_url(&url);
    assert_eq!(
        session.start(&store).await,
        &SessionState::PasswordRequired { error: None }
    );

    assert_eq!(
        session.submit_password("correct horse"),
        &SessionState::PasswordRequired {
            error: Some(ErrorKind::IncorrectPassword)
        }
    );

    let secret = revealed(session.submit_password("correct horse battery"));
    assert_eq!(secret.message(), "behind a password");

    // Terminal: further submissions change nothing
    let again = session.submit_password("correct horse battery").clone();
    assert_eq!(revealed(&again).message(), "behind a password");
}

#[tokio::test]
async fn password_prompt_does_not_refetch() {
    let store = CountingStore {
        inner: MemorySecretStore::new(),
        fetches: AtomicUsize::new(0),
    };
    let key = SymmetricKey::password("hunter2222").unwrap();
    let payload = assembler()
        .build(&PlainSecret::new("x"), &key, true, 1)
        .unwrap();
    let handle = store.create(&payload).await.unwrap();

    let mut session = RetrievalSession::new(Locator::for_handle(&handle, key.expose()));
    session.start(&store).await;
    for _ in 0..5 {
        session.submit_password("wrong-guess");
    }
    session.submit_password("hunter2222");

    assert!(matches!(session.state(), SessionState::Revealed(_)));
    assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn expired_secret_has_specific_message() {
    let store = MemorySecretStore::new();
    let key = generate_key(16);
    let (handle, url) = share(&store, &PlainSecret::new("too late"), &key, 1).await;
    store
        .set_expiry(&handle.uuid, chrono::Utc::now() - chrono::Duration::hours(1))
        .await;

    let mut session = RetrievalSession::from_url(&url);
    let state = session.start(&store).await;

    assert_eq!(state, &SessionState::Failed(ErrorKind::Expired));
    assert_eq!(
        ErrorKind::Expired.user_message(),
        "This secret has expired and is no longer available."
    );
    assert_ne!(
        ErrorKind::Expired.user_message(),
        ErrorKind::Server.user_message()
    );
}

#[tokio::test]
async fn missing_fragment_is_malformed_link() {
    let store = MemorySecretStore::new();
    let key = generate_key(16);
    let (handle, _) = share(&store, &PlainSecret::new("unreachable"), &key, 1).await;

    let url = format!("{PUBLIC_URL}/s/{}#", handle.uuid);
    let mut session = RetrievalSession::from_url(&url);

    assert_eq!(
        session.start(&store).await,
        &SessionState::Failed(ErrorKind::MalformedLink(LinkFault::MissingKey))
    );
}

#[tokio::test]
async fn wrong_fragment_key_is_terminal() {
    let store = MemorySecretStore::new();
    let key = generate_key(16);
    let (handle, _) = share(&store, &PlainSecret::new("unreachable"), &key, 1).await;

    let other = generate_key(16);
    let url = format!("{PUBLIC_URL}/s/{}#{}", handle.uuid, other.expose());
    let mut session = RetrievalSession::from_url(&url);

    assert_eq!(
        session.start(&store).await,
        &SessionState::Failed(ErrorKind::MalformedLink(LinkFault::BadKey))
    );
    // No password route out of a link failure
    assert_eq!(
        session.submit_password(key.expose()),
        &SessionState::Failed(ErrorKind::MalformedLink(LinkFault::BadKey))
    );
}

#[tokio::test]
async fn second_view_finds_nothing() {
    let store = MemorySecretStore::new();
    let key = generate_key(16);
    let (_, url) = share(&store, &PlainSecret::new("once"), &key, 1).await;

    let mut first = RetrievalSession::from_url(&url);
    assert!(matches!(first.start(&store).await, SessionState::Revealed(_)));

    let mut second = RetrievalSession::from_url(&url);
    assert_eq!(
        second.start(&store).await,
        &SessionState::Failed(ErrorKind::NotFound)
    );
}

#[tokio::test]
async fn single_fetch_across_repeated_starts() {
    let store = CountingStore {
        inner: MemorySecretStore::new(),
        fetches: AtomicUsize::new(0),
    };
    let key = generate_key(16);
    let payload = assembler()
        .build(&PlainSecret::new("once"), &key, false, 1)
        .unwrap();
    let handle = store.create(&payload).await.unwrap();

    let mut session = RetrievalSession::new(Locator::for_handle(&handle, key.expose()));
    for _ in 0..3 {
        session.start(&store).await;
    }

    assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(revealed(session.state()).message(), "once");
}

#[tokio::test]
async fn corrupted_attachment_is_dropped() {
    let store = MemorySecretStore::new();
    let key = generate_key(16);
    let secret = PlainSecret::new("message survives")
        .with_attachment(PlainFile::new("a.txt", "text/plain", b"aaa".to_vec()))
        .with_attachment(PlainFile::new("b.txt", "text/plain", b"bbb".to_vec()))
        .with_attachment(PlainFile::new("c.txt", "text/plain", b"ccc".to_vec()));

    let mut payload = assembler().build(&secret, &key, false, 1).unwrap();
    // Truncate the middle attachment's ciphertext
    let data = &mut payload.files[1].file_data;
    data.truncate(data.len() / 2);
    let handle = store.create(&payload).await.unwrap();

    let mut session = RetrievalSession::new(Locator::for_handle(&handle, key.expose()));
    let secret = revealed(session.start(&store).await);

    assert_eq!(secret.message(), "message survives");
    let names: Vec<_> = secret.files().iter().map(|f| f.name()).collect();
    assert_eq!(names, ["a.txt", "c.txt"]);
}

#[tokio::test]
async fn transport_failure_suggests_retry() {
    let mut session = RetrievalSession::new(Locator {
        uuid: "abc".into(),
        fragment: Some("k".into()),
    });
    let state = session.start(&OfflineStore).await;

    assert_eq!(state, &SessionState::Failed(ErrorKind::Transport));
    assert!(ErrorKind::Transport.suggests_retry());

    // Not retried automatically, even when asked to start again
    assert_eq!(
        session.start(&OfflineStore).await,
        &SessionState::Failed(ErrorKind::Transport)
    );
}

#[tokio::test]
async fn cancelled_fetch_is_never_reissued() {
    let store = HangingStore {
        fetches: AtomicUsize::new(0),
    };
    let mut session = RetrievalSession::new(Locator {
        uuid: "abc".into(),
        fragment: Some("k".into()),
    });

    let timed_out = tokio::time::timeout(Duration::from_millis(50), session.start(&store)).await;
    assert!(timed_out.is_err());
    assert_eq!(session.state(), &SessionState::Loading);

    // The abandoned fetch is not replaced by a new one
    assert_eq!(session.start(&store).await, &SessionState::Loading);
    assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn late_result_for_recreated_session_is_ignored() {
    let store = MemorySecretStore::new();
    let key = generate_key(16);
    let (_, url) = share(&store, &PlainSecret::new("late"), &key, 1).await;

    // First view issues its fetch, then is torn down before it lands
    let mut old = RetrievalSession::from_url(&url);
    let old_ticket = old.begin().unwrap();
    let late_result = store.fetch(old_ticket.uuid()).await;
    drop(old);

    let mut recreated = RetrievalSession::from_url(&url);
    assert_eq!(recreated.complete(old_ticket, late_result), &SessionState::Loading);
}

#[tokio::test]
async fn close_wipes_revealed_plaintext() {
    let store = MemorySecretStore::new();
    let key = generate_key(16);
    let secret = PlainSecret::new("wipe me")
        .with_attachment(PlainFile::new("a.txt", "text/plain", b"aaa".to_vec()));
    let (_, url) = share(&store, &secret, &key, 1).await;

    let mut session = RetrievalSession::from_url(&url);
    assert_eq!(revealed(session.start(&store).await).message(), "wipe me");

    session.close();
    let wiped = revealed(session.state());
    assert!(wiped.message().is_empty());
    assert!(wiped.files().is_empty());
}
