// Session state
//
// One bearer token per client, read before every request and written by
// login / logout / 401 handling. The storage backend is pluggable so the
// CLI can persist the token in the OS keyring while tests stay in memory.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// The fixed key every token store files the bearer token under.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

const EVENT_CHANNEL_CAPACITY: usize = 16;

// ── TokenStore ──────────────────────────────────────────────────────

/// Backend that holds the bearer token.
///
/// Implementations never fail: an unreadable backend reports `None`,
/// an unwritable one logs and drops the write.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Option<SecretString>;
    fn set(&self, token: SecretString);
    fn clear(&self);
}

/// Process-local token store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<SecretString>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(SecretString::from(token.into()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, token: SecretString) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

// ── SessionEvent ────────────────────────────────────────────────────

/// Session lifecycle notifications.
///
/// `Unauthorized` replaces a hard redirect to the login screen: the
/// library clears the token and announces it, the front end decides
/// what to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
    /// A request to `path` was rejected with 401 and the token was dropped.
    Unauthorized { path: String },
}

// ── Session ─────────────────────────────────────────────────────────

/// Explicit session handle owned by a single [`MobiusClient`](crate::MobiusClient).
///
/// Cloning shares the same store and event channel; two sessions built
/// separately never see each other's tokens.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { store, events }
    }

    /// A session backed by a fresh [`MemoryTokenStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// The current bearer token, if any.
    pub fn token(&self) -> Option<SecretString> {
        self.store.get()
    }

    /// Whether a token is present. Contents and expiry are not inspected.
    pub fn is_authenticated(&self) -> bool {
        self.store
            .get()
            .is_some_and(|t| !t.expose_secret().is_empty())
    }

    pub(crate) fn store_token(&self, token: SecretString) {
        debug!("storing session token");
        self.store.set(token);
    }

    pub(crate) fn clear(&self) {
        debug!("clearing session token");
        self.store.clear();
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        info!(?event, "session event");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert!(store.get().is_none());

        store.set(SecretString::from("abc"));
        assert_eq!(store.get().unwrap().expose_secret(), "abc");

        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn sessions_do_not_share_tokens() {
        let a = Session::in_memory();
        let b = Session::in_memory();

        a.store_token(SecretString::from("only-a"));

        assert!(a.is_authenticated());
        assert!(!b.is_authenticated());
    }

    #[test]
    fn clones_share_the_same_store() {
        let a = Session::in_memory();
        let b = a.clone();

        a.store_token(SecretString::from("shared"));
        assert_eq!(b.token().unwrap().expose_secret(), "shared");

        b.clear();
        assert!(!a.is_authenticated());
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        let session = Session::new(Arc::new(MemoryTokenStore::with_token("")));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn events_reach_subscribers() {
        let session = Session::in_memory();
        let mut rx = session.subscribe();

        session.emit(SessionEvent::Unauthorized {
            path: "devices".into(),
        });

        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Unauthorized {
                path: "devices".into()
            }
        );
    }
}
