//! Session lifecycle: `Anonymous -> Authenticated` via login, token rotation
//! while authenticated, and back to `Anonymous` on logout or when a refresh
//! fails.

pub mod store;

pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoredSession};

use crate::models::{TokenPair, UserSummary};
use crate::notices::Notices;
use console_core::ConsoleError;
use secrecy::{ExposeSecret, Secret};
use std::sync::{Arc, RwLock};
use tokio::sync::{watch, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user asked to sign out.
    Logout,
    /// Credentials were rejected and could not be refreshed.
    Expired,
}

#[derive(Default)]
struct Credentials {
    access_token: Option<Secret<String>>,
    refresh_token: Option<Secret<String>>,
    user: Option<UserSummary>,
}

impl Credentials {
    fn to_record(&self) -> StoredSession {
        StoredSession {
            access_token: self.access_token.as_ref().map(|t| t.expose_secret().clone()),
            refresh_token: self.refresh_token.as_ref().map(|t| t.expose_secret().clone()),
            user: self.user.clone(),
        }
    }
}

/// Owner of the token pair. Shared by `Arc` between the request client and the
/// notification channel.
pub struct Session {
    credentials: RwLock<Credentials>,
    store: Arc<dyn SessionStore>,
    // Serializes writes to the store so the persisted record is never older
    // than the in-memory one.
    persist_lock: Mutex<()>,
    state_tx: watch::Sender<SessionState>,
    notices: Notices,
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>, notices: Notices) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Anonymous);
        Self {
            credentials: RwLock::new(Credentials::default()),
            store,
            persist_lock: Mutex::new(()),
            state_tx,
            notices,
        }
    }

    /// Rebuild the session from the store. A stored access token is enough to
    /// start out authenticated; the first 401 will sort out whether it is
    /// still good.
    pub async fn restore(
        store: Arc<dyn SessionStore>,
        notices: Notices,
    ) -> Result<Self, ConsoleError> {
        let record = store.load().await?;
        let session = Self::new(store, notices);

        if let Some(access_token) = record.access_token {
            if let Ok(mut credentials) = session.credentials.write() {
                credentials.access_token = Some(Secret::new(access_token));
                credentials.refresh_token = record.refresh_token.map(Secret::new);
                credentials.user = record.user;
            }
            session.state_tx.send_replace(SessionState::Authenticated);
            tracing::info!("Restored persisted session");
        }

        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Observe lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    /// Current access token in clear, ready for an `Authorization` header.
    pub fn bearer_token(&self) -> Option<String> {
        self.credentials
            .read()
            .ok()
            .and_then(|c| c.access_token.as_ref().map(|t| t.expose_secret().clone()))
    }

    pub fn refresh_token(&self) -> Option<Secret<String>> {
        self.credentials
            .read()
            .ok()
            .and_then(|c| c.refresh_token.clone())
    }

    pub fn current_user(&self) -> Option<UserSummary> {
        self.credentials.read().ok().and_then(|c| c.user.clone())
    }

    /// Login succeeded: install the pair and enter `Authenticated`.
    pub async fn begin(&self, tokens: TokenPair) -> Result<(), ConsoleError> {
        if let Ok(mut credentials) = self.credentials.write() {
            credentials.access_token = Some(tokens.access_token);
            credentials.refresh_token = Some(tokens.refresh_token);
            credentials.user = None;
        }
        self.state_tx.send_replace(SessionState::Authenticated);
        tracing::info!("Session started");

        self.persist().await
    }

    /// Refresh succeeded: replace the pair, keep the profile.
    ///
    /// Returns `false` and changes nothing when `used_refresh_token` is no
    /// longer the held one (the session ended or was rotated meanwhile).
    pub async fn rotate(
        &self,
        used_refresh_token: &str,
        tokens: TokenPair,
    ) -> Result<bool, ConsoleError> {
        let applied = match self.credentials.write() {
            Ok(mut credentials) => {
                let current = credentials
                    .refresh_token
                    .as_ref()
                    .map(|t| t.expose_secret().as_str());
                if current == Some(used_refresh_token) {
                    credentials.access_token = Some(tokens.access_token);
                    credentials.refresh_token = Some(tokens.refresh_token);
                    true
                } else {
                    false
                }
            }
            Err(_) => false,
        };

        if !applied {
            tracing::warn!("Discarding refreshed tokens for a session that is no longer current");
            return Ok(false);
        }

        tracing::debug!("Access token rotated");
        self.persist().await?;
        Ok(true)
    }

    pub async fn set_user(&self, user: UserSummary) -> Result<(), ConsoleError> {
        if let Ok(mut credentials) = self.credentials.write() {
            if credentials.access_token.is_none() {
                return Ok(());
            }
            credentials.user = Some(user);
        }

        self.persist().await
    }

    /// Drop tokens and profile, purge the store and return to `Anonymous`.
    ///
    /// Idempotent: ending an anonymous session only re-clears the store.
    pub async fn end(&self, reason: SessionEnd) -> Result<(), ConsoleError> {
        let had_tokens = match self.credentials.write() {
            Ok(mut credentials) => {
                let had = credentials.access_token.is_some() || credentials.refresh_token.is_some();
                *credentials = Credentials::default();
                had
            }
            Err(_) => false,
        };
        self.state_tx.send_replace(SessionState::Anonymous);

        if had_tokens {
            match reason {
                SessionEnd::Logout => {
                    tracing::info!("Session closed by user");
                    self.notices.info("Signed out");
                }
                SessionEnd::Expired => {
                    tracing::warn!("Session ended: credentials rejected");
                    self.notices.warning("Session ended, please sign in again");
                }
            }
        }

        let _guard = self.persist_lock.lock().await;
        self.store.clear().await
    }

    async fn persist(&self) -> Result<(), ConsoleError> {
        let _guard = self.persist_lock.lock().await;

        let record = match self.credentials.read() {
            Ok(credentials) => credentials.to_record(),
            Err(_) => return Ok(()),
        };

        if record.access_token.is_none() {
            self.store.clear().await
        } else {
            self.store.save(&record).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::notices::NoticeLevel;

    fn session_with_store() -> (Session, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        (Session::new(store.clone(), Notices::new()), store)
    }

    fn member() -> UserSummary {
        UserSummary {
            id: 5,
            full_name: Some("Marta".to_string()),
            email: "marta@iglesia.org".to_string(),
            role: Role::Member,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn login_persists_pair_and_authenticates() {
        let (session, store) = session_with_store();
        assert_eq!(session.state(), SessionState::Anonymous);

        session.begin(TokenPair::new("A1", "R1")).await.unwrap();

        assert!(session.is_authenticated());
        assert_eq!(session.bearer_token().as_deref(), Some("A1"));
        let record = store.snapshot();
        assert_eq!(record.access_token.as_deref(), Some("A1"));
        assert_eq!(record.refresh_token.as_deref(), Some("R1"));
    }

    #[tokio::test]
    async fn rotate_replaces_pair_and_keeps_user() {
        let (session, store) = session_with_store();
        session.begin(TokenPair::new("A1", "R1")).await.unwrap();
        session.set_user(member()).await.unwrap();

        assert!(session.rotate("R1", TokenPair::new("A2", "R2")).await.unwrap());

        assert_eq!(session.bearer_token().as_deref(), Some("A2"));
        assert_eq!(session.current_user(), Some(member()));
        let record = store.snapshot();
        assert_eq!(record.access_token.as_deref(), Some("A2"));
        assert_eq!(record.refresh_token.as_deref(), Some("R2"));
        assert_eq!(record.user, Some(member()));
    }

    #[tokio::test]
    async fn rotate_after_logout_does_not_resurrect_session() {
        let (session, store) = session_with_store();
        session.begin(TokenPair::new("A1", "R1")).await.unwrap();
        session.end(SessionEnd::Logout).await.unwrap();

        assert!(!session.rotate("R1", TokenPair::new("A2", "R2")).await.unwrap());
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.bearer_token().is_none());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn expiry_clears_everything_and_notifies() {
        let (session, store) = session_with_store();
        let mut notices = session.notices().subscribe();
        let mut state = session.subscribe();

        session.begin(TokenPair::new("A1", "R1")).await.unwrap();
        session.set_user(member()).await.unwrap();
        session.end(SessionEnd::Expired).await.unwrap();

        assert!(session.bearer_token().is_none());
        assert!(session.refresh_token().is_none());
        assert!(session.current_user().is_none());
        assert!(store.snapshot().is_empty());
        assert_eq!(*state.borrow_and_update(), SessionState::Anonymous);

        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.message.starts_with("Session ended"));
    }

    #[tokio::test]
    async fn restore_reads_persisted_record() {
        let store = Arc::new(MemorySessionStore::with_record(StoredSession {
            access_token: Some("A9".to_string()),
            refresh_token: Some("R9".to_string()),
            user: Some(member()),
        }));

        let session = Session::restore(store, Notices::new()).await.unwrap();

        assert!(session.is_authenticated());
        assert_eq!(session.bearer_token().as_deref(), Some("A9"));
        assert_eq!(session.current_user(), Some(member()));
    }

    #[tokio::test]
    async fn restore_from_empty_store_is_anonymous() {
        let session = Session::restore(Arc::new(MemorySessionStore::new()), Notices::new())
            .await
            .unwrap();
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn set_user_is_ignored_when_anonymous() {
        let (session, store) = session_with_store();
        session.set_user(member()).await.unwrap();

        assert!(session.current_user().is_none());
        assert!(store.snapshot().is_empty());
    }
}
