//! In-memory session store.
//!
//! The store owns every browser's session and is the identity-provider
//! client the gate reads from. Logout removes the entry, so a second
//! logout finds nothing and succeeds.
//!
//! Session IDs are only ever issued here. An ID sent by a browser is
//! looked up, never inserted, and a completed login moves the identity
//! to a new ID.

use async_trait::async_trait;
use balloon_gate_access::{
    Identity, IdentityProviderClient, IdentityProviderError, Session, SessionState,
};
use balloon_gate_core::SessionId;
use chrono::Duration;
use rootcause::prelude::Report;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Shared map of session ID to session.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a login under a freshly issued session ID. The session
    /// becomes `Pending`.
    #[instrument(skip(self))]
    pub async fn begin_login(&self, duration: Duration) -> SessionId {
        let id = SessionId::new();
        self.sessions
            .write()
            .await
            .insert(id, Session::pending(id, duration));
        debug!(session = %id, "Login started");
        id
    }

    /// Records a successful login for a pending session.
    ///
    /// The pending entry is removed and the identity is stored under a new
    /// ID, which is returned. Returns `None` if `pending` is unknown,
    /// expired or not pending.
    #[instrument(skip(self, identity))]
    pub async fn complete_login(
        &self,
        pending: &SessionId,
        identity: Identity,
        duration: Duration,
    ) -> Option<SessionId> {
        let mut sessions = self.sessions.write().await;
        let is_pending = sessions
            .get(pending)
            .is_some_and(|s| s.effective_state() == SessionState::Pending);
        if !is_pending {
            return None;
        }
        sessions.remove(pending);

        let id = SessionId::new();
        let mut session = Session::pending(id, duration);
        session.transition(SessionState::Authenticated { identity }, duration);
        sessions.insert(id, session);
        debug!(session = %id, "Login completed");
        Some(id)
    }

    /// Records a failed login for a pending session. Returns false if
    /// `pending` is unknown, expired or not pending.
    pub async fn fail_login(&self, pending: &SessionId, reason: String, duration: Duration) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(pending) {
            Some(session) if session.effective_state() == SessionState::Pending => {
                session.transition(SessionState::AuthenticationFailed { reason }, duration);
                true
            }
            _ => false,
        }
    }

    /// Returns true if the session exists and is waiting on the provider.
    pub async fn is_pending(&self, id: &SessionId) -> bool {
        self.sessions
            .read()
            .await
            .get(id)
            .is_some_and(|s| s.effective_state() == SessionState::Pending)
    }

    /// Finds a session by ID, including expired ones.
    pub async fn find_by_id(&self, id: &SessionId) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Deletes a session. Returns true if it existed.
    pub async fn delete(&self, id: &SessionId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Deletes expired sessions and returns how many were removed.
    pub async fn delete_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        before - sessions.len()
    }

    /// Returns the number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl IdentityProviderClient for SessionStore {
    async fn session_state(
        &self,
        session: &SessionId,
    ) -> Result<SessionState, Report<IdentityProviderError>> {
        Ok(self
            .find_by_id(session)
            .await
            .map_or(SessionState::NotAttempted, |s| s.effective_state()))
    }

    #[instrument(skip(self))]
    async fn force_logout(&self, session: &SessionId) -> Result<(), Report<IdentityProviderError>> {
        let existed = self.delete(session).await;
        debug!(existed, "Session logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identity {
        Identity::new("Alice").with_email(Some("alice@example.com".to_string()))
    }

    #[tokio::test]
    async fn unknown_session_is_not_attempted() {
        let store = SessionStore::new();
        let state = store.session_state(&SessionId::new()).await.expect("read");
        assert_eq!(state, SessionState::NotAttempted);
    }

    #[tokio::test]
    async fn login_flow_moves_through_states() {
        let store = SessionStore::new();
        let pending = store.begin_login(Duration::hours(1)).await;
        assert_eq!(
            store.session_state(&pending).await.expect("read"),
            SessionState::Pending
        );

        let id = store
            .complete_login(&pending, alice(), Duration::hours(1))
            .await
            .expect("pending session");
        let state = store.session_state(&id).await.expect("read");
        assert_eq!(state.identity(), Some(&alice()));
    }

    #[tokio::test]
    async fn completed_login_gets_a_new_id() {
        let store = SessionStore::new();
        let pending = store.begin_login(Duration::hours(1)).await;

        let id = store
            .complete_login(&pending, alice(), Duration::hours(1))
            .await
            .expect("pending session");

        assert_ne!(id, pending);
        assert!(store.find_by_id(&pending).await.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unissued_id_cannot_be_logged_in() {
        let store = SessionStore::new();
        let planted = SessionId::new();

        assert!(
            store
                .complete_login(&planted, alice(), Duration::hours(1))
                .await
                .is_none()
        );
        assert!(
            !store
                .fail_login(&planted, "denied".to_string(), Duration::hours(1))
                .await
        );
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn authenticated_session_cannot_be_completed_again() {
        let store = SessionStore::new();
        let pending = store.begin_login(Duration::hours(1)).await;
        let id = store
            .complete_login(&pending, alice(), Duration::hours(1))
            .await
            .expect("pending session");

        assert!(
            store
                .complete_login(&id, alice(), Duration::hours(1))
                .await
                .is_none()
        );
        assert!(!store.is_pending(&id).await);
    }

    #[tokio::test]
    async fn failed_login_is_recorded() {
        let store = SessionStore::new();
        let pending = store.begin_login(Duration::hours(1)).await;

        assert!(
            store
                .fail_login(&pending, "token exchange failed".to_string(), Duration::hours(1))
                .await
        );
        assert!(matches!(
            store.session_state(&pending).await.expect("read"),
            SessionState::AuthenticationFailed { .. }
        ));
    }

    #[tokio::test]
    async fn force_logout_twice_is_safe() {
        let store = SessionStore::new();
        let pending = store.begin_login(Duration::hours(1)).await;
        let id = store
            .complete_login(&pending, alice(), Duration::hours(1))
            .await
            .expect("pending session");

        store.force_logout(&id).await.expect("first logout");
        store.force_logout(&id).await.expect("second logout");

        assert_eq!(
            store.session_state(&id).await.expect("read"),
            SessionState::NotAttempted
        );
    }

    #[tokio::test]
    async fn expired_sessions_read_as_not_attempted_and_are_purged() {
        let store = SessionStore::new();
        let pending = store.begin_login(Duration::hours(1)).await;
        let expired = store
            .complete_login(&pending, alice(), Duration::seconds(-1))
            .await
            .expect("pending session");
        let live = store.begin_login(Duration::hours(1)).await;

        assert_eq!(
            store.session_state(&expired).await.expect("read"),
            SessionState::NotAttempted
        );
        assert_eq!(store.delete_expired().await, 1);
        assert!(store.find_by_id(&live).await.is_some());
        assert!(store.find_by_id(&expired).await.is_none());
    }

    #[tokio::test]
    async fn expired_pending_session_cannot_complete() {
        let store = SessionStore::new();
        let pending = store.begin_login(Duration::seconds(-1)).await;

        assert!(!store.is_pending(&pending).await);
        assert!(
            store
                .complete_login(&pending, alice(), Duration::hours(1))
                .await
                .is_none()
        );
    }
}
