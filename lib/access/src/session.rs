//! Per-browser session state.
//!
//! A session records where a browser is in the login flow. It is created
//! when the browser starts a login, moved forward by the identity provider
//! and removed on logout. The gate reads it on every render and never
//! mutates it directly.

use balloon_gate_core::SessionId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// Authentication state of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    /// No login has been attempted, or the user logged out.
    NotAttempted,
    /// The browser was sent to the identity provider and has not returned.
    Pending,
    /// The last login attempt failed.
    AuthenticationFailed { reason: String },
    /// The identity provider vouched for this identity.
    Authenticated { identity: Identity },
}

impl SessionState {
    /// Maps the flag-style encodings some identity providers expose onto
    /// a session state.
    ///
    /// This is the adapter for external provider libraries that report
    /// login state as flags. The built-in session store records the tagged
    /// state directly and does not need it.
    ///
    /// `authentication_status` is a tri-state: `Some(true)` for logged in,
    /// `Some(false)` for a failed attempt, `None` when nothing happened.
    /// `connected` is the boolean variant. An explicit failure wins. A
    /// success without an identity is treated as not attempted.
    #[must_use]
    pub fn from_legacy_flags(
        authentication_status: Option<bool>,
        connected: Option<bool>,
        identity: Option<Identity>,
    ) -> Self {
        match (authentication_status, connected, identity) {
            (Some(false), _, _) => Self::AuthenticationFailed {
                reason: "identity provider reported a failed login".to_string(),
            },
            (Some(true), _, Some(identity)) | (None, Some(true), Some(identity)) => {
                Self::Authenticated { identity }
            }
            _ => Self::NotAttempted,
        }
    }

    /// Returns true if the provider authenticated the user. Mirrors the
    /// `connected` flag of flag-style providers.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Returns the authenticated identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated { identity } => Some(identity),
            _ => None,
        }
    }
}

/// A session held by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    state: SessionState,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a pending session, used when a browser starts a login.
    #[must_use]
    pub fn pending(id: SessionId, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: SessionState::Pending,
            created_at: now,
            expires_at: now + duration,
        }
    }

    /// Returns the session ID.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the stored state, regardless of expiry.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns the state the gate should see: expired sessions read as
    /// `NotAttempted`.
    #[must_use]
    pub fn effective_state(&self) -> SessionState {
        if self.is_expired() {
            SessionState::NotAttempted
        } else {
            self.state.clone()
        }
    }

    /// Returns when the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the session expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Moves the session to a new state and extends its lifetime.
    pub fn transition(&mut self, state: SessionState, duration: Duration) {
        self.state = state;
        self.expires_at = Utc::now() + duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identity {
        Identity::new("Alice").with_email(Some("alice@example.com".to_string()))
    }

    #[test]
    fn legacy_failure_flag_wins() {
        let state = SessionState::from_legacy_flags(Some(false), Some(true), Some(alice()));
        assert!(matches!(state, SessionState::AuthenticationFailed { .. }));
    }

    #[test]
    fn legacy_status_true_is_authenticated() {
        let state = SessionState::from_legacy_flags(Some(true), None, Some(alice()));
        assert_eq!(state.identity(), Some(&alice()));
        assert!(state.is_connected());
    }

    #[test]
    fn legacy_connected_flag_is_authenticated() {
        let state = SessionState::from_legacy_flags(None, Some(true), Some(alice()));
        assert!(state.is_connected());
    }

    #[test]
    fn legacy_absent_or_false_connected_is_not_attempted() {
        assert_eq!(
            SessionState::from_legacy_flags(None, None, None),
            SessionState::NotAttempted
        );
        assert_eq!(
            SessionState::from_legacy_flags(None, Some(false), Some(alice())),
            SessionState::NotAttempted
        );
    }

    #[test]
    fn legacy_success_without_identity_is_not_attempted() {
        assert_eq!(
            SessionState::from_legacy_flags(Some(true), Some(true), None),
            SessionState::NotAttempted
        );
    }

    #[test]
    fn pending_session_is_not_connected() {
        let session = Session::pending(SessionId::new(), Duration::hours(1));
        assert_eq!(session.state(), &SessionState::Pending);
        assert!(!session.state().is_connected());
        assert!(session.expires_at() > session.created_at());
    }

    #[test]
    fn expired_session_reads_as_not_attempted() {
        let mut session = Session::pending(SessionId::new(), Duration::hours(1));
        session.transition(
            SessionState::Authenticated { identity: alice() },
            Duration::seconds(-1),
        );

        assert!(session.is_expired());
        assert!(session.state().is_connected());
        assert_eq!(session.effective_state(), SessionState::NotAttempted);
    }

    #[test]
    fn transition_extends_expiry() {
        let mut session = Session::pending(SessionId::new(), Duration::seconds(1));
        let old_expires = session.expires_at();

        session.transition(
            SessionState::Authenticated { identity: alice() },
            Duration::hours(2),
        );

        assert!(session.expires_at() > old_expires);
        assert!(session.effective_state().is_connected());
    }

    #[test]
    fn state_serialization_is_tagged() {
        let json = serde_json::to_value(SessionState::Pending).expect("serialize");
        assert_eq!(json["status"], "pending");
    }
}
