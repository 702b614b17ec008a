//! The authorization gate.
//!
//! The gate turns a session state and the allow-list into one of four
//! decisions. Evaluation is pure. Enforcement adds the one permitted side
//! effect: a session that is authenticated but not allow-listed is logged
//! out before the decision is returned, so it never survives into the next
//! render.

use balloon_gate_core::SessionId;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::allow_list::AllowList;
use crate::error::MissingIdentityField;
use crate::identity::Identity;
use crate::provider::IdentityProviderClient;
use crate::session::SessionState;

/// What the UI layer should show for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// No login yet; show the login prompt.
    Unauthenticated,
    /// The last login failed; show the failure message.
    AuthenticationFailed,
    /// Show the protected content.
    AuthenticatedAuthorized(Identity),
    /// Show the denial. The session has been logged out.
    AuthenticatedUnauthorized(DenialReason),
}

impl Decision {
    /// Returns true only for `AuthenticatedAuthorized`.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::AuthenticatedAuthorized(_))
    }
}

/// Why an authenticated user was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// The identity carried no email.
    MissingEmail(MissingIdentityField),
    /// The email is not on the allow-list.
    NotAllowListed { email: String },
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEmail(missing) => write!(f, "{missing}"),
            Self::NotAllowListed { email } => write!(f, "{email} is not on the allow-list"),
        }
    }
}

/// A side effect the gate requires before the decision is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// Invalidate the session through the identity provider.
    ForceLogout,
}

/// Result of evaluating a session against the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// The decision for the UI.
    pub decision: Decision,
    /// The side effect that must run before the decision is shown.
    pub side_effect: Option<SideEffect>,
}

impl Evaluation {
    fn without_side_effect(decision: Decision) -> Self {
        Self {
            decision,
            side_effect: None,
        }
    }

    fn deny(reason: DenialReason) -> Self {
        Self {
            decision: Decision::AuthenticatedUnauthorized(reason),
            side_effect: Some(SideEffect::ForceLogout),
        }
    }
}

/// Evaluates a session state against an allow-list.
#[must_use]
pub fn evaluate(state: &SessionState, allow_list: &AllowList) -> Evaluation {
    match state {
        SessionState::AuthenticationFailed { .. } => {
            Evaluation::without_side_effect(Decision::AuthenticationFailed)
        }
        SessionState::NotAttempted | SessionState::Pending => {
            Evaluation::without_side_effect(Decision::Unauthenticated)
        }
        SessionState::Authenticated { identity } => match identity.require_email() {
            Err(missing) => Evaluation::deny(DenialReason::MissingEmail(missing)),
            Ok(email) if allow_list.contains(email) => {
                Evaluation::without_side_effect(Decision::AuthenticatedAuthorized(identity.clone()))
            }
            Ok(email) => Evaluation::deny(DenialReason::NotAllowListed {
                email: email.to_string(),
            }),
        },
    }
}

/// The gate in front of protected content.
///
/// Holds only the allow-list; session state is passed in on every call.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    allow_list: Arc<AllowList>,
}

impl AuthorizationGate {
    /// Creates a gate over the given allow-list.
    #[must_use]
    pub fn new(allow_list: AllowList) -> Self {
        Self {
            allow_list: Arc::new(allow_list),
        }
    }

    /// Evaluates a session state without running side effects.
    #[must_use]
    pub fn evaluate(&self, state: &SessionState) -> Evaluation {
        evaluate(state, &self.allow_list)
    }

    /// Decides what to show for a session and runs the required side
    /// effect.
    ///
    /// A missing session is unauthenticated. A provider error while
    /// reading the session is an authentication failure. A forced logout
    /// is awaited before returning. If it fails, the denial still stands.
    #[instrument(skip(self, provider))]
    pub async fn enforce<P>(&self, provider: &P, session: Option<&SessionId>) -> Decision
    where
        P: IdentityProviderClient + ?Sized,
    {
        let Some(session) = session else {
            return Decision::Unauthenticated;
        };

        let state = match provider.session_state(session).await {
            Ok(state) => state,
            Err(report) => {
                warn!(error = %report, "failed to read session state");
                return Decision::AuthenticationFailed;
            }
        };

        let Evaluation {
            decision,
            side_effect,
        } = self.evaluate(&state);

        if let Some(SideEffect::ForceLogout) = side_effect {
            if let Decision::AuthenticatedUnauthorized(reason) = &decision {
                info!(%reason, "denying access and forcing logout");
            }
            if let Err(report) = provider.force_logout(session).await {
                warn!(error = %report, "forced logout failed");
            }
        } else {
            debug!(?decision, "gate evaluated");
        }

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IdentityProviderError;
    use async_trait::async_trait;
    use rootcause::prelude::Report;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// In-memory provider that counts logouts.
    #[derive(Default)]
    struct FakeProvider {
        sessions: Mutex<HashMap<SessionId, SessionState>>,
        logouts: AtomicUsize,
        fail_reads: bool,
        fail_logouts: bool,
    }

    impl FakeProvider {
        async fn with_session(state: SessionState) -> (Self, SessionId) {
            let provider = Self::default();
            let id = SessionId::new();
            provider.sessions.lock().await.insert(id, state);
            (provider, id)
        }

        fn logouts(&self) -> usize {
            self.logouts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdentityProviderClient for FakeProvider {
        async fn session_state(
            &self,
            session: &SessionId,
        ) -> Result<SessionState, Report<IdentityProviderError>> {
            if self.fail_reads {
                return Err(IdentityProviderError::SessionStore {
                    reason: "unavailable".to_string(),
                }
                .into());
            }
            Ok(self
                .sessions
                .lock()
                .await
                .get(session)
                .cloned()
                .unwrap_or(SessionState::NotAttempted))
        }

        async fn force_logout(
            &self,
            session: &SessionId,
        ) -> Result<(), Report<IdentityProviderError>> {
            self.logouts.fetch_add(1, Ordering::SeqCst);
            if self.fail_logouts {
                return Err(IdentityProviderError::SessionStore {
                    reason: "unavailable".to_string(),
                }
                .into());
            }
            self.sessions.lock().await.remove(session);
            Ok(())
        }
    }

    fn allow(emails: &[&str]) -> AllowList {
        emails.iter().copied().collect()
    }

    fn authenticated(email: Option<&str>) -> SessionState {
        SessionState::Authenticated {
            identity: Identity::new("Test User").with_email(email.map(str::to_string)),
        }
    }

    fn failed() -> SessionState {
        SessionState::AuthenticationFailed {
            reason: "token exchange failed".to_string(),
        }
    }

    #[test]
    fn failed_login_is_reported_regardless_of_allow_list() {
        for list in [allow(&[]), allow(&["a@x.com"])] {
            let evaluation = evaluate(&failed(), &list);
            assert_eq!(evaluation.decision, Decision::AuthenticationFailed);
            assert_eq!(evaluation.side_effect, None);
        }
    }

    #[test]
    fn not_attempted_with_empty_list_is_unauthenticated() {
        let evaluation = evaluate(&SessionState::NotAttempted, &allow(&[]));
        assert_eq!(evaluation.decision, Decision::Unauthenticated);
        assert_eq!(evaluation.side_effect, None);
    }

    #[test]
    fn pending_is_unauthenticated() {
        let evaluation = evaluate(&SessionState::Pending, &allow(&["a@x.com"]));
        assert_eq!(evaluation.decision, Decision::Unauthenticated);
    }

    #[test]
    fn listed_email_is_authorized() {
        let evaluation = evaluate(&authenticated(Some("a@x.com")), &allow(&["a@x.com"]));
        assert!(evaluation.decision.is_authorized());
        assert_eq!(evaluation.side_effect, None);
    }

    #[test]
    fn unlisted_email_is_denied_with_logout() {
        let evaluation = evaluate(&authenticated(Some("b@x.com")), &allow(&["a@x.com"]));
        assert_eq!(
            evaluation.decision,
            Decision::AuthenticatedUnauthorized(DenialReason::NotAllowListed {
                email: "b@x.com".to_string()
            })
        );
        assert_eq!(evaluation.side_effect, Some(SideEffect::ForceLogout));
    }

    #[test]
    fn empty_list_denies_everyone() {
        let evaluation = evaluate(&authenticated(Some("a@x.com")), &AllowList::empty());
        assert!(matches!(
            evaluation.decision,
            Decision::AuthenticatedUnauthorized(_)
        ));
        assert_eq!(evaluation.side_effect, Some(SideEffect::ForceLogout));
    }

    #[test]
    fn missing_email_fails_closed() {
        let evaluation = evaluate(&authenticated(None), &allow(&["a@x.com"]));
        assert_eq!(
            evaluation.decision,
            Decision::AuthenticatedUnauthorized(DenialReason::MissingEmail(
                MissingIdentityField { field: "email" }
            ))
        );
        assert_eq!(evaluation.side_effect, Some(SideEffect::ForceLogout));
    }

    #[test]
    fn case_differences_are_not_authorized() {
        let evaluation = evaluate(&authenticated(Some("A@x.com")), &allow(&["a@x.com"]));
        assert!(!evaluation.decision.is_authorized());
    }

    #[tokio::test]
    async fn enforce_without_session_is_unauthenticated() {
        let provider = FakeProvider::default();
        let gate = AuthorizationGate::new(allow(&["a@x.com"]));

        let decision = gate.enforce(&provider, None).await;

        assert_eq!(decision, Decision::Unauthenticated);
        assert_eq!(provider.logouts(), 0);
    }

    #[tokio::test]
    async fn enforce_authorized_does_not_log_out() {
        let (provider, id) = FakeProvider::with_session(authenticated(Some("a@x.com"))).await;
        let gate = AuthorizationGate::new(allow(&["a@x.com"]));

        let decision = gate.enforce(&provider, Some(&id)).await;

        assert!(decision.is_authorized());
        assert_eq!(provider.logouts(), 0);
    }

    #[tokio::test]
    async fn enforce_unauthorized_logs_out_exactly_once() {
        let (provider, id) = FakeProvider::with_session(authenticated(Some("b@x.com"))).await;
        let gate = AuthorizationGate::new(allow(&["a@x.com"]));

        let decision = gate.enforce(&provider, Some(&id)).await;

        assert!(matches!(decision, Decision::AuthenticatedUnauthorized(_)));
        assert_eq!(provider.logouts(), 1);
    }

    #[tokio::test]
    async fn denied_session_is_unauthenticated_on_next_render() {
        let (provider, id) = FakeProvider::with_session(authenticated(Some("b@x.com"))).await;
        let gate = AuthorizationGate::new(allow(&["a@x.com"]));

        let first = gate.enforce(&provider, Some(&id)).await;
        let second = gate.enforce(&provider, Some(&id)).await;

        assert!(matches!(first, Decision::AuthenticatedUnauthorized(_)));
        assert_eq!(second, Decision::Unauthenticated);
        assert_eq!(provider.logouts(), 1);
    }

    #[tokio::test]
    async fn enforce_failed_login_has_no_side_effect() {
        let (provider, id) = FakeProvider::with_session(failed()).await;
        let gate = AuthorizationGate::new(allow(&["a@x.com"]));

        assert_eq!(
            gate.enforce(&provider, Some(&id)).await,
            Decision::AuthenticationFailed
        );
        assert_eq!(provider.logouts(), 0);
    }

    #[tokio::test]
    async fn provider_read_error_is_authentication_failure() {
        let provider = FakeProvider {
            fail_reads: true,
            ..FakeProvider::default()
        };
        let gate = AuthorizationGate::new(allow(&["a@x.com"]));

        let decision = gate.enforce(&provider, Some(&SessionId::new())).await;

        assert_eq!(decision, Decision::AuthenticationFailed);
    }

    #[tokio::test]
    async fn failed_logout_still_denies() {
        let (mut provider, id) =
            FakeProvider::with_session(authenticated(Some("b@x.com"))).await;
        provider.fail_logouts = true;
        let gate = AuthorizationGate::new(allow(&["a@x.com"]));

        let decision = gate.enforce(&provider, Some(&id)).await;

        assert!(matches!(decision, Decision::AuthenticatedUnauthorized(_)));
        assert_eq!(provider.logouts(), 1);
    }

    #[tokio::test]
    async fn empty_allow_list_denies_every_authenticated_user() {
        let gate = AuthorizationGate::new(AllowList::empty());
        for email in ["a@x.com", "root@localhost", ""] {
            let (provider, id) = FakeProvider::with_session(authenticated(Some(email))).await;
            let decision = gate.enforce(&provider, Some(&id)).await;
            assert!(matches!(decision, Decision::AuthenticatedUnauthorized(_)));
            assert_eq!(provider.logouts(), 1);
        }
    }

    #[test]
    fn denial_reason_display() {
        let reason = DenialReason::NotAllowListed {
            email: "b@x.com".to_string(),
        };
        assert_eq!(reason.to_string(), "b@x.com is not on the allow-list");

        let reason = DenialReason::MissingEmail(MissingIdentityField { field: "email" });
        assert!(reason.to_string().contains("no email"));
    }
}
