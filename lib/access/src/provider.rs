//! The seam between the gate and whatever owns session state.

use async_trait::async_trait;
use balloon_gate_core::SessionId;
use rootcause::prelude::Report;

use crate::error::IdentityProviderError;
use crate::session::SessionState;

/// Client for the identity provider's view of a browser session.
///
/// The gate only reads state and requests logout through this trait. It
/// never touches session fields itself.
#[async_trait]
pub trait IdentityProviderClient: Send + Sync {
    /// Returns the current state of the session.
    ///
    /// Unknown or expired sessions are `SessionState::NotAttempted`.
    async fn session_state(
        &self,
        session: &SessionId,
    ) -> Result<SessionState, Report<IdentityProviderError>>;

    /// Invalidates the session.
    ///
    /// Must succeed when the session is already gone, so repeated calls
    /// are no-ops.
    async fn force_logout(&self, session: &SessionId) -> Result<(), Report<IdentityProviderError>>;
}
