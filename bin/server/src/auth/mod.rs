//! Authentication module for the balloon-gate server.
//!
//! This module provides:
//! - Two identity-provider variants: discovery-based OIDC and a Google
//!   OAuth helper. Both produce an [`Identity`].
//! - The in-memory session store, which is the identity-provider client
//!   the gate talks to
//! - Login, callback and logout routes
//! - Extractors for the session cookie and for allow-listed users
//!
//! # Authorization Model
//!
//! Logging in only establishes who the user is. Whether they may see the
//! app is decided on every render by the
//! [`AuthorizationGate`](balloon_gate_access::AuthorizationGate) against
//! the allow-list. A user who logs in but is not on the list is logged out
//! by the gate on their first render.

pub mod google;
pub mod middleware;
pub mod oidc;
pub mod routes;
pub mod store;

use async_trait::async_trait;
use balloon_gate_access::{AuthorizationGate, Identity, IdentityProviderError, OidcConfig};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{ProviderKind, SessionConfig};

pub use google::GoogleOAuthClient;
pub use middleware::{RequireAuthorized, SessionCookie};
pub use oidc::OidcClient;
pub use routes::{callback, login, logout};
pub use store::SessionStore;

/// Data kept in a short-lived cookie between login and callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthState {
    pub csrf_token: String,
    pub pkce_verifier: String,
    /// Only the OIDC variant uses a nonce.
    #[serde(default)]
    pub nonce: Option<String>,
}

/// An identity provider that can run the browser login flow.
#[async_trait]
pub trait LoginProvider: Send + Sync {
    /// Returns the URL to send the browser to and the state to keep for
    /// the callback.
    fn authorization_url(&self) -> (String, AuthState);

    /// Completes the login with the authorization code from the callback.
    async fn complete(
        &self,
        code: &str,
        state: &AuthState,
    ) -> Result<Identity, Report<IdentityProviderError>>;
}

/// Shared application state.
pub struct AppState {
    /// Per-browser session store.
    pub store: SessionStore,
    /// The allow-list gate.
    pub gate: AuthorizationGate,
    /// The login provider, absent when it could not be initialized.
    pub login_provider: Option<Arc<dyn LoginProvider>>,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        store: SessionStore,
        gate: AuthorizationGate,
        login_provider: Option<Arc<dyn LoginProvider>>,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            store,
            gate,
            login_provider,
            session_config,
        }
    }
}

/// Sets up the configured identity provider.
///
/// Returns `None` on failure, missing credentials included, so the server
/// still starts and can tell users the authenticator is unavailable.
pub async fn init_login_provider(
    kind: ProviderKind,
    config: &OidcConfig,
) -> Option<Arc<dyn LoginProvider>> {
    let result: Result<Arc<dyn LoginProvider>, Report<IdentityProviderError>> = match kind {
        ProviderKind::Oidc => {
            tracing::info!(issuer = config.issuer_url(), "Discovering OIDC provider...");
            OidcClient::discover(config.clone())
                .await
                .map(|client| Arc::new(client) as Arc<dyn LoginProvider>)
        }
        ProviderKind::Google => GoogleOAuthClient::new(config)
            .map(|client| Arc::new(client) as Arc<dyn LoginProvider>),
    };

    match result {
        Ok(provider) => Some(provider),
        Err(report) => {
            tracing::error!(error = %report, "Authenticator could not be initialized");
            None
        }
    }
}

/// Keeps only an email the provider says it verified.
///
/// A missing `email_verified` claim counts as unverified.
pub(crate) fn verified_email(email: Option<String>, verified: Option<bool>) -> Option<String> {
    match verified {
        Some(true) => email,
        _ => {
            if let Some(email) = &email {
                tracing::warn!(%email, "Dropping unverified email from identity");
            }
            None
        }
    }
}
