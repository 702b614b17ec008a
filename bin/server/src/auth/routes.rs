//! Authentication routes for login, callback, and logout.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use balloon_gate_core::SessionId;
use serde::Deserialize;
use std::sync::Arc;
use time::Duration as TimeDuration;

use super::{AppState, AuthState, middleware::SessionCookie};
use crate::config::SessionConfig;

/// Auth state cookie name (for CSRF protection during the login flow).
const AUTH_STATE_COOKIE: &str = "auth_state";

/// Query parameters for the provider callback.
///
/// Providers send `error` instead of `code` when the user declines.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: String,
    error: Option<String>,
}

/// Builds the session cookie for a session ID.
pub(crate) fn session_cookie(config: &SessionConfig, id: SessionId) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), id.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(config.cookie_max_age())
        .build()
}

/// Builds a cookie that makes the browser drop the named cookie.
pub(crate) fn removal_cookie(name: impl Into<String>) -> Cookie<'static> {
    Cookie::build((name.into(), ""))
        .path("/")
        .max_age(TimeDuration::ZERO)
        .build()
}

/// Starts the login flow by redirecting to the identity provider.
///
/// Any session the browser already holds is dropped and a new `Pending`
/// session is issued before the redirect.
pub async fn login(
    State(state): State<Arc<AppState>>,
    SessionCookie(existing): SessionCookie,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let provider = state
        .login_provider
        .as_ref()
        .ok_or(AuthError::ProviderUnavailable)?;

    let (auth_url, auth_state) = provider.authorization_url();
    let auth_state_json =
        serde_json::to_string(&auth_state).map_err(|e| AuthError::Internal(e.to_string()))?;

    if let Some(previous) = existing {
        state.store.delete(&previous).await;
    }

    let config = &state.session_config;
    let session_id = state.store.begin_login(config.duration()).await;

    let auth_state_cookie = Cookie::build((AUTH_STATE_COOKIE, auth_state_json))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10));

    let jar = jar
        .add(session_cookie(config, session_id))
        .add(auth_state_cookie);

    Ok((jar, Redirect::to(&auth_url)))
}

/// Handles the provider callback after the user authenticates.
///
/// A provider error leaves the session `AuthenticationFailed` so the home
/// page can say so. A successful login is stored under a new session ID
/// and the cookie is replaced. Only a forged or stale callback is rejected
/// outright.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    SessionCookie(session): SessionCookie,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let auth_state_cookie = jar
        .get(AUTH_STATE_COOKIE)
        .ok_or(AuthError::MissingAuthState)?;

    let auth_state: AuthState =
        serde_json::from_str(auth_state_cookie.value()).map_err(|_| AuthError::InvalidAuthState)?;

    if query.state != auth_state.csrf_token {
        return Err(AuthError::CsrfMismatch);
    }

    let pending = session.ok_or(AuthError::MissingSession)?;
    if !state.store.is_pending(&pending).await {
        return Err(AuthError::MissingSession);
    }

    let provider = state
        .login_provider
        .as_ref()
        .ok_or(AuthError::ProviderUnavailable)?;
    let config = &state.session_config;
    let duration = config.duration();

    let outcome = match (query.error, query.code) {
        (Some(error), _) => Err(format!("provider returned error: {error}")),
        (None, None) => Err("callback carried no authorization code".to_string()),
        (None, Some(code)) => provider
            .complete(&code, &auth_state)
            .await
            .map_err(|report| report.to_string()),
    };

    let jar = jar.add(removal_cookie(AUTH_STATE_COOKIE));

    let jar = match outcome {
        Ok(identity) => {
            let session_id = state
                .store
                .complete_login(&pending, identity, duration)
                .await
                .ok_or(AuthError::MissingSession)?;
            tracing::info!(session = %session_id, "Login succeeded");
            jar.add(session_cookie(config, session_id))
        }
        Err(reason) => {
            tracing::warn!(session = %pending, %reason, "Login failed");
            if !state.store.fail_login(&pending, reason, duration).await {
                return Err(AuthError::MissingSession);
            }
            jar
        }
    };

    Ok((jar, Redirect::to("/")))
}

/// Logs out the user by deleting their session.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    SessionCookie(session): SessionCookie,
    jar: CookieJar,
) -> impl IntoResponse {
    if let Some(session_id) = session {
        state.store.delete(&session_id).await;
    }

    let remove_session = removal_cookie(state.session_config.cookie_name.clone());

    (jar.add(remove_session), Redirect::to("/"))
}

/// Authentication errors.
#[derive(Debug)]
pub enum AuthError {
    ProviderUnavailable,
    MissingAuthState,
    InvalidAuthState,
    CsrfMismatch,
    MissingSession,
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::ProviderUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Authenticator could not be initialized",
            ),
            Self::MissingAuthState => (StatusCode::BAD_REQUEST, "Missing auth state"),
            Self::InvalidAuthState => (StatusCode::BAD_REQUEST, "Invalid auth state"),
            Self::CsrfMismatch => (StatusCode::BAD_REQUEST, "CSRF token mismatch"),
            Self::MissingSession => (StatusCode::BAD_REQUEST, "Missing session"),
            Self::Internal(msg) => {
                tracing::error!("Login setup failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}
