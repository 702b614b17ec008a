//! Authentication extractors for Axum.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use balloon_gate_access::{Decision, Identity};
use balloon_gate_core::SessionId;
use std::sync::Arc;

use super::AppState;

/// Extractor for the browser's session ID, if it sent a valid one.
///
/// A cookie that does not parse as a session ID is treated as absent.
pub struct SessionCookie(pub Option<SessionId>);

impl<S> FromRequestParts<S> for SessionCookie
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthRejection::InternalError)?;

        let session = jar
            .get(&app_state.session_config.cookie_name)
            .and_then(|cookie| cookie.value().parse::<SessionId>().ok());

        Ok(SessionCookie(session))
    }
}

/// Extractor for requiring an allow-listed user.
///
/// Runs the authorization gate, so a user who is authenticated but not on
/// the allow-list is logged out here just as on the home page.
pub struct RequireAuthorized(pub Identity);

impl<S> FromRequestParts<S> for RequireAuthorized
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let SessionCookie(session) = SessionCookie::from_request_parts(parts, state).await?;

        match app_state
            .gate
            .enforce(&app_state.store, session.as_ref())
            .await
        {
            Decision::AuthenticatedAuthorized(identity) => Ok(RequireAuthorized(identity)),
            Decision::AuthenticatedUnauthorized(_) => Err(AuthRejection::NotAuthorized),
            Decision::Unauthenticated | Decision::AuthenticationFailed => {
                Err(AuthRejection::NotAuthenticated)
            }
        }
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated,
    NotAuthorized,
    InternalError,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated | Self::NotAuthorized => Redirect::to("/").into_response(),
            Self::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
