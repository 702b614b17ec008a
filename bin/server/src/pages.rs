//! Page components and the handlers that render them.
//!
//! Every page render runs the authorization gate first and picks one
//! component from its decision.

pub mod home;
pub mod login;

pub use home::HomePage;
pub use login::{AccessDeniedPage, AuthenticatorUnavailablePage, LoginPage};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use balloon_gate_access::Decision;
use leptos::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::{AppState, RequireAuthorized, SessionCookie, routes::removal_cookie};

/// Query parameters for the home page.
#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    #[serde(default)]
    balloons: bool,
}

/// Renders a page body inside the HTML document shell.
fn render(body: impl IntoView + 'static) -> Html<String> {
    let owner = Owner::new();
    let html = owner.with(|| {
        view! {
            <!DOCTYPE html>
            <html lang="en">
                <head>
                    <meta charset="utf-8"/>
                    <meta name="viewport" content="width=device-width, initial-scale=1"/>
                    <title>"Protected App"</title>
                </head>
                <body>{body}</body>
            </html>
        }
        .to_html()
    });
    Html(html)
}

/// Renders the home page for whatever state the browser's session is in.
pub async fn home(
    State(state): State<Arc<AppState>>,
    SessionCookie(session): SessionCookie,
    Query(query): Query<HomeQuery>,
    jar: CookieJar,
) -> Response {
    let decision = state.gate.enforce(&state.store, session.as_ref()).await;

    match decision {
        Decision::AuthenticatedAuthorized(identity) => {
            render(view! { <HomePage identity=identity show_balloons=query.balloons/> })
                .into_response()
        }
        Decision::AuthenticatedUnauthorized(reason) => {
            let jar = jar.add(removal_cookie(state.session_config.cookie_name.clone()));
            (
                StatusCode::FORBIDDEN,
                jar,
                render(view! { <AccessDeniedPage reason=reason/> }),
            )
                .into_response()
        }
        Decision::Unauthenticated | Decision::AuthenticationFailed
            if state.login_provider.is_none() =>
        {
            render(view! { <AuthenticatorUnavailablePage/> }).into_response()
        }
        Decision::AuthenticationFailed => {
            render(view! { <LoginPage failed=true/> }).into_response()
        }
        Decision::Unauthenticated => render(view! { <LoginPage failed=false/> }).into_response(),
    }
}

/// Renders the home page with balloons for an allow-listed user.
pub async fn balloons(RequireAuthorized(identity): RequireAuthorized) -> Html<String> {
    render(view! { <HomePage identity=identity show_balloons=true/> })
}
