//! balloon-gate web server.
//!
//! Serves a small demo page behind Google login and an email allow-list.
//! Login establishes identity; the allow-list decides access on every
//! page render.

#![allow(non_snake_case)]

pub mod auth;
pub mod config;
pub mod pages;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use auth::AppState;

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/balloons", get(pages::balloons))
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", get(auth::logout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
