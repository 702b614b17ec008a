//! Error types for the access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ConfigLoadError`: the allow-list source is missing or malformed
//! - `IdentityProviderError`: the identity provider failed during login,
//!   session lookup or logout
//! - `MissingIdentityField`: an authenticated identity lacks a field the
//!   gate needs

use std::fmt;

/// Errors from loading access configuration.
///
/// None of these are fatal. Callers fall back to an empty allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLoadError {
    /// The configuration source does not exist.
    MissingSource { path: String },
    /// The configuration source exists but could not be parsed.
    Malformed { path: String, reason: String },
}

impl fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSource { path } => {
                write!(f, "configuration file not found at {path}")
            }
            Self::Malformed { path, reason } => {
                write!(f, "configuration file {path} is malformed: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigLoadError {}

/// Errors raised by an identity-provider client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityProviderError {
    /// Invalid provider configuration (URLs, credentials).
    Configuration { reason: String },
    /// Provider metadata discovery failed.
    Discovery { reason: String },
    /// Exchanging the authorization code for tokens failed.
    TokenExchange { reason: String },
    /// The returned ID token did not validate.
    TokenValidation { reason: String },
    /// Fetching the user profile failed.
    UserInfo { reason: String },
    /// The session store could not be read or updated.
    SessionStore { reason: String },
}

impl fmt::Display for IdentityProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { reason } => {
                write!(f, "identity provider configuration error: {reason}")
            }
            Self::Discovery { reason } => {
                write!(f, "identity provider discovery failed: {reason}")
            }
            Self::TokenExchange { reason } => {
                write!(f, "token exchange failed: {reason}")
            }
            Self::TokenValidation { reason } => {
                write!(f, "token validation failed: {reason}")
            }
            Self::UserInfo { reason } => {
                write!(f, "user info request failed: {reason}")
            }
            Self::SessionStore { reason } => {
                write!(f, "session store error: {reason}")
            }
        }
    }
}

impl std::error::Error for IdentityProviderError {}

/// An authenticated identity is missing a field the gate depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingIdentityField {
    /// Name of the missing field.
    pub field: &'static str,
}

impl fmt::Display for MissingIdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "authenticated identity has no {}", self.field)
    }
}

impl std::error::Error for MissingIdentityField {}
