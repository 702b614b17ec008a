//! Centralized server configuration.
//!
//! Server settings are loaded via the `config` crate from environment
//! variables. The allow-list lives in its own file, also read through
//! `config`, in the shape:
//!
//! ```yaml
//! preauthorized:
//!   emails:
//!     - alice@example.com
//! ```
//!
//! See [`OidcConfig`](balloon_gate_access::OidcConfig) for identity
//! provider settings.

use balloon_gate_access::{AllowList, ConfigLoadError, OidcConfig};
use rootcause::prelude::Report;
use serde::Deserialize;
use std::path::Path;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Which identity-provider variant to use.
    #[serde(default)]
    pub provider: ProviderKind,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Identity provider configuration. Missing credentials leave the
    /// server running without a login provider.
    #[serde(default)]
    pub oidc: OidcConfig,

    /// Allow-list configuration.
    #[serde(default)]
    pub access: AccessConfig,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8501".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            provider: ProviderKind::default(),
            session: SessionConfig::default(),
            oidc: OidcConfig::default(),
            access: AccessConfig::default(),
        }
    }
}

/// Identity-provider variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Generic OIDC with provider discovery.
    #[default]
    Oidc,
    /// Google OAuth with fixed endpoints and the userinfo API.
    Google,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Session lifetime in days, clamped to `1..=MAX_EXPIRY_DAYS`.
    #[serde(default = "default_expiry_days")]
    pub expiry_days: i64,

    /// Interval between session cleanup runs, in seconds. Zero is read
    /// as one.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

/// Longest session lifetime accepted, in days.
pub const MAX_EXPIRY_DAYS: i64 = 365;

fn default_cookie_name() -> String {
    "balloon_gate_session".to_string()
}

fn default_expiry_days() -> i64 {
    30
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            expiry_days: default_expiry_days(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

impl SessionConfig {
    fn effective_expiry_days(&self) -> i64 {
        self.expiry_days.clamp(1, MAX_EXPIRY_DAYS)
    }

    /// Session lifetime as a chrono duration.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::days(self.effective_expiry_days())
    }

    /// Session lifetime as a cookie max-age.
    #[must_use]
    pub fn cookie_max_age(&self) -> time::Duration {
        time::Duration::days(self.effective_expiry_days())
    }

    /// Interval between cleanup runs.
    #[must_use]
    pub fn cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cleanup_interval_seconds.max(1))
    }
}

/// Allow-list configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// Path to the allow-list file.
    #[serde(default = "default_allow_list_path")]
    pub allow_list_path: String,
}

fn default_allow_list_path() -> String {
    "config.yaml".to_string()
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            allow_list_path: default_allow_list_path(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::default())
    }

    fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns non-fatal problems worth surfacing at startup.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.oidc.has_credentials() {
            warnings.push(
                "OIDC__CLIENT_ID or OIDC__CLIENT_SECRET is not set; login is disabled".to_string(),
            );
        }

        if self.oidc.uses_local_redirect() {
            warnings.push(format!(
                "redirect URI is not set or is the localhost default ({}); set OIDC__REDIRECT_URI for deployment",
                self.oidc.redirect_uri()
            ));
        }

        if !self.session.secure_cookies && self.oidc.redirect_uri().starts_with("https://") {
            warnings.push(
                "session cookies are not marked Secure although the redirect URI uses https"
                    .to_string(),
            );
        }

        if self.session.expiry_days != self.session.effective_expiry_days() {
            warnings.push(format!(
                "session expiry of {} days is out of range; using {} days",
                self.session.expiry_days,
                self.session.effective_expiry_days()
            ));
        }

        if self.session.cleanup_interval_seconds == 0 {
            warnings.push("session cleanup interval of 0 seconds is raised to 1".to_string());
        }

        warnings
    }
}

/// On-disk shape of the allow-list file.
#[derive(Debug, Deserialize)]
struct AllowListFile {
    preauthorized: Preauthorized,
}

#[derive(Debug, Deserialize)]
struct Preauthorized {
    #[serde(default)]
    emails: Vec<String>,
}

/// Loads the allow-list from a configuration file.
///
/// The format is inferred from the file extension.
///
/// # Errors
///
/// Returns `ConfigLoadError::MissingSource` if the file does not exist and
/// `ConfigLoadError::Malformed` if it cannot be parsed.
pub fn load_allow_list(path: impl AsRef<Path>) -> Result<AllowList, Report<ConfigLoadError>> {
    let path = path.as_ref();
    let display = path.display().to_string();

    if !path.is_file() {
        return Err(ConfigLoadError::MissingSource { path: display }.into());
    }

    let file: AllowListFile = config::Config::builder()
        .add_source(config::File::from(path))
        .build()
        .and_then(config::Config::try_deserialize)
        .map_err(|e| ConfigLoadError::Malformed {
            path: display,
            reason: e.to_string(),
        })?;

    Ok(file.preauthorized.emails.into_iter().collect())
}

/// Loads the allow-list, falling back to an empty list on any error.
///
/// An empty list authorizes nobody, so a broken configuration locks
/// everyone out instead of letting everyone in.
pub fn load_allow_list_or_empty(path: impl AsRef<Path>) -> AllowList {
    match load_allow_list(path) {
        Ok(allow_list) => {
            tracing::info!(entries = allow_list.len(), "Loaded allow-list");
            allow_list
        }
        Err(report) => {
            tracing::warn!(
                error = %report,
                "Could not load allow-list; continuing with an empty list"
            );
            AllowList::empty()
        }
    }
}
