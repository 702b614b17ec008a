//! OAuth2 / OIDC client configuration.
//!
//! The same settings drive both identity-provider variants: discovery
//! based OIDC against `issuer_url`, and the Google OAuth helper that uses
//! fixed Google endpoints.

use serde::{Deserialize, Serialize};

/// Default redirect URI for local development.
pub const LOCAL_REDIRECT_URI: &str = "http://localhost:8501/auth/callback";

/// Configuration for the identity provider.
///
/// Every field can be omitted when loading from environment variables.
/// Missing credentials load as empty strings; providers refuse to start
/// with them, see [`OidcConfig::has_credentials`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    /// The OIDC issuer URL, used for discovery.
    /// Default: "https://accounts.google.com"
    #[serde(default = "default_issuer_url")]
    issuer_url: String,
    /// The OAuth2 client ID registered with the provider.
    #[serde(default)]
    client_id: String,
    /// The OAuth2 client secret.
    #[serde(default)]
    client_secret: String,
    /// The redirect URI for the OAuth2 callback.
    #[serde(default = "default_redirect_uri")]
    redirect_uri: String,
    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "openid,email,profile"
    #[serde(default = "default_scopes")]
    scopes: String,
}

fn default_issuer_url() -> String {
    "https://accounts.google.com".to_string()
}

fn default_redirect_uri() -> String {
    LOCAL_REDIRECT_URI.to_string()
}

fn default_scopes() -> String {
    "openid,email,profile".to_string()
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self::new(String::new(), String::new(), default_redirect_uri())
    }
}

impl OidcConfig {
    /// Creates a configuration for Google with default scopes.
    #[must_use]
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            issuer_url: default_issuer_url(),
            client_id,
            client_secret,
            redirect_uri,
            scopes: default_scopes(),
        }
    }

    /// Overrides the issuer URL.
    #[must_use]
    pub fn with_issuer_url(mut self, issuer_url: String) -> Self {
        self.issuer_url = issuer_url;
        self
    }

    /// Returns the OIDC issuer URL.
    #[must_use]
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the OAuth2 redirect URI.
    #[must_use]
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Returns true if both the client ID and secret are set.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }

    /// Returns true if the redirect URI is still the local default.
    #[must_use]
    pub fn uses_local_redirect(&self) -> bool {
        self.redirect_uri.is_empty() || self.redirect_uri == LOCAL_REDIRECT_URI
    }

    /// Returns the OAuth2 scopes to request, parsed from the
    /// comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}
