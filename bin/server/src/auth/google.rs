//! Google OAuth login provider.
//!
//! Uses Google's fixed OAuth endpoints through the oauth2 crate and reads
//! the user's profile from the userinfo endpoint, without OIDC discovery.

use async_trait::async_trait;
use balloon_gate_access::{Identity, IdentityProviderError, OidcConfig};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl, basic::BasicClient,
};
use rootcause::prelude::Report;
use serde::Deserialize;

use super::{AuthState, LoginProvider, verified_email};

/// Google OAuth authorization URL.
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth token URL.
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google userinfo URL.
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Profile returned by the userinfo endpoint.
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleUserInfo {
    fn into_identity(self) -> Identity {
        let email = verified_email(self.email, self.email_verified);
        let display_name = self
            .name
            .or_else(|| email.clone())
            .unwrap_or(self.sub);
        Identity::new(display_name)
            .with_email(email)
            .with_avatar_url(self.picture)
    }
}

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    scopes: Vec<String>,
}

impl GoogleOAuthClient {
    /// Creates a new Google OAuth client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing or the redirect URI is
    /// invalid.
    pub fn new(config: &OidcConfig) -> Result<Self, Report<IdentityProviderError>> {
        if !config.has_credentials() {
            return Err(IdentityProviderError::Configuration {
                reason: "Google client ID or secret is empty".to_string(),
            }
            .into());
        }

        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string()).map_err(|e| {
            IdentityProviderError::Configuration {
                reason: format!("invalid redirect URI: {e}"),
            }
        })?;
        let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string()).map_err(|e| {
            IdentityProviderError::Configuration {
                reason: format!("invalid auth URL: {e}"),
            }
        })?;
        let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string()).map_err(|e| {
            IdentityProviderError::Configuration {
                reason: format!("invalid token URL: {e}"),
            }
        })?;

        Ok(Self {
            client_id: ClientId::new(config.client_id().to_string()),
            client_secret: ClientSecret::new(config.client_secret().to_string()),
            auth_url,
            token_url,
            redirect_url,
            scopes: config.scopes().into_iter().map(str::to_string).collect(),
        })
    }

    async fn fetch_user_info(
        &self,
        http_client: &reqwest::Client,
        access_token: &str,
    ) -> Result<GoogleUserInfo, Report<IdentityProviderError>> {
        let response = http_client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityProviderError::UserInfo {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(IdentityProviderError::UserInfo {
                reason: format!("userinfo returned {}", response.status()),
            }
            .into());
        }

        Ok(response
            .json::<GoogleUserInfo>()
            .await
            .map_err(|e| IdentityProviderError::UserInfo {
                reason: e.to_string(),
            })?)
    }
}

#[async_trait]
impl LoginProvider for GoogleOAuthClient {
    fn authorization_url(&self) -> (String, AuthState) {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge);

        for scope in &self.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_token) = auth_request.url();

        let state = AuthState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            nonce: None,
        };

        (auth_url.to_string(), state)
    }

    async fn complete(
        &self,
        code: &str,
        state: &AuthState,
    ) -> Result<Identity, Report<IdentityProviderError>> {
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| IdentityProviderError::Configuration {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let token_result = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(state.pkce_verifier.clone()))
            .request_async(&http_client)
            .await
            .map_err(|e| IdentityProviderError::TokenExchange {
                reason: e.to_string(),
            })?;

        let user_info = self
            .fetch_user_info(&http_client, token_result.access_token().secret())
            .await?;

        tracing::info!(subject = %user_info.sub, "Google login completed");

        Ok(user_info.into_identity())
    }
}
