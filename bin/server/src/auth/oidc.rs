//! OIDC login provider using the openidconnect crate.

use async_trait::async_trait;
use balloon_gate_access::{Identity, IdentityProviderError, OidcConfig};
use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreProviderMetadata};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointMaybeSet, EndpointNotSet,
    EndpointSet, IssuerUrl, Nonce, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope,
    TokenResponse,
};
use rootcause::prelude::Report;

use super::{AuthState, LoginProvider, verified_email};

/// A client built from discovered metadata: the auth URL is always set,
/// the token and userinfo URLs only if the provider advertises them.
type DiscoveredClient = CoreClient<
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointMaybeSet,
    EndpointMaybeSet,
>;

/// OIDC client for authenticating users against a discovered provider.
pub struct OidcClient {
    provider_metadata: CoreProviderMetadata,
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_url: RedirectUrl,
    config: OidcConfig,
}

impl OidcClient {
    /// Creates a new OIDC client by discovering the provider metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing, the configured URLs are
    /// invalid or discovery fails.
    pub async fn discover(config: OidcConfig) -> Result<Self, Report<IdentityProviderError>> {
        if !config.has_credentials() {
            return Err(IdentityProviderError::Configuration {
                reason: "OIDC client ID or secret is empty".to_string(),
            }
            .into());
        }

        let issuer_url = IssuerUrl::new(config.issuer_url().to_string()).map_err(|e| {
            IdentityProviderError::Configuration {
                reason: format!("invalid issuer URL: {e}"),
            }
        })?;

        let http_client = http_client()?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
            .await
            .map_err(|e| IdentityProviderError::Discovery {
                reason: e.to_string(),
            })?;

        let redirect_url = RedirectUrl::new(config.redirect_uri().to_string()).map_err(|e| {
            IdentityProviderError::Configuration {
                reason: format!("invalid redirect URI: {e}"),
            }
        })?;

        let client_id = ClientId::new(config.client_id().to_string());
        let client_secret = ClientSecret::new(config.client_secret().to_string());

        Ok(Self {
            provider_metadata,
            client_id,
            client_secret,
            redirect_url,
            config,
        })
    }

    fn client(&self) -> DiscoveredClient {
        CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone())
    }
}

fn http_client() -> Result<reqwest::Client, Report<IdentityProviderError>> {
    Ok(reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| IdentityProviderError::Configuration {
            reason: format!("failed to create HTTP client: {e}"),
        })?)
}

#[async_trait]
impl LoginProvider for OidcClient {
    fn authorization_url(&self) -> (String, AuthState) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let client = self.client();
        let mut auth_request = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        for scope in self.config.scopes() {
            auth_request = auth_request.add_scope(Scope::new(scope.to_string()));
        }

        let (auth_url, csrf_token, nonce) = auth_request.url();

        let state = AuthState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            nonce: Some(nonce.secret().clone()),
        };

        (auth_url.to_string(), state)
    }

    async fn complete(
        &self,
        code: &str,
        state: &AuthState,
    ) -> Result<Identity, Report<IdentityProviderError>> {
        let client = self.client();
        let http_client = http_client()?;

        let token_response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| IdentityProviderError::TokenExchange {
                reason: format!("token endpoint error: {e}"),
            })?
            .set_pkce_verifier(PkceCodeVerifier::new(state.pkce_verifier.clone()))
            .request_async(&http_client)
            .await
            .map_err(|e| IdentityProviderError::TokenExchange {
                reason: e.to_string(),
            })?;

        let id_token =
            token_response
                .id_token()
                .ok_or_else(|| IdentityProviderError::TokenExchange {
                    reason: "no ID token in response".to_string(),
                })?;

        let nonce = Nonce::new(state.nonce.clone().unwrap_or_default());
        let claims = id_token
            .claims(&client.id_token_verifier(), &nonce)
            .map_err(|e| IdentityProviderError::TokenValidation {
                reason: e.to_string(),
            })?;

        let email = verified_email(
            claims.email().map(|e| e.as_str().to_string()),
            claims.email_verified(),
        );
        let display_name = claims
            .name()
            .and_then(|n| n.get(None))
            .map(|n| n.as_str().to_string())
            .or_else(|| email.clone())
            .unwrap_or_else(|| claims.subject().to_string());
        let avatar_url = claims
            .picture()
            .and_then(|p| p.get(None))
            .map(|p| p.as_str().to_string());

        tracing::info!(subject = claims.subject().as_str(), "OIDC login completed");

        Ok(Identity::new(display_name)
            .with_email(email)
            .with_avatar_url(avatar_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use balloon_gate_access::oidc::LOCAL_REDIRECT_URI;

    #[tokio::test]
    async fn discover_rejects_missing_credentials() {
        let config = OidcConfig::new(
            "client-123".to_string(),
            String::new(),
            LOCAL_REDIRECT_URI.to_string(),
        );

        let report = OidcClient::discover(config)
            .await
            .err()
            .expect("empty secret is rejected");

        assert!(report.to_string().contains("empty"));
    }
}
