use crate::config::GoogleConfig;
use crate::error::ProviderError;
use crate::models::{ConsentRequest, TokenGrant};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use tracing::instrument;

pub const SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/youtube.force-ssl",
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait OAuthProvider: Send + Sync {
    /// Consent URL requesting offline access, always prompting for consent.
    fn consent_request(&self) -> ConsentRequest;
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ProviderError>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError>;
}

type GoogleClient = BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Google OAuth 2.0 web-server flow.
pub struct GoogleOAuthClient {
    client: GoogleClient,
    http_client: reqwest::Client,
}

impl GoogleOAuthClient {
    pub fn new(config: &GoogleConfig) -> Result<Self, ProviderError> {
        let auth_url = AuthUrl::new(config.auth_url.clone())
            .map_err(|e| ProviderError::Configuration(format!("auth url: {}", e)))?;
        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| ProviderError::Configuration(format!("token url: {}", e)))?;
        let redirect_url = RedirectUrl::new(config.redirect_uri.clone())
            .map_err(|e| ProviderError::Configuration(format!("redirect uri: {}", e)))?;

        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        let http_client = reqwest::Client::builder()
            // The token endpoint must not redirect us elsewhere.
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            http_client,
        })
    }
}

fn grant_from(response: BasicTokenResponse) -> TokenGrant {
    let lifetime = response
        .expires_in()
        .and_then(|d| Duration::from_std(d).ok())
        .unwrap_or_else(|| Duration::seconds(DEFAULT_EXPIRES_IN_SECS));

    TokenGrant {
        access_token: response.access_token().secret().to_string(),
        refresh_token: response.refresh_token().map(|t| t.secret().to_string()),
        expires_at: Utc::now() + lifetime,
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuthClient {
    fn consent_request(&self) -> ConsentRequest {
        let (url, state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(SCOPES.iter().map(|s| Scope::new(s.to_string())))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .add_extra_param("include_granted_scopes", "true")
            .url();

        ConsentRequest {
            url: url.to_string(),
            state: state.secret().to_string(),
        }
    }

    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ProviderError> {
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| ProviderError::TokenExchange(e.to_string()))?;

        tracing::debug!(
            has_refresh_token = response.refresh_token().is_some(),
            "authorization code exchanged"
        );
        Ok(grant_from(response))
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError> {
        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| ProviderError::TokenExchange(e.to_string()))?;

        Ok(grant_from(response))
    }
}
