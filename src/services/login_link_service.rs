use crate::error::{AppError, Result};
use crate::models::{ProviderProfile, User};
use crate::repositories::{NewUser, UserRepository};
use crate::services::oauth_service::OAuthProvider;
use crate::youtube_api::YouTubeApi;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

const LINK_PREFIX: &str = "link-";
const MASTER_PREFIX: &str = "master-";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginLink {
    pub login_id: String,
    pub login_link: String,
    pub is_master_link: bool,
}

/// The login id the consent was started for, and where to send the browser.
#[derive(Debug, Clone)]
pub struct LoginStart {
    pub login_id: String,
    pub auth_url: String,
    pub state: String,
}

/// Issues login links and binds OAuth completions to exactly one user record.
pub struct LoginLinkService {
    user_repository: Arc<dyn UserRepository>,
    oauth: Arc<dyn OAuthProvider>,
    youtube: Arc<dyn YouTubeApi>,
}

impl LoginLinkService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        oauth: Arc<dyn OAuthProvider>,
        youtube: Arc<dyn YouTubeApi>,
    ) -> Self {
        Self {
            user_repository,
            oauth,
            youtube,
        }
    }

    pub async fn generate_link(&self, base_url: &str) -> Result<LoginLink> {
        self.issue(base_url, false).await
    }

    /// A reusable link; every visit mints a fresh per-user identity.
    pub async fn generate_master_link(&self, base_url: &str) -> Result<LoginLink> {
        self.issue(base_url, true).await
    }

    async fn issue(&self, base_url: &str, is_master_link: bool) -> Result<LoginLink> {
        let prefix = if is_master_link { MASTER_PREFIX } else { LINK_PREFIX };
        let user = self
            .user_repository
            .create_user(NewUser {
                login_id: format!("{}{}", prefix, Uuid::new_v4()),
                is_master_link,
                master_link_id: None,
            })
            .await?;

        tracing::info!(login_id = %user.login_id, is_master_link, "login link issued");
        Ok(LoginLink {
            login_link: format!("{}/auth/login/{}", base_url.trim_end_matches('/'), user.login_id),
            login_id: user.login_id,
            is_master_link,
        })
    }

    #[instrument(skip(self))]
    pub async fn begin_login(&self, login_id: &str) -> Result<LoginStart> {
        let user = self
            .user_repository
            .find_by_login_id(login_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Login link".to_string()))?;

        let effective_login_id = if user.is_master_link {
            let child = self
                .user_repository
                .create_user(NewUser {
                    login_id: format!("{}{}", LINK_PREFIX, Uuid::new_v4()),
                    is_master_link: false,
                    master_link_id: Some(user.login_id.clone()),
                })
                .await?;
            tracing::debug!(master = %user.login_id, child = %child.login_id, "minted user from master link");
            child.login_id
        } else {
            user.login_id
        };

        let consent = self.oauth.consent_request();
        Ok(LoginStart {
            login_id: effective_login_id,
            auth_url: consent.url,
            state: consent.state,
        })
    }

    /// Exchanges the code and stores the credentials. Returns the user that
    /// now holds them, which is an existing record when the same YouTube
    /// account already authorized through another link.
    #[instrument(skip(self, code))]
    pub async fn complete_login(&self, login_id: &str, code: &str) -> Result<User> {
        let pending = self
            .user_repository
            .find_by_login_id(login_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Login link".to_string()))?;
        if pending.is_master_link {
            return Err(AppError::Validation(
                "Master links cannot be authorized directly".to_string(),
            ));
        }

        let grant = self.oauth.exchange_code(code).await?;

        let channel = self
            .youtube
            .my_channel(&grant.access_token)
            .await?
            .ok_or_else(|| AppError::NotFound("YouTube channel for this account".to_string()))?;

        let email = match self.youtube.my_email(&grant.access_token).await {
            Ok(email) => email,
            Err(e) => {
                tracing::warn!(error = %e, "could not read account email");
                None
            }
        };

        let target = match self.user_repository.find_by_youtube_id(&channel.id).await? {
            Some(existing) if existing.id != pending.id => {
                tracing::info!(
                    login_id = %pending.login_id,
                    existing = %existing.login_id,
                    "account already known, updating existing record"
                );
                existing
            }
            _ => pending,
        };

        let profile = ProviderProfile {
            youtube_id: channel.id,
            name: channel.title,
            email,
            profile_picture: channel.thumbnail_url,
        };
        self.user_repository
            .save_authorization(target.id, grant, profile, Utc::now())
            .await?;

        let user = self
            .user_repository
            .find_by_id(target.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        tracing::info!(user_id = user.id, login_id = %user.login_id, "user authorized");
        Ok(user)
    }
}
