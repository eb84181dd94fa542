use crate::error::{AppError, Result};
use crate::models::User;
use crate::repositories::UserRepository;
use crate::services::oauth_service::OAuthProvider;
use chrono::Utc;
use std::sync::Arc;

/// Hands out usable access tokens, refreshing expired ones at most once per call.
pub struct TokenManager {
    oauth: Arc<dyn OAuthProvider>,
    user_repository: Arc<dyn UserRepository>,
}

impl TokenManager {
    pub fn new(oauth: Arc<dyn OAuthProvider>, user_repository: Arc<dyn UserRepository>) -> Self {
        Self {
            oauth,
            user_repository,
        }
    }

    /// Returns a valid access token for `user`, updating both the store and
    /// `user` itself when a refresh happens. A failed refresh leaves both untouched.
    pub async fn valid_access_token(&self, user: &mut User) -> Result<String> {
        let Some(access_token) = user.access_token.clone() else {
            return Err(AppError::AuthenticationRequired);
        };

        if !user.token_expired_at(Utc::now()) {
            return Ok(access_token);
        }

        let Some(refresh_token) = user.refresh_token.as_deref() else {
            tracing::warn!(user_id = user.id, "access token expired and no refresh token stored");
            return Err(AppError::TokenRefreshFailed(
                "no refresh token available".to_string(),
            ));
        };

        tracing::debug!(user_id = user.id, "refreshing expired access token");
        let grant = self.oauth.refresh(refresh_token).await.map_err(|e| {
            tracing::warn!(user_id = user.id, error = %e, "token refresh failed");
            AppError::TokenRefreshFailed(e.to_string())
        })?;

        self.user_repository
            .update_tokens(
                user.id,
                &grant.access_token,
                grant.refresh_token.clone(),
                grant.expires_at,
            )
            .await?;

        user.access_token = Some(grant.access_token.clone());
        if let Some(rotated) = grant.refresh_token {
            user.refresh_token = Some(rotated);
        }
        user.token_expiry = Some(grant.expires_at);

        Ok(grant.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::models::TokenGrant;
    use crate::repositories::MockUserRepository;
    use crate::services::oauth_service::MockOAuthProvider;
    use chrono::Duration;
    use mockall::predicate::*;

    fn user(expiry_offset_secs: i64, refresh_token: Option<&str>) -> User {
        User {
            id: 7,
            login_id: "link-7".to_string(),
            youtube_id: Some("UCuser".to_string()),
            access_token: Some("old-access".to_string()),
            refresh_token: refresh_token.map(str::to_string),
            token_expiry: Some(Utc::now() + Duration::seconds(expiry_offset_secs)),
            email: None,
            name: Some("Viewer".to_string()),
            profile_picture: None,
            is_authorized: true,
            is_master_link: false,
            master_link_id: None,
            last_login: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_unexpired_token_is_returned_without_refresh() {
        let mut oauth = MockOAuthProvider::new();
        oauth.expect_refresh().times(0);
        let mut repo = MockUserRepository::new();
        repo.expect_update_tokens().times(0);

        let manager = TokenManager::new(Arc::new(oauth), Arc::new(repo));
        let mut user = user(600, Some("refresh"));

        let token = manager.valid_access_token(&mut user).await.unwrap();
        assert_eq!(token, "old-access");
    }

    #[tokio::test]
    async fn test_missing_expiry_counts_as_valid() {
        let mut oauth = MockOAuthProvider::new();
        oauth.expect_refresh().times(0);

        let manager = TokenManager::new(Arc::new(oauth), Arc::new(MockUserRepository::new()));
        let mut user = user(600, None);
        user.token_expiry = None;

        assert_eq!(manager.valid_access_token(&mut user).await.unwrap(), "old-access");
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_rotation_persisted() {
        let expires_at = Utc::now() + Duration::seconds(3600);
        let mut oauth = MockOAuthProvider::new();
        oauth
            .expect_refresh()
            .with(eq("refresh"))
            .times(1)
            .returning(move |_| {
                Box::pin(async move {
                    Ok(TokenGrant {
                        access_token: "new-access".to_string(),
                        refresh_token: Some("rotated".to_string()),
                        expires_at,
                    })
                })
            });

        let mut repo = MockUserRepository::new();
        repo.expect_update_tokens()
            .with(
                eq(7),
                eq("new-access"),
                eq(Some("rotated".to_string())),
                eq(expires_at),
            )
            .times(1)
            .returning(|_, _, _, _| Box::pin(async move { Ok(()) }));

        let manager = TokenManager::new(Arc::new(oauth), Arc::new(repo));
        let mut user = user(-10, Some("refresh"));

        let token = manager.valid_access_token(&mut user).await.unwrap();
        assert_eq!(token, "new-access");
        assert_eq!(user.access_token.as_deref(), Some("new-access"));
        assert_eq!(user.refresh_token.as_deref(), Some("rotated"));
        assert_eq!(user.token_expiry, Some(expires_at));
    }

    #[tokio::test]
    async fn test_refresh_without_rotation_keeps_refresh_token() {
        let mut oauth = MockOAuthProvider::new();
        oauth.expect_refresh().times(1).returning(|_| {
            Box::pin(async move {
                Ok(TokenGrant {
                    access_token: "new-access".to_string(),
                    refresh_token: None,
                    expires_at: Utc::now() + Duration::seconds(3600),
                })
            })
        });

        let mut repo = MockUserRepository::new();
        repo.expect_update_tokens()
            .withf(|_, _, refresh, _| refresh.is_none())
            .times(1)
            .returning(|_, _, _, _| Box::pin(async move { Ok(()) }));

        let manager = TokenManager::new(Arc::new(oauth), Arc::new(repo));
        let mut user = user(-10, Some("refresh"));

        manager.valid_access_token(&mut user).await.unwrap();
        assert_eq!(user.refresh_token.as_deref(), Some("refresh"));
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_credentials_untouched() {
        let mut oauth = MockOAuthProvider::new();
        oauth.expect_refresh().times(1).returning(|_| {
            Box::pin(async move { Err(ProviderError::TokenExchange("invalid_grant".to_string())) })
        });
        let mut repo = MockUserRepository::new();
        repo.expect_update_tokens().times(0);

        let manager = TokenManager::new(Arc::new(oauth), Arc::new(repo));
        let mut user = user(-10, Some("refresh"));
        let expiry = user.token_expiry;

        let result = manager.valid_access_token(&mut user).await;
        assert!(matches!(result, Err(AppError::TokenRefreshFailed(_))));
        assert_eq!(user.access_token.as_deref(), Some("old-access"));
        assert_eq!(user.token_expiry, expiry);
    }

    #[tokio::test]
    async fn test_expired_without_refresh_token_fails() {
        let mut oauth = MockOAuthProvider::new();
        oauth.expect_refresh().times(0);

        let manager = TokenManager::new(Arc::new(oauth), Arc::new(MockUserRepository::new()));
        let mut user = user(-10, None);

        let result = manager.valid_access_token(&mut user).await;
        assert!(matches!(result, Err(AppError::TokenRefreshFailed(_))));
    }

    #[tokio::test]
    async fn test_user_without_access_token_requires_authentication() {
        let manager = TokenManager::new(
            Arc::new(MockOAuthProvider::new()),
            Arc::new(MockUserRepository::new()),
        );
        let mut user = user(600, Some("refresh"));
        user.access_token = None;

        let result = manager.valid_access_token(&mut user).await;
        assert!(matches!(result, Err(AppError::AuthenticationRequired)));
    }
}
