use crate::error::{AppError, Result};
use crate::models::{AuthorizationStatus, SubscriptionRecord, User, UserDetails, UserProfile};
use crate::repositories::UserRepository;
use serde::Serialize;
use std::sync::Arc;

pub const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    async fn by_login_id(&self, login_id: &str) -> Result<User> {
        self.repository
            .find_by_login_id(login_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    pub async fn status(&self, login_id: &str) -> Result<AuthorizationStatus> {
        let user = self.by_login_id(login_id).await?;
        Ok(AuthorizationStatus {
            is_authorized: user.is_authorized,
            name: user.name,
            profile_picture: user.profile_picture,
        })
    }

    pub async fn profile(&self, login_id: &str) -> Result<UserProfile> {
        let user = self.by_login_id(login_id).await?;
        let subscription_history = self.repository.subscription_history(user.id).await?;
        Ok(UserProfile {
            name: user.name,
            profile_picture: user.profile_picture,
            is_authorized: user.is_authorized,
            subscription_history,
        })
    }

    pub async fn subscriptions(&self, login_id: &str) -> Result<Vec<SubscriptionRecord>> {
        let user = self.by_login_id(login_id).await?;
        Ok(self.repository.subscription_history(user.id).await?)
    }

    /// Drops stored credentials; the record and its history stay.
    pub async fn revoke(&self, login_id: &str) -> Result<()> {
        let user = self.by_login_id(login_id).await?;
        self.repository.revoke(user.id).await?;
        tracing::info!(user_id = user.id, "authorization revoked");
        Ok(())
    }

    pub async fn list(&self, page: i64, limit: i64, search: Option<String>) -> Result<UserPage> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        let users = self
            .repository
            .list_users(search.clone(), limit, (page - 1) * limit)
            .await?;
        let total = self.repository.count_users(search).await?;

        Ok(UserPage {
            users,
            total,
            page,
            limit,
            total_pages: (total + limit - 1) / limit,
        })
    }

    pub async fn details(&self, id: i64) -> Result<UserDetails> {
        let user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;
        let subscription_history = self.repository.subscription_history(id).await?;
        Ok(UserDetails {
            user,
            subscription_history,
        })
    }

    pub async fn count_users(&self) -> Result<i64> {
        Ok(self.repository.count_users(None).await?)
    }

    pub async fn count_authorized(&self) -> Result<i64> {
        Ok(self.repository.count_authorized().await?)
    }
}
