use crate::error::{AppError, Result};
use crate::models::{
    Campaign, CampaignDetails, CreateCampaignRequest, ExecutionSummary, NewCampaign,
};
use crate::repositories::{CampaignRepository, UserRepository};
use crate::services::channel_resolver::{ChannelLocator, ChannelResolver};
use crate::services::subscription_executor::SubscriptionExecutor;
use crate::services::token_manager::TokenManager;
use crate::youtube_api::YouTubeApi;
use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// A page of campaigns with the paging numbers the admin UI needs.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPage {
    pub campaigns: Vec<Campaign>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

pub struct CampaignService {
    campaign_repository: Arc<dyn CampaignRepository>,
    user_repository: Arc<dyn UserRepository>,
    youtube: Arc<dyn YouTubeApi>,
    resolver: ChannelResolver,
    tokens: Arc<TokenManager>,
    executor: Arc<SubscriptionExecutor>,
}

impl CampaignService {
    pub fn new(
        campaign_repository: Arc<dyn CampaignRepository>,
        user_repository: Arc<dyn UserRepository>,
        youtube: Arc<dyn YouTubeApi>,
        tokens: Arc<TokenManager>,
        executor: Arc<SubscriptionExecutor>,
    ) -> Self {
        Self {
            campaign_repository,
            user_repository,
            resolver: ChannelResolver::new(youtube.clone()),
            youtube,
            tokens,
            executor,
        }
    }

    /// Resolves the channel with a borrowed user token and stores a pending campaign.
    #[instrument(skip(self, request), fields(channel_url = %request.channel_url))]
    pub async fn create(
        &self,
        request: CreateCampaignRequest,
        created_by: Option<String>,
    ) -> Result<Campaign> {
        request.validate()?;
        let channel_url = request.channel_url.trim().to_string();
        let locator = ChannelLocator::parse(&channel_url)?;

        let mut borrower = self
            .user_repository
            .find_any_authorized()
            .await?
            .ok_or_else(|| {
                AppError::Validation(
                    "At least one authorized user is required to look up channels".to_string(),
                )
            })?;
        let token = self.tokens.valid_access_token(&mut borrower).await?;

        let channel_id = self.resolver.resolve_locator(&locator, &token).await?;
        let info = self
            .youtube
            .channel_info(&token, &channel_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Channel".to_string()))?;

        let campaign = self
            .campaign_repository
            .create(NewCampaign {
                channel_id: info.id,
                channel_name: info.title,
                channel_url,
                thumbnail_url: info.thumbnail_url,
                subscriber_count: info.subscriber_count,
                target_subscribers: request.target_subscribers,
                created_by,
            })
            .await?;

        tracing::info!(campaign_id = campaign.id, channel_id = %campaign.channel_id, "campaign created");
        Ok(campaign)
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, id: i64) -> Result<ExecutionSummary> {
        let campaign = self.get_campaign(id).await?;

        if !campaign.status.can_start()
            || !self.campaign_repository.begin_execution(id).await?
        {
            return Err(AppError::Conflict(format!(
                "Campaign cannot be executed while {}",
                campaign.status.as_str()
            )));
        }

        // Detached from the request so a dropped caller cannot strand the status.
        let run = tokio::spawn(run_campaign(
            self.campaign_repository.clone(),
            self.user_repository.clone(),
            self.executor.clone(),
            campaign,
        ));

        match run.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(campaign_id = id, error = %e, "campaign run aborted");
                mark_failed(self.campaign_repository.as_ref(), id).await;
                Err(AppError::Internal(format!("campaign run aborted: {}", e)))
            }
        }
    }

    pub async fn get(&self, id: i64) -> Result<CampaignDetails> {
        let campaign = self.get_campaign(id).await?;
        let subscribers = self.campaign_repository.subscribers(id).await?;
        Ok(CampaignDetails {
            campaign,
            subscribers,
        })
    }

    async fn get_campaign(&self, id: i64) -> Result<Campaign> {
        self.campaign_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Campaign".to_string()))
    }

    pub async fn list(&self, page: i64, limit: i64) -> Result<CampaignPage> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        let campaigns = self
            .campaign_repository
            .list(limit, (page - 1) * limit)
            .await?;
        let total = self.campaign_repository.count().await?;

        Ok(CampaignPage {
            campaigns,
            total,
            page,
            limit,
            total_pages: (total + limit - 1) / limit,
        })
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<Campaign>> {
        Ok(self.campaign_repository.list(limit, 0).await?)
    }
}

async fn run_campaign(
    campaign_repository: Arc<dyn CampaignRepository>,
    user_repository: Arc<dyn UserRepository>,
    executor: Arc<SubscriptionExecutor>,
    campaign: Campaign,
) -> Result<ExecutionSummary> {
    let id = campaign.id;
    let users = match user_repository.list_authorized().await {
        Ok(users) => users,
        Err(e) => {
            tracing::error!(campaign_id = id, error = %e, "failed to load authorized users");
            mark_failed(campaign_repository.as_ref(), id).await;
            return Err(e.into());
        }
    };

    tracing::info!(campaign_id = id, users = users.len(), "executing campaign");
    let summary = executor.run(&campaign, users).await;

    if let Err(e) = campaign_repository.complete(id, Utc::now()).await {
        tracing::error!(campaign_id = id, error = %e, "failed to finalize campaign");
        mark_failed(campaign_repository.as_ref(), id).await;
        return Err(e.into());
    }

    Ok(summary)
}

async fn mark_failed(campaign_repository: &dyn CampaignRepository, id: i64) {
    if let Err(e) = campaign_repository.mark_failed(id, Utc::now()).await {
        tracing::error!(campaign_id = id, error = %e, "failed to mark campaign failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CampaignStatus, User};
    use crate::repositories::{MockCampaignRepository, MockUserRepository, RepositoryError};
    use crate::services::oauth_service::MockOAuthProvider;
    use crate::youtube_api::{ChannelInfo, MockYouTubeApi};
    use chrono::Duration;
    use mockall::predicate::*;

    fn campaign(status: CampaignStatus) -> Campaign {
        Campaign {
            id: 3,
            channel_id: "UCtarget".to_string(),
            channel_name: "Target".to_string(),
            channel_url: "https://www.youtube.com/channel/UCtarget".to_string(),
            thumbnail_url: None,
            subscriber_count: 10,
            target_subscribers: 0,
            actual_subscribers: 0,
            status,
            created_by: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn authorized_user(id: i64) -> User {
        User {
            id,
            login_id: format!("link-{id}"),
            youtube_id: Some(format!("UC{id}")),
            access_token: Some("token".to_string()),
            refresh_token: Some("refresh".to_string()),
            token_expiry: Some(Utc::now() + Duration::seconds(600)),
            email: None,
            name: None,
            profile_picture: None,
            is_authorized: true,
            is_master_link: false,
            master_link_id: None,
            last_login: None,
            created_at: Utc::now(),
        }
    }

    fn service(
        campaigns: MockCampaignRepository,
        users: MockUserRepository,
        youtube: MockYouTubeApi,
    ) -> CampaignService {
        let campaigns: Arc<dyn CampaignRepository> = Arc::new(campaigns);
        let users: Arc<dyn UserRepository> = Arc::new(users);
        let youtube: Arc<dyn YouTubeApi> = Arc::new(youtube);
        let tokens = Arc::new(TokenManager::new(
            Arc::new(MockOAuthProvider::new()),
            users.clone(),
        ));
        let executor = Arc::new(SubscriptionExecutor::new(
            youtube.clone(),
            tokens.clone(),
            users.clone(),
            campaigns.clone(),
        ));
        CampaignService::new(campaigns, users, youtube, tokens, executor)
    }

    #[tokio::test]
    async fn test_create_resolves_and_stores_channel_facts() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_any_authorized()
            .times(1)
            .returning(|| Box::pin(async move { Ok(Some(authorized_user(1))) }));

        let mut youtube = MockYouTubeApi::new();
        youtube
            .expect_search_channel()
            .with(eq("token"), eq("handle"))
            .times(1)
            .returning(|_, _| Box::pin(async move { Ok(Some("UChandle".to_string())) }));
        youtube
            .expect_channel_info()
            .with(eq("token"), eq("UChandle"))
            .times(1)
            .returning(|_, _| {
                Box::pin(async move {
                    Ok(Some(ChannelInfo {
                        id: "UChandle".to_string(),
                        title: "Handle Channel".to_string(),
                        description: None,
                        thumbnail_url: Some("https://yt3.example/t.jpg".to_string()),
                        subscriber_count: 4200,
                    }))
                })
            });

        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_create()
            .withf(|c| {
                c.channel_id == "UChandle"
                    && c.channel_name == "Handle Channel"
                    && c.subscriber_count == 4200
                    && c.target_subscribers == 50
                    && c.created_by.as_deref() == Some("admin")
            })
            .times(1)
            .returning(|new| {
                Box::pin(async move {
                    let mut created = campaign(CampaignStatus::Pending);
                    created.channel_id = new.channel_id;
                    created.channel_name = new.channel_name;
                    Ok(created)
                })
            });

        let service = service(campaigns, users, youtube);
        let created = service
            .create(
                CreateCampaignRequest {
                    channel_url: "https://www.youtube.com/@handle".to_string(),
                    target_subscribers: 50,
                },
                Some("admin".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(created.channel_id, "UChandle");
        assert_eq!(created.status, CampaignStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_without_authorized_users_is_validation_error() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_any_authorized()
            .returning(|| Box::pin(async move { Ok(None) }));
        let mut campaigns = MockCampaignRepository::new();
        campaigns.expect_create().times(0);

        let service = service(campaigns, users, MockYouTubeApi::new());
        let result = service
            .create(
                CreateCampaignRequest {
                    channel_url: "https://www.youtube.com/channel/UC1".to_string(),
                    target_subscribers: 0,
                },
                None,
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_unsupported_url_before_any_lookup() {
        let mut users = MockUserRepository::new();
        users.expect_find_any_authorized().times(0);

        let service = service(MockCampaignRepository::new(), users, MockYouTubeApi::new());
        let result = service
            .create(
                CreateCampaignRequest {
                    channel_url: "https://example.com/watch?v=1".to_string(),
                    target_subscribers: 0,
                },
                None,
            )
            .await;
        assert!(matches!(result, Err(AppError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_execute_in_progress_campaign_is_conflict() {
        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_find_by_id()
            .returning(|_| Box::pin(async move { Ok(Some(campaign(CampaignStatus::InProgress))) }));
        campaigns.expect_begin_execution().times(0);

        let service = service(campaigns, MockUserRepository::new(), MockYouTubeApi::new());
        let result = service.execute(3).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_execute_failed_campaign_is_conflict() {
        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_find_by_id()
            .returning(|_| Box::pin(async move { Ok(Some(campaign(CampaignStatus::Failed))) }));

        let service = service(campaigns, MockUserRepository::new(), MockYouTubeApi::new());
        assert!(matches!(service.execute(3).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_execute_lost_race_is_conflict() {
        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_find_by_id()
            .returning(|_| Box::pin(async move { Ok(Some(campaign(CampaignStatus::Pending))) }));
        campaigns
            .expect_begin_execution()
            .times(1)
            .returning(|_| Box::pin(async move { Ok(false) }));

        let mut users = MockUserRepository::new();
        users.expect_list_authorized().times(0);

        let service = service(campaigns, users, MockYouTubeApi::new());
        assert!(matches!(service.execute(3).await, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_execute_unknown_campaign_is_not_found() {
        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_find_by_id()
            .returning(|_| Box::pin(async move { Ok(None) }));

        let service = service(campaigns, MockUserRepository::new(), MockYouTubeApi::new());
        assert!(matches!(service.execute(99).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_store_error_loading_users_marks_campaign_failed() {
        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_find_by_id()
            .returning(|_| Box::pin(async move { Ok(Some(campaign(CampaignStatus::Pending))) }));
        campaigns
            .expect_begin_execution()
            .returning(|_| Box::pin(async move { Ok(true) }));
        campaigns
            .expect_mark_failed()
            .with(eq(3), always())
            .times(1)
            .returning(|_, _| Box::pin(async move { Ok(()) }));
        campaigns.expect_complete().times(0);

        let mut users = MockUserRepository::new();
        users.expect_list_authorized().returning(|| {
            Box::pin(async move { Err(RepositoryError::Database(sqlx::Error::PoolTimedOut)) })
        });

        let service = service(campaigns, users, MockYouTubeApi::new());
        assert!(matches!(service.execute(3).await, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_execute_runs_users_and_completes() {
        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_find_by_id()
            .returning(|_| Box::pin(async move { Ok(Some(campaign(CampaignStatus::Completed))) }));
        campaigns
            .expect_begin_execution()
            .times(1)
            .returning(|_| Box::pin(async move { Ok(true) }));
        campaigns
            .expect_append_subscriber()
            .times(2)
            .returning(|_, _, _, _, _| Box::pin(async move { Ok(()) }));
        campaigns.expect_complete().times(1).returning(|_, _| {
            Box::pin(async move { Ok(campaign(CampaignStatus::Completed)) })
        });
        campaigns.expect_mark_failed().times(0);

        let mut users = MockUserRepository::new();
        users
            .expect_list_authorized()
            .returning(|| Box::pin(async move { Ok(vec![authorized_user(1), authorized_user(2)]) }));
        users
            .expect_append_subscription()
            .times(2)
            .returning(|_, _, _, _, _, _| Box::pin(async move { Ok(()) }));

        let mut youtube = MockYouTubeApi::new();
        youtube
            .expect_subscribe()
            .times(2)
            .returning(|_, _| Box::pin(async move { Ok("sub".to_string()) }));

        let service = service(campaigns, users, youtube);
        let summary = service.execute(3).await.unwrap();
        assert_eq!(summary, ExecutionSummary { success_count: 2, fail_count: 0 });
    }

    #[tokio::test]
    async fn test_panicking_run_marks_campaign_failed() {
        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_find_by_id()
            .returning(|_| Box::pin(async move { Ok(Some(campaign(CampaignStatus::Pending))) }));
        campaigns
            .expect_begin_execution()
            .returning(|_| Box::pin(async move { Ok(true) }));
        campaigns
            .expect_mark_failed()
            .with(eq(3), always())
            .times(1)
            .returning(|_, _| Box::pin(async move { Ok(()) }));
        campaigns.expect_complete().times(0);

        let mut users = MockUserRepository::new();
        users
            .expect_list_authorized()
            .returning(|| Box::pin(async move { Ok(vec![authorized_user(1)]) }));

        let mut youtube = MockYouTubeApi::new();
        youtube
            .expect_subscribe()
            .returning(|_, _| panic!("subscribe blew up"));

        let service = service(campaigns, users, youtube);
        assert!(matches!(service.execute(3).await, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_list_pages_and_clamps() {
        let mut campaigns = MockCampaignRepository::new();
        campaigns
            .expect_list()
            .with(eq(10), eq(10))
            .times(1)
            .returning(|_, _| Box::pin(async move { Ok(vec![]) }));
        campaigns
            .expect_count()
            .returning(|| Box::pin(async move { Ok(25) }));

        let service = service(campaigns, MockUserRepository::new(), MockYouTubeApi::new());
        let page = service.list(2, DEFAULT_PAGE_SIZE).await.unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);
    }
}
