pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod youtube_api;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use std::sync::Arc;

use config::Settings;
use repositories::{
    CampaignRepository, SqliteCampaignRepository, SqliteUserRepository, UserRepository,
};
use services::{
    AdminAuthService, CampaignService, DashboardService, GoogleOAuthClient, LoginLinkService,
    OAuthProvider, SecretsManager, SubscriptionExecutor, TokenManager, UserService,
};
use youtube_api::{YouTubeApi, YouTubeClient};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub login_links: Arc<LoginLinkService>,
    pub users: Arc<UserService>,
    pub campaigns: Arc<CampaignService>,
    pub dashboard: Arc<DashboardService>,
    pub admin_auth: Arc<AdminAuthService>,
}

impl AppState {
    /// Wires the Google clients from `settings` and the SQLite repositories.
    pub fn new(
        pool: sqlx::SqlitePool,
        settings: Settings,
        secrets: SecretsManager,
    ) -> anyhow::Result<Self> {
        let oauth = Arc::new(GoogleOAuthClient::new(&settings.google)?);
        let youtube = Arc::new(YouTubeClient::new(&settings.google)?);
        Self::from_parts(pool, settings, secrets, oauth, youtube)
    }

    pub fn from_parts(
        pool: sqlx::SqlitePool,
        settings: Settings,
        secrets: SecretsManager,
        oauth: Arc<dyn OAuthProvider>,
        youtube: Arc<dyn YouTubeApi>,
    ) -> anyhow::Result<Self> {
        let user_repository: Arc<dyn UserRepository> =
            Arc::new(SqliteUserRepository::new(pool.clone(), secrets));
        let campaign_repository: Arc<dyn CampaignRepository> =
            Arc::new(SqliteCampaignRepository::new(pool));

        let tokens = Arc::new(TokenManager::new(oauth.clone(), user_repository.clone()));
        let executor = Arc::new(SubscriptionExecutor::new(
            youtube.clone(),
            tokens.clone(),
            user_repository.clone(),
            campaign_repository.clone(),
        ));

        let users = Arc::new(UserService::new(user_repository.clone()));
        let campaigns = Arc::new(CampaignService::new(
            campaign_repository,
            user_repository.clone(),
            youtube.clone(),
            tokens,
            executor,
        ));
        let dashboard = Arc::new(DashboardService::new(users.clone(), campaigns.clone()));
        let login_links = Arc::new(LoginLinkService::new(user_repository, oauth, youtube));
        let admin_auth = Arc::new(AdminAuthService::new(&settings.admin)?);

        Ok(Self {
            settings: Arc::new(settings),
            login_links,
            users,
            campaigns,
            dashboard,
            admin_auth,
        })
    }
}
