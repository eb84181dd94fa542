pub mod admin_auth_service;
pub mod campaign_service;
pub mod channel_resolver;
pub mod dashboard_service;
pub mod login_link_service;
pub mod oauth_service;
pub mod secrets_manager;
pub mod subscription_executor;
pub mod token_manager;
pub mod user_service;

pub use admin_auth_service::{AdminAuthError, AdminAuthService, AdminLoginRequest};
pub use campaign_service::{CampaignPage, CampaignService};
pub use channel_resolver::{ChannelLocator, ChannelResolver};
pub use dashboard_service::{DashboardService, DashboardStats};
pub use login_link_service::{LoginLink, LoginLinkService, LoginStart};
pub use oauth_service::{GoogleOAuthClient, OAuthProvider};
pub use secrets_manager::SecretsManager;
pub use subscription_executor::SubscriptionExecutor;
pub use token_manager::TokenManager;
pub use user_service::{UserPage, UserService};
