use crate::error::Result;
use crate::models::Campaign;
use crate::services::campaign_service::CampaignService;
use crate::services::user_service::UserService;
use serde::Serialize;
use std::sync::Arc;

const RECENT_CAMPAIGNS: i64 = 5;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub authorized_users: i64,
    pub recent_campaigns: Vec<Campaign>,
}

pub struct DashboardService {
    users: Arc<UserService>,
    campaigns: Arc<CampaignService>,
}

impl DashboardService {
    pub fn new(users: Arc<UserService>, campaigns: Arc<CampaignService>) -> Self {
        Self { users, campaigns }
    }

    pub async fn stats(&self) -> Result<DashboardStats> {
        let (total_users, authorized_users, recent_campaigns) = tokio::try_join!(
            self.users.count_users(),
            self.users.count_authorized(),
            self.campaigns.recent(RECENT_CAMPAIGNS),
        )?;

        Ok(DashboardStats {
            total_users,
            authorized_users,
            recent_campaigns,
        })
    }
}
