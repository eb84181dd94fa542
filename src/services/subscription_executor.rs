use crate::error::AppError;
use crate::models::{Campaign, ExecutionSummary, SubscriberStatus, User};
use crate::repositories::{CampaignRepository, UserRepository};
use crate::services::token_manager::TokenManager;
use crate::youtube_api::YouTubeApi;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::instrument;

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Subscribes users to a campaign's channel in sequential batches whose
/// members run concurrently. Per-user failures are recorded, never propagated.
pub struct SubscriptionExecutor {
    youtube: Arc<dyn YouTubeApi>,
    tokens: Arc<TokenManager>,
    user_repository: Arc<dyn UserRepository>,
    campaign_repository: Arc<dyn CampaignRepository>,
    batch_size: usize,
}

impl SubscriptionExecutor {
    pub fn new(
        youtube: Arc<dyn YouTubeApi>,
        tokens: Arc<TokenManager>,
        user_repository: Arc<dyn UserRepository>,
        campaign_repository: Arc<dyn CampaignRepository>,
    ) -> Self {
        Self {
            youtube,
            tokens,
            user_repository,
            campaign_repository,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[instrument(skip(self, campaign, users), fields(campaign_id = campaign.id, users = users.len()))]
    pub async fn run(&self, campaign: &Campaign, users: Vec<User>) -> ExecutionSummary {
        let mut summary = ExecutionSummary::default();
        let mut users = users.into_iter().peekable();
        let mut batch_number = 0;

        while users.peek().is_some() {
            let batch: Vec<User> = users.by_ref().take(self.batch_size).collect();
            batch_number += 1;
            tracing::debug!(batch = batch_number, size = batch.len(), "processing batch");

            let outcomes = join_all(batch.into_iter().map(|user| self.subscribe_one(campaign, user))).await;

            for succeeded in outcomes {
                if succeeded {
                    summary.success_count += 1;
                } else {
                    summary.fail_count += 1;
                }
            }
        }

        tracing::info!(
            success = summary.success_count,
            failed = summary.fail_count,
            "campaign run finished"
        );
        summary
    }

    async fn subscribe_one(&self, campaign: &Campaign, mut user: User) -> bool {
        let result = match self.tokens.valid_access_token(&mut user).await {
            Ok(token) => self
                .youtube
                .subscribe(&token, &campaign.channel_id)
                .await
                .map_err(AppError::from),
            Err(e) => Err(e),
        };

        let succeeded = result.is_ok();
        let error_message = result.err().map(|e| e.to_string());
        if let Some(ref message) = error_message {
            tracing::warn!(user_id = user.id, error = %message, "subscription failed");
        }

        let at = Utc::now();
        if let Err(e) = self
            .user_repository
            .append_subscription(
                user.id,
                &campaign.channel_id,
                Some(campaign.channel_name.clone()),
                succeeded,
                error_message.clone(),
                at,
            )
            .await
        {
            tracing::error!(user_id = user.id, error = %e, "failed to record subscription history");
        }

        if let Err(e) = self
            .campaign_repository
            .append_subscriber(
                campaign.id,
                user.id,
                SubscriberStatus::from_result(succeeded),
                error_message,
                at,
            )
            .await
        {
            tracing::error!(user_id = user.id, error = %e, "failed to record campaign subscriber");
        }

        succeeded
    }
}
