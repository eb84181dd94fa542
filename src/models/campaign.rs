use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CampaignStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Pending => "pending",
            CampaignStatus::InProgress => "in-progress",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Failed => "failed",
        }
    }

    /// Whether an execute request may start from this status.
    /// Completed campaigns may be re-run; the new attempts are appended.
    pub fn can_start(&self) -> bool {
        matches!(self, CampaignStatus::Pending | CampaignStatus::Completed)
    }
}

impl FromStr for CampaignStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CampaignStatus::Pending),
            "in-progress" => Ok(CampaignStatus::InProgress),
            "completed" => Ok(CampaignStatus::Completed),
            "failed" => Ok(CampaignStatus::Failed),
            other => Err(AppError::Internal(format!(
                "unknown campaign status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberStatus {
    Pending,
    Success,
    Failed,
}

impl SubscriberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriberStatus::Pending => "pending",
            SubscriberStatus::Success => "success",
            SubscriberStatus::Failed => "failed",
        }
    }

    pub fn from_result(is_success: bool) -> Self {
        if is_success {
            SubscriberStatus::Success
        } else {
            SubscriberStatus::Failed
        }
    }
}

impl FromStr for SubscriberStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubscriberStatus::Pending),
            "success" => Ok(SubscriberStatus::Success),
            "failed" => Ok(SubscriberStatus::Failed),
            other => Err(AppError::Internal(format!(
                "unknown subscriber status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: i64,
    pub channel_id: String,
    pub channel_name: String,
    pub channel_url: String,
    pub thumbnail_url: Option<String>,
    pub subscriber_count: i64,
    pub target_subscribers: i64,
    pub actual_subscribers: i64,
    pub status: CampaignStatus,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Raw `campaigns` row; status is stored as text.
#[derive(Debug, FromRow)]
pub struct CampaignRow {
    pub id: i64,
    pub channel_id: String,
    pub channel_name: String,
    pub channel_url: String,
    pub thumbnail_url: Option<String>,
    pub subscriber_count: i64,
    pub target_subscribers: i64,
    pub actual_subscribers: i64,
    pub status: String,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = AppError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        Ok(Campaign {
            id: row.id,
            channel_id: row.channel_id,
            channel_name: row.channel_name,
            channel_url: row.channel_url,
            thumbnail_url: row.thumbnail_url,
            subscriber_count: row.subscriber_count,
            target_subscribers: row.target_subscribers,
            actual_subscribers: row.actual_subscribers,
            status: row.status.parse()?,
            created_by: row.created_by,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSubscriber {
    pub id: i64,
    pub campaign_id: i64,
    pub user_id: i64,
    pub status: SubscriberStatus,
    pub subscribed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct CampaignSubscriberRow {
    pub id: i64,
    pub campaign_id: i64,
    pub user_id: i64,
    pub status: String,
    pub subscribed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl TryFrom<CampaignSubscriberRow> for CampaignSubscriber {
    type Error = AppError;

    fn try_from(row: CampaignSubscriberRow) -> Result<Self, Self::Error> {
        Ok(CampaignSubscriber {
            id: row.id,
            campaign_id: row.campaign_id,
            user_id: row.user_id,
            status: row.status.parse()?,
            subscribed_at: row.subscribed_at,
            error_message: row.error_message,
        })
    }
}

/// Everything needed to insert a campaign once the channel has been resolved.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub channel_id: String,
    pub channel_name: String,
    pub channel_url: String,
    pub thumbnail_url: Option<String>,
    pub subscriber_count: i64,
    pub target_subscribers: i64,
    pub created_by: Option<String>,
}

/// Admin request body for `POST /admin/campaigns` (JSON or form).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    pub channel_url: String,
    #[serde(default)]
    pub target_subscribers: i64,
}

impl CreateCampaignRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.channel_url.trim().is_empty() {
            return Err(AppError::Validation("channelUrl is required".to_string()));
        }
        if self.target_subscribers < 0 {
            return Err(AppError::Validation(
                "targetSubscribers must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Aggregate outcome of one campaign execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub success_count: usize,
    pub fail_count: usize,
}

impl ExecutionSummary {
    pub fn attempted(&self) -> usize {
        self.success_count + self.fail_count
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDetails {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub subscribers: Vec<CampaignSubscriber>,
}
