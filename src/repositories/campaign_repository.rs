use crate::models::{
    Campaign, CampaignRow, CampaignSubscriber, CampaignSubscriberRow, NewCampaign,
    SubscriberStatus,
};
use crate::repositories::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait CampaignRepository: Send + Sync {
    async fn create(&self, campaign: NewCampaign) -> RepositoryResult<Campaign>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Campaign>>;
    /// Newest first.
    async fn list(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<Campaign>>;
    async fn count(&self) -> RepositoryResult<i64>;
    /// Moves a pending or completed campaign to in-progress.
    /// Returns false when the campaign was in any other status.
    async fn begin_execution(&self, id: i64) -> RepositoryResult<bool>;
    /// Marks an in-progress campaign completed and recomputes `actual_subscribers`.
    async fn complete(&self, id: i64, at: DateTime<Utc>) -> RepositoryResult<Campaign>;
    async fn mark_failed(&self, id: i64, at: DateTime<Utc>) -> RepositoryResult<()>;
    async fn append_subscriber(
        &self,
        campaign_id: i64,
        user_id: i64,
        status: SubscriberStatus,
        error_message: Option<String>,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()>;
    async fn subscribers(&self, campaign_id: i64) -> RepositoryResult<Vec<CampaignSubscriber>>;
}

const CAMPAIGN_COLUMNS: &str = r#"
    id, channel_id, channel_name, channel_url, thumbnail_url, subscriber_count,
    target_subscribers, actual_subscribers, status, created_by, created_at, completed_at
"#;

pub struct SqliteCampaignRepository {
    pool: SqlitePool,
}

impl SqliteCampaignRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn decode(row: CampaignRow) -> RepositoryResult<Campaign> {
    Campaign::try_from(row).map_err(|e| RepositoryError::Database(sqlx::Error::Decode(e.into())))
}

#[async_trait]
impl CampaignRepository for SqliteCampaignRepository {
    async fn create(&self, campaign: NewCampaign) -> RepositoryResult<Campaign> {
        let result = sqlx::query(
            r#"
            INSERT INTO campaigns
                (channel_id, channel_name, channel_url, thumbnail_url, subscriber_count,
                 target_subscribers, actual_subscribers, status, created_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, 'pending', ?, ?)
            "#,
        )
        .bind(&campaign.channel_id)
        .bind(&campaign.channel_name)
        .bind(&campaign.channel_url)
        .bind(&campaign.thumbnail_url)
        .bind(campaign.subscriber_count)
        .bind(campaign.target_subscribers)
        .bind(&campaign.created_by)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.find_by_id(result.last_insert_rowid())
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Campaign>> {
        let sql = format!("SELECT {} FROM campaigns WHERE id = ?", CAMPAIGN_COLUMNS);
        let row = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(decode).transpose()
    }

    async fn list(&self, limit: i64, offset: i64) -> RepositoryResult<Vec<Campaign>> {
        let sql = format!(
            "SELECT {} FROM campaigns ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            CAMPAIGN_COLUMNS
        );
        let rows = sqlx::query_as::<_, CampaignRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(decode).collect()
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM campaigns")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn begin_execution(&self, id: i64) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns SET status = 'in-progress'
            WHERE id = ? AND status IN ('pending', 'completed')
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn complete(&self, id: i64, at: DateTime<Utc>) -> RepositoryResult<Campaign> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns SET
                status = 'completed',
                completed_at = ?,
                actual_subscribers = (
                    SELECT COUNT(DISTINCT user_id) FROM campaign_subscribers
                    WHERE campaign_id = ? AND status = 'success'
                )
            WHERE id = ? AND status = 'in-progress'
            "#,
        )
        .bind(at)
        .bind(id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn mark_failed(&self, id: i64, at: DateTime<Utc>) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            UPDATE campaigns SET status = 'failed', completed_at = ?
            WHERE id = ? AND status = 'in-progress'
            "#,
        )
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn append_subscriber(
        &self,
        campaign_id: i64,
        user_id: i64,
        status: SubscriberStatus,
        error_message: Option<String>,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO campaign_subscribers (campaign_id, user_id, status, subscribed_at, error_message)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(campaign_id)
        .bind(user_id)
        .bind(status.as_str())
        .bind(at)
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn subscribers(&self, campaign_id: i64) -> RepositoryResult<Vec<CampaignSubscriber>> {
        let rows = sqlx::query_as::<_, CampaignSubscriberRow>(
            r#"
            SELECT id, campaign_id, user_id, status, subscribed_at, error_message
            FROM campaign_subscribers
            WHERE campaign_id = ?
            ORDER BY id
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                CampaignSubscriber::try_from(row)
                    .map_err(|e| RepositoryError::Database(sqlx::Error::Decode(e.into())))
            })
            .collect()
    }
}
