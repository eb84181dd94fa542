use crate::models::{ProviderProfile, SubscriptionRecord, TokenGrant, User};
use crate::services::SecretsManager;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
    #[error("Credential encryption error: {0}")]
    Crypto(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// A pending identity to insert when a login link is issued.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login_id: String,
    pub is_master_link: bool,
    pub master_link_id: Option<String>,
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;
    async fn find_by_login_id(&self, login_id: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_youtube_id(&self, youtube_id: &str) -> RepositoryResult<Option<User>>;
    /// Users holding credentials, in id order. Master-link records are never included.
    async fn list_authorized(&self) -> RepositoryResult<Vec<User>>;
    async fn find_any_authorized(&self) -> RepositoryResult<Option<User>>;
    /// Stores a completed consent: tokens, profile, authorization flag and last login.
    async fn save_authorization(
        &self,
        id: i64,
        grant: TokenGrant,
        profile: ProviderProfile,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()>;
    /// Stores refreshed tokens. A `None` refresh token keeps the stored one.
    async fn update_tokens(
        &self,
        id: i64,
        access_token: &str,
        refresh_token: Option<String>,
        expiry: DateTime<Utc>,
    ) -> RepositoryResult<()>;
    async fn revoke(&self, id: i64) -> RepositoryResult<()>;
    async fn append_subscription(
        &self,
        user_id: i64,
        channel_id: &str,
        channel_name: Option<String>,
        success: bool,
        error_message: Option<String>,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()>;
    async fn subscription_history(&self, user_id: i64) -> RepositoryResult<Vec<SubscriptionRecord>>;
    async fn list_users(
        &self,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<User>>;
    async fn count_users(&self, search: Option<String>) -> RepositoryResult<i64>;
    async fn count_authorized(&self) -> RepositoryResult<i64>;
}

const USER_COLUMNS: &str = r#"
    id, login_id, youtube_id, access_token, refresh_token, token_expiry,
    email, name, profile_picture, is_authorized, is_master_link,
    master_link_id, last_login, created_at
"#;

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    login_id: String,
    youtube_id: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_expiry: Option<DateTime<Utc>>,
    email: Option<String>,
    name: Option<String>,
    profile_picture: Option<String>,
    is_authorized: bool,
    is_master_link: bool,
    master_link_id: Option<String>,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
    secrets: SecretsManager,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool, secrets: SecretsManager) -> Self {
        Self { pool, secrets }
    }

    fn decode_row(&self, row: UserRow) -> RepositoryResult<User> {
        let access_token = self
            .secrets
            .decrypt_optional(row.access_token.as_deref())
            .map_err(|e| RepositoryError::Crypto(e.to_string()))?;
        let refresh_token = self
            .secrets
            .decrypt_optional(row.refresh_token.as_deref())
            .map_err(|e| RepositoryError::Crypto(e.to_string()))?;

        Ok(User {
            id: row.id,
            login_id: row.login_id,
            youtube_id: row.youtube_id,
            access_token,
            refresh_token,
            token_expiry: row.token_expiry,
            email: row.email,
            name: row.name,
            profile_picture: row.profile_picture,
            is_authorized: row.is_authorized,
            is_master_link: row.is_master_link,
            master_link_id: row.master_link_id,
            last_login: row.last_login,
            created_at: row.created_at,
        })
    }

    fn decode_rows(&self, rows: Vec<UserRow>) -> RepositoryResult<Vec<User>> {
        rows.into_iter().map(|row| self.decode_row(row)).collect()
    }

    fn encrypt(&self, value: Option<&str>) -> RepositoryResult<Option<String>> {
        self.secrets
            .encrypt_optional(value)
            .map_err(|e| RepositoryError::Crypto(e.to_string()))
    }

    async fn find_one(&self, column: &str, value: &str) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| self.decode_row(r)).transpose()
    }
}

fn search_pattern(search: Option<String>) -> Option<String> {
    search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s))
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (login_id, is_authorized, is_master_link, master_link_id, created_at)
            VALUES (?, 0, ?, ?, ?)
            "#,
        )
        .bind(&user.login_id)
        .bind(user.is_master_link)
        .bind(&user.master_link_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(res) => self
                .find_by_id(res.last_insert_rowid())
                .await?
                .ok_or(RepositoryError::NotFound),
            Err(e) => {
                if e.to_string().contains("UNIQUE") {
                    Err(RepositoryError::AlreadyExists)
                } else {
                    Err(RepositoryError::Database(e))
                }
            }
        }
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| self.decode_row(r)).transpose()
    }

    async fn find_by_login_id(&self, login_id: &str) -> RepositoryResult<Option<User>> {
        self.find_one("login_id", login_id).await
    }

    async fn find_by_youtube_id(&self, youtube_id: &str) -> RepositoryResult<Option<User>> {
        self.find_one("youtube_id", youtube_id).await
    }

    async fn list_authorized(&self) -> RepositoryResult<Vec<User>> {
        let sql = format!(
            r#"
            SELECT {} FROM users
            WHERE is_authorized = 1 AND is_master_link = 0 AND access_token IS NOT NULL
            ORDER BY id
            "#,
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        self.decode_rows(rows)
    }

    async fn find_any_authorized(&self) -> RepositoryResult<Option<User>> {
        let sql = format!(
            r#"
            SELECT {} FROM users
            WHERE is_authorized = 1 AND is_master_link = 0 AND access_token IS NOT NULL
            ORDER BY last_login DESC, id DESC
            LIMIT 1
            "#,
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| self.decode_row(r)).transpose()
    }

    async fn save_authorization(
        &self,
        id: i64,
        grant: TokenGrant,
        profile: ProviderProfile,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let access_token = self.encrypt(Some(&grant.access_token))?;
        let refresh_token = self.encrypt(grant.refresh_token.as_deref())?;

        let result = sqlx::query(
            r#"
            UPDATE users SET
                youtube_id = ?,
                access_token = ?,
                refresh_token = COALESCE(?, refresh_token),
                token_expiry = ?,
                name = ?,
                email = ?,
                profile_picture = ?,
                is_authorized = 1,
                last_login = ?
            WHERE id = ?
            "#,
        )
        .bind(&profile.youtube_id)
        .bind(access_token)
        .bind(refresh_token)
        .bind(grant.expires_at)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.profile_picture)
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn update_tokens(
        &self,
        id: i64,
        access_token: &str,
        refresh_token: Option<String>,
        expiry: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let access_token = self.encrypt(Some(access_token))?;
        let refresh_token = self.encrypt(refresh_token.as_deref())?;

        let result = sqlx::query(
            r#"
            UPDATE users SET
                access_token = ?,
                refresh_token = COALESCE(?, refresh_token),
                token_expiry = ?
            WHERE id = ? AND is_authorized = 1
            "#,
        )
        .bind(access_token)
        .bind(refresh_token)
        .bind(expiry)
        .bind(id)
        .execute(&self.pool)
        .await?;

        // Revoked in the meantime, or gone
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn revoke(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                access_token = NULL,
                refresh_token = NULL,
                token_expiry = NULL,
                is_authorized = 0
            WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn append_subscription(
        &self,
        user_id: i64,
        channel_id: &str,
        channel_name: Option<String>,
        success: bool,
        error_message: Option<String>,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO subscription_history
                (user_id, channel_id, channel_name, subscribed_at, success, error_message)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(channel_id)
        .bind(channel_name)
        .bind(at)
        .bind(success)
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn subscription_history(&self, user_id: i64) -> RepositoryResult<Vec<SubscriptionRecord>> {
        let records = sqlx::query_as::<_, SubscriptionRecord>(
            r#"
            SELECT id, user_id, channel_id, channel_name, subscribed_at, success, error_message
            FROM subscription_history
            WHERE user_id = ?
            ORDER BY subscribed_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn list_users(
        &self,
        search: Option<String>,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<User>> {
        let pattern = search_pattern(search);
        let sql = format!(
            r#"
            SELECT {} FROM users
            WHERE ?1 IS NULL OR name LIKE ?1 OR email LIKE ?1 OR youtube_id LIKE ?1
            ORDER BY last_login IS NULL, last_login DESC, id DESC
            LIMIT ?2 OFFSET ?3
            "#,
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        self.decode_rows(rows)
    }

    async fn count_users(&self, search: Option<String>) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ?1 IS NULL OR name LIKE ?1 OR email LIKE ?1 OR youtube_id LIKE ?1
            "#,
        )
        .bind(search_pattern(search))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_authorized(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE is_authorized = 1 AND is_master_link = 0",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
