pub mod test_helpers {
    use chrono::{DateTime, Utc};
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

    use crate::config::{AdminCredentials, AdminPassword, GoogleConfig, Settings};
    use crate::models::{ProviderProfile, TokenGrant, User};
    use crate::repositories::{NewUser, SqliteUserRepository, UserRepository};
    use crate::services::SecretsManager;

    pub const TEST_ADMIN_USERNAME: &str = "admin";
    pub const TEST_ADMIN_PASSWORD: &str = "correct horse battery staple";

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// A fresh random credential key per test.
    pub fn test_secrets() -> SecretsManager {
        match SecretsManager::from_base64_key(&SecretsManager::generate_master_key()) {
            Ok(secrets) => secrets,
            Err(e) => panic!("Failed to build test secrets: {}", e),
        }
    }

    /// Settings with every Google endpoint pointed at `provider_base`
    /// (usually a `wiremock::MockServer` URI).
    pub fn test_settings(provider_base: &str) -> Settings {
        Settings {
            database_url: "sqlite::memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            public_base_url: Some("http://panel.test".to_string()),
            auth_success_redirect: "/auth/success".to_string(),
            cors_allowed_origin: None,
            google: GoogleConfig {
                client_id: "test-client-id".to_string(),
                client_secret: "test-client-secret".to_string(),
                redirect_uri: "http://panel.test/auth/youtube/callback".to_string(),
                auth_url: format!("{}/o/oauth2/v2/auth", provider_base),
                token_url: format!("{}/token", provider_base),
                youtube_api_base: format!("{}/youtube/v3", provider_base),
                people_api_base: format!("{}/v1", provider_base),
            },
            admin: AdminCredentials {
                username: TEST_ADMIN_USERNAME.to_string(),
                password: AdminPassword::Plain(TEST_ADMIN_PASSWORD.to_string()),
            },
        }
    }

    /// Insert a user that has completed consent, with tokens encrypted by `secrets`.
    pub async fn insert_authorized_user(
        pool: &SqlitePool,
        secrets: &SecretsManager,
        youtube_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<User, sqlx::Error> {
        let repository = SqliteUserRepository::new(pool.clone(), secrets.clone());
        let to_sqlx = |e: crate::repositories::RepositoryError| {
            sqlx::Error::Configuration(e.to_string().into())
        };

        let user = repository
            .create_user(NewUser {
                login_id: format!("link-{}", uuid::Uuid::new_v4()),
                is_master_link: false,
                master_link_id: None,
            })
            .await
            .map_err(to_sqlx)?;

        repository
            .save_authorization(
                user.id,
                TokenGrant {
                    access_token: access_token.to_string(),
                    refresh_token: refresh_token.map(str::to_string),
                    expires_at,
                },
                ProviderProfile {
                    youtube_id: youtube_id.to_string(),
                    name: format!("Viewer {}", youtube_id),
                    email: Some(format!("{}@example.com", youtube_id.to_lowercase())),
                    profile_picture: None,
                },
                Utc::now(),
            )
            .await
            .map_err(to_sqlx)?;

        repository
            .find_by_id(user.id)
            .await
            .map_err(to_sqlx)?
            .ok_or(sqlx::Error::RowNotFound)
    }
}
