use std::env;

/// Default Google endpoints. Each can be overridden through the environment,
/// which is how tests point the clients at a local mock server.
pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_PEOPLE_API_BASE: &str = "https://people.googleapis.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub youtube_api_base: String,
    pub people_api_base: String,
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("youtube_api_base", &self.youtube_api_base)
            .field("people_api_base", &self.people_api_base)
            .finish()
    }
}

#[derive(Clone)]
pub enum AdminPassword {
    /// argon2 PHC string
    Hash(String),
    /// Plain password, hashed once at startup
    Plain(String),
}

#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: AdminPassword,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Base used when building login links. Falls back to the request Host header.
    pub public_base_url: Option<String>,
    /// Where the browser lands after a completed OAuth callback.
    pub auth_success_redirect: String,
    pub cors_allowed_origin: Option<String>,
    pub google: GoogleConfig,
    pub admin: AdminCredentials,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = optional("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: e.to_string(),
            })?;

        let google = GoogleConfig {
            client_id: required("YOUTUBE_CLIENT_ID")?,
            client_secret: required("YOUTUBE_CLIENT_SECRET")?,
            redirect_uri: required("YOUTUBE_REDIRECT_URI")?,
            auth_url: optional("GOOGLE_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            token_url: optional("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            youtube_api_base: optional("YOUTUBE_API_BASE")
                .unwrap_or_else(|| DEFAULT_YOUTUBE_API_BASE.to_string()),
            people_api_base: optional("PEOPLE_API_BASE")
                .unwrap_or_else(|| DEFAULT_PEOPLE_API_BASE.to_string()),
        };

        let admin_password = match (optional("ADMIN_PASSWORD_HASH"), optional("ADMIN_PASSWORD")) {
            (Some(hash), _) => {
                if !hash.starts_with("$argon2") {
                    return Err(ConfigError::Invalid {
                        key: "ADMIN_PASSWORD_HASH",
                        reason: "expected an argon2 PHC string".to_string(),
                    });
                }
                AdminPassword::Hash(hash)
            }
            (None, Some(plain)) => AdminPassword::Plain(plain),
            (None, None) => return Err(ConfigError::Missing("ADMIN_PASSWORD_HASH or ADMIN_PASSWORD")),
        };

        let public_base_url = optional("PUBLIC_BASE_URL").map(|url| url.trim_end_matches('/').to_string());
        if let Some(ref url) = public_base_url {
            reqwest::Url::parse(url).map_err(|e| ConfigError::Invalid {
                key: "PUBLIC_BASE_URL",
                reason: e.to_string(),
            })?;
        }

        Ok(Settings {
            database_url: required("DATABASE_URL")?,
            host: optional("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            public_base_url,
            auth_success_redirect: optional("AUTH_SUCCESS_REDIRECT")
                .unwrap_or_else(|| "/".to_string()),
            cors_allowed_origin: optional("CORS_ALLOWED_ORIGIN"),
            google,
            admin: AdminCredentials {
                username: required("ADMIN_USERNAME")?,
                password: admin_password,
            },
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
