use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A recipient identity bound to a login link.
///
/// Token fields hold plaintext in memory; the repository encrypts them at rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub login_id: String,
    pub youtube_id: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub token_expiry: Option<DateTime<Utc>>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub profile_picture: Option<String>,
    pub is_authorized: bool,
    pub is_master_link: bool,
    pub master_link_id: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// True when a stored expiry exists and `now` is past it. A missing expiry
    /// is treated as still valid.
    pub fn token_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.token_expiry, Some(expiry) if now > expiry)
    }
}

/// One subscription attempt made on behalf of a user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub channel_id: String,
    pub channel_name: Option<String>,
    pub subscribed_at: DateTime<Utc>,
    pub success: bool,
    pub error_message: Option<String>,
}

/// Public view returned by `/user/profile/{loginId}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: Option<String>,
    pub profile_picture: Option<String>,
    pub is_authorized: bool,
    pub subscription_history: Vec<SubscriptionRecord>,
}

/// Authorization status returned by `/auth/status/{loginId}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationStatus {
    pub is_authorized: bool,
    pub name: Option<String>,
    pub profile_picture: Option<String>,
}

/// Admin view of a single user including history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    #[serde(flatten)]
    pub user: User,
    pub subscription_history: Vec<SubscriptionRecord>,
}
