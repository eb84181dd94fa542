use chrono::{DateTime, Utc};

// ============================================================================
// TokenGrant - credentials issued by the Google token endpoint
// ============================================================================

/// Result of an authorization-code exchange or a refresh.
#[derive(Clone, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    /// Present on the first consent and whenever Google rotates it.
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// ============================================================================
// ConsentRequest - where to send the browser to start OAuth
// ============================================================================

#[derive(Debug, Clone)]
pub struct ConsentRequest {
    pub url: String,
    /// Opaque CSRF value echoed back by Google as `state`.
    pub state: String,
}

// ============================================================================
// ProviderProfile - identity facts captured at callback time
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProfile {
    pub youtube_id: String,
    pub name: String,
    pub email: Option<String>,
    pub profile_picture: Option<String>,
}
