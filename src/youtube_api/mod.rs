//! YouTube Data API access used by the resolver, the executor and the OAuth callback.

pub mod client;
pub mod types;

pub use client::YouTubeClient;
pub use types::ChannelInfo;

use crate::error::ProviderError;
use async_trait::async_trait;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait YouTubeApi: Send + Sync {
    /// `search.list` restricted to channels; the first hit's channel id.
    async fn search_channel(
        &self,
        access_token: &str,
        query: &str,
    ) -> Result<Option<String>, ProviderError>;

    async fn channel_info(
        &self,
        access_token: &str,
        channel_id: &str,
    ) -> Result<Option<ChannelInfo>, ProviderError>;

    /// The channel owned by the token's account.
    async fn my_channel(&self, access_token: &str) -> Result<Option<ChannelInfo>, ProviderError>;

    async fn my_email(&self, access_token: &str) -> Result<Option<String>, ProviderError>;

    /// Subscribes the token's account to `channel_id`; returns the subscription id.
    async fn subscribe(&self, access_token: &str, channel_id: &str) -> Result<String, ProviderError>;
}
