//! HTTP client for the YouTube Data API v3 and the People API.

use crate::config::GoogleConfig;
use crate::error::ProviderError;
use crate::youtube_api::types::{
    ApiErrorResponse, ChannelInfo, ChannelListResponse, Person, SearchListResponse, Subscription,
    SubscriptionInsert,
};
use crate::youtube_api::YouTubeApi;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::instrument;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Stateless API client. Every call carries the caller's access token, so one
/// instance serves all users.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    client: reqwest::Client,
    youtube_api_base: String,
    people_api_base: String,
}

impl YouTubeClient {
    pub fn new(config: &GoogleConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            youtube_api_base: config.youtube_api_base.trim_end_matches('/').to_string(),
            people_api_base: config.people_api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn request<T, B>(
        &self,
        method: Method,
        url: &str,
        access_token: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(access_token)
            .query(query);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(status, &text));
        }

        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        self.request::<T, ()>(Method::GET, url, access_token, query, None)
            .await
    }

    async fn list_channels(
        &self,
        access_token: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<ChannelInfo>, ProviderError> {
        let url = format!("{}/channels", self.youtube_api_base);
        let response: ChannelListResponse = self.get(&url, access_token, query).await?;
        Ok(response.items.into_iter().next().map(ChannelInfo::from))
    }
}

/// Prefers the message from Google's error envelope over the raw body.
fn api_error(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body.to_string()
            }
        });

    ProviderError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl YouTubeApi for YouTubeClient {
    #[instrument(skip(self, access_token))]
    async fn search_channel(
        &self,
        access_token: &str,
        query: &str,
    ) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/search", self.youtube_api_base);
        let response: SearchListResponse = self
            .get(
                &url,
                access_token,
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "channel"),
                    ("maxResults", "1"),
                ],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .next()
            .and_then(|item| item.id.channel_id))
    }

    #[instrument(skip(self, access_token))]
    async fn channel_info(
        &self,
        access_token: &str,
        channel_id: &str,
    ) -> Result<Option<ChannelInfo>, ProviderError> {
        self.list_channels(
            access_token,
            &[("part", "snippet,statistics"), ("id", channel_id)],
        )
        .await
    }

    #[instrument(skip(self, access_token))]
    async fn my_channel(&self, access_token: &str) -> Result<Option<ChannelInfo>, ProviderError> {
        self.list_channels(
            access_token,
            &[("part", "snippet,statistics"), ("mine", "true")],
        )
        .await
    }

    #[instrument(skip(self, access_token))]
    async fn my_email(&self, access_token: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/people/me", self.people_api_base);
        let person: Person = self
            .get(&url, access_token, &[("personFields", "emailAddresses")])
            .await?;

        Ok(person.email_addresses.into_iter().next().map(|e| e.value))
    }

    #[instrument(skip(self, access_token))]
    async fn subscribe(&self, access_token: &str, channel_id: &str) -> Result<String, ProviderError> {
        let url = format!("{}/subscriptions", self.youtube_api_base);
        let body = SubscriptionInsert::channel(channel_id);
        let subscription: Subscription = self
            .request(
                Method::POST,
                &url,
                access_token,
                &[("part", "snippet")],
                Some(&body),
            )
            .await?;

        tracing::debug!(subscription_id = %subscription.id, "subscription created");
        Ok(subscription.id)
    }
}
