//! Wire types for the YouTube Data API v3 and the People API.
//!
//! Only the fields this service reads are modelled.

use serde::{Deserialize, Serialize};

/// Channel facts captured when a campaign is created or a user authorizes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub subscriber_count: i64,
}

/// Response of `search.list`.
///
/// See: <https://developers.google.com/youtube/v3/docs/search/list>
#[derive(Debug, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub id: SearchResultId,
}

#[derive(Debug, Deserialize)]
pub struct SearchResultId {
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
}

/// Response of `channels.list`.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels/list>
#[derive(Debug, Deserialize)]
pub struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
pub struct Channel {
    pub id: String,
    pub snippet: ChannelSnippet,
    pub statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelSnippet {
    pub title: String,
    pub description: Option<String>,
    pub thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

/// Counts are returned as decimal strings.
#[derive(Debug, Deserialize)]
pub struct ChannelStatistics {
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: Option<String>,
}

impl From<Channel> for ChannelInfo {
    fn from(channel: Channel) -> Self {
        let subscriber_count = channel
            .statistics
            .and_then(|s| s.subscriber_count)
            .and_then(|count| count.parse().ok())
            .unwrap_or(0);

        ChannelInfo {
            id: channel.id,
            title: channel.snippet.title,
            description: channel.snippet.description,
            thumbnail_url: channel
                .snippet
                .thumbnails
                .and_then(|t| t.default)
                .map(|t| t.url),
            subscriber_count,
        }
    }
}

/// Request body for `subscriptions.insert`.
#[derive(Debug, Serialize)]
pub struct SubscriptionInsert<'a> {
    pub snippet: SubscriptionSnippet<'a>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionSnippet<'a> {
    #[serde(rename = "resourceId")]
    pub resource_id: ResourceId<'a>,
}

#[derive(Debug, Serialize)]
pub struct ResourceId<'a> {
    pub kind: &'static str,
    #[serde(rename = "channelId")]
    pub channel_id: &'a str,
}

impl<'a> SubscriptionInsert<'a> {
    pub fn channel(channel_id: &'a str) -> Self {
        Self {
            snippet: SubscriptionSnippet {
                resource_id: ResourceId {
                    kind: "youtube#channel",
                    channel_id,
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Subscription {
    pub id: String,
}

/// Subset of `people.get` with `personFields=emailAddresses`.
#[derive(Debug, Deserialize)]
pub struct Person {
    #[serde(rename = "emailAddresses", default)]
    pub email_addresses: Vec<EmailAddress>,
}

#[derive(Debug, Deserialize)]
pub struct EmailAddress {
    pub value: String,
}

/// Google API error envelope: `{"error": {"code": 403, "message": "..."}}`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_info_from_channel() {
        let channel: Channel = serde_json::from_str(
            r#"{
                "id": "UC123",
                "snippet": {
                    "title": "Some Channel",
                    "description": "About",
                    "thumbnails": {"default": {"url": "https://yt3.example/a.jpg"}}
                },
                "statistics": {"subscriberCount": "1234"}
            }"#,
        )
        .unwrap();

        let info = ChannelInfo::from(channel);
        assert_eq!(info.id, "UC123");
        assert_eq!(info.title, "Some Channel");
        assert_eq!(info.thumbnail_url.as_deref(), Some("https://yt3.example/a.jpg"));
        assert_eq!(info.subscriber_count, 1234);
    }

    #[test]
    fn test_hidden_subscriber_count_defaults_to_zero() {
        let channel: Channel = serde_json::from_str(
            r#"{"id": "UC1", "snippet": {"title": "Hidden"}, "statistics": {}}"#,
        )
        .unwrap();

        let info = ChannelInfo::from(channel);
        assert_eq!(info.subscriber_count, 0);
        assert_eq!(info.thumbnail_url, None);
    }

    #[test]
    fn test_subscription_body_shape() {
        let body = serde_json::to_value(SubscriptionInsert::channel("UC9")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "snippet": {"resourceId": {"kind": "youtube#channel", "channelId": "UC9"}}
            })
        );
    }
}
