use crate::error::{AppError, Result};
use crate::youtube_api::YouTubeApi;
use std::sync::Arc;

/// The recognised shapes of a YouTube channel URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelLocator {
    /// `/channel/<id>`; already a channel id.
    Id(String),
    /// `/c/<name>`
    CustomName(String),
    /// `/user/<name>`
    LegacyUser(String),
    /// `/@<handle>`
    Handle(String),
}

impl ChannelLocator {
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();

        if let Some(rest) = segment_after(url, "/channel/") {
            return non_empty(rest, url).map(ChannelLocator::Id);
        }
        if let Some(rest) = segment_after(url, "/c/") {
            return non_empty(rest, url).map(ChannelLocator::CustomName);
        }
        if let Some(rest) = segment_after(url, "/user/") {
            return non_empty(rest, url).map(ChannelLocator::LegacyUser);
        }
        if let Some(rest) = segment_after(url, "/@") {
            return non_empty(rest, url).map(ChannelLocator::Handle);
        }

        Err(AppError::UnsupportedFormat(url.to_string()))
    }

    /// The search query for shapes that need one.
    pub fn search_query(&self) -> Option<&str> {
        match self {
            ChannelLocator::Id(_) => None,
            ChannelLocator::CustomName(name)
            | ChannelLocator::LegacyUser(name)
            | ChannelLocator::Handle(name) => Some(name),
        }
    }
}

fn segment_after<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    url.find(marker).map(|idx| {
        let rest = &url[idx + marker.len()..];
        let end = rest.find(['?', '/', '#']).unwrap_or(rest.len());
        &rest[..end]
    })
}

fn non_empty(segment: &str, url: &str) -> Result<String> {
    if segment.is_empty() {
        Err(AppError::UnsupportedFormat(url.to_string()))
    } else {
        Ok(segment.to_string())
    }
}

/// Turns channel URLs into canonical channel ids.
pub struct ChannelResolver {
    youtube: Arc<dyn YouTubeApi>,
}

impl ChannelResolver {
    pub fn new(youtube: Arc<dyn YouTubeApi>) -> Self {
        Self { youtube }
    }

    pub async fn resolve_locator(
        &self,
        locator: &ChannelLocator,
        access_token: &str,
    ) -> Result<String> {
        let query = match locator {
            ChannelLocator::Id(id) => return Ok(id.clone()),
            other => other.search_query().unwrap_or_default(),
        };

        tracing::debug!(query, "searching for channel");
        self.youtube
            .search_channel(access_token, query)
            .await?
            .ok_or_else(|| AppError::NotFound("Channel".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube_api::MockYouTubeApi;
    use mockall::predicate::*;

    #[test]
    fn test_parse_shapes() {
        assert_eq!(
            ChannelLocator::parse("https://www.youtube.com/channel/UC123").unwrap(),
            ChannelLocator::Id("UC123".to_string())
        );
        assert_eq!(
            ChannelLocator::parse("https://youtube.com/c/SomeName/videos").unwrap(),
            ChannelLocator::CustomName("SomeName".to_string())
        );
        assert_eq!(
            ChannelLocator::parse("https://www.youtube.com/user/SomeUser?feature=x").unwrap(),
            ChannelLocator::LegacyUser("SomeUser".to_string())
        );
        assert_eq!(
            ChannelLocator::parse("https://www.youtube.com/@handle").unwrap(),
            ChannelLocator::Handle("handle".to_string())
        );
    }

    #[test]
    fn test_parse_cuts_at_query_and_fragment() {
        assert_eq!(
            ChannelLocator::parse("youtube.com/channel/UCabc?si=xyz").unwrap(),
            ChannelLocator::Id("UCabc".to_string())
        );
        assert_eq!(
            ChannelLocator::parse("youtube.com/@handle#about").unwrap(),
            ChannelLocator::Handle("handle".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_unknown_and_empty() {
        assert!(matches!(
            ChannelLocator::parse("https://www.youtube.com/watch?v=abc"),
            Err(AppError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ChannelLocator::parse("https://www.youtube.com/channel/"),
            Err(AppError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ChannelLocator::parse(""),
            Err(AppError::UnsupportedFormat(_))
        ));
    }

    fn locator(url: &str) -> ChannelLocator {
        ChannelLocator::parse(url).unwrap()
    }

    #[tokio::test]
    async fn test_channel_id_needs_no_provider_call() {
        let mut youtube = MockYouTubeApi::new();
        youtube.expect_search_channel().times(0);

        let resolver = ChannelResolver::new(Arc::new(youtube));
        let id = resolver
            .resolve_locator(&locator("https://www.youtube.com/channel/UC123"), "token")
            .await
            .unwrap();
        assert_eq!(id, "UC123");
    }

    #[tokio::test]
    async fn test_custom_name_issues_one_search() {
        let mut youtube = MockYouTubeApi::new();
        youtube
            .expect_search_channel()
            .with(eq("token"), eq("SomeName"))
            .times(1)
            .returning(|_, _| Box::pin(async move { Ok(Some("UCfound".to_string())) }));

        let resolver = ChannelResolver::new(Arc::new(youtube));
        let id = resolver
            .resolve_locator(&locator("https://www.youtube.com/c/SomeName"), "token")
            .await
            .unwrap();
        assert_eq!(id, "UCfound");
    }

    #[tokio::test]
    async fn test_empty_search_is_not_found() {
        let mut youtube = MockYouTubeApi::new();
        youtube
            .expect_search_channel()
            .times(1)
            .returning(|_, _| Box::pin(async move { Ok(None) }));

        let resolver = ChannelResolver::new(Arc::new(youtube));
        let result = resolver
            .resolve_locator(&locator("https://www.youtube.com/@nobody"), "token")
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
