//! services/api/src/adapters/youtube.rs
//!
//! This module contains the adapter for the YouTube Data API v3. It implements
//! the `VideoSearchService` port from the `core` crate, forwarding search
//! queries and resolving per-video duration metadata.

use async_trait::async_trait;
use elice_core::domain::VideoResult;
use elice_core::ports::{PortError, PortResult, VideoSearchService};
use serde::Deserialize;

const YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Descriptions longer than this are cut and marked with an ellipsis.
const MAX_DESCRIPTION_CHARS: usize = 200;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `VideoSearchService` port using the
/// YouTube Data API.
#[derive(Clone)]
pub struct YoutubeAdapter {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl YoutubeAdapter {
    /// Creates a new `YoutubeAdapter`. The key is optional here; its absence
    /// is only surfaced when a search is actually attempted.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, YOUTUBE_API_BASE_URL.to_string())
    }

    /// Creates an adapter pointed at a non-default API base URL (used by tests).
    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    fn truncate_description(text: &str) -> String {
        if text.chars().count() > MAX_DESCRIPTION_CHARS {
            let head: String = text.chars().take(MAX_DESCRIPTION_CHARS).collect();
            format!("{}...", head)
        } else {
            text.to_string()
        }
    }

    /// Converts a non-success response into an `Upstream` error carrying the
    /// status code and body reported by the API.
    async fn check_status(response: reqwest::Response) -> PortResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PortError::Upstream {
            status: status.as_u16(),
            message: format!("YouTube API returned status {}: {}", status.as_u16(), body),
        })
    }

    /// Second lookup per result item: resolves the ISO-8601 duration for one
    /// video, falling back to "Unknown" when the API returns no entry.
    async fn fetch_duration(&self, key: &str, video_id: &str) -> PortResult<String> {
        let response = self
            .http
            .get(format!("{}/videos", self.base_url))
            .query(&[("part", "contentDetails"), ("id", video_id), ("key", key)])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let response = Self::check_status(response).await?;

        let details: VideoListResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(details
            .items
            .into_iter()
            .next()
            .map(|v| v.content_details.duration)
            .unwrap_or_else(|| "Unknown".to_string()))
    }
}

//=========================================================================================
// YouTube API Response Structs
//=========================================================================================

#[derive(Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    id: SearchResultId,
    snippet: Snippet,
}

#[derive(Deserialize)]
struct SearchResultId {
    #[serde(rename = "videoId")]
    video_id: String,
}

#[derive(Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: Thumbnails,
    #[serde(rename = "channelTitle")]
    channel_title: String,
    #[serde(rename = "publishedAt")]
    published_at: String,
}

#[derive(Deserialize, Default)]
struct Thumbnails {
    medium: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Deserialize)]
struct VideoItem {
    #[serde(rename = "contentDetails")]
    content_details: ContentDetails,
}

#[derive(Deserialize)]
struct ContentDetails {
    duration: String,
}

//=========================================================================================
// `VideoSearchService` Trait Implementation
//=========================================================================================

#[async_trait]
impl VideoSearchService for YoutubeAdapter {
    async fn search(&self, query: &str, max_results: u32) -> PortResult<Vec<VideoResult>> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            PortError::Configuration(
                "YouTube API key not configured. Please check your environment variables."
                    .to_string(),
            )
        })?;

        let max_results = max_results.to_string();
        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("part", "id,snippet"),
                ("q", query),
                ("maxResults", max_results.as_str()),
                ("type", "video"),
                ("order", "relevance"),
                ("key", key),
            ])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let response = Self::check_status(response).await?;

        let search: SearchListResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut videos = Vec::with_capacity(search.items.len());
        for item in search.items {
            // One extra round trip per result; a failing lookup aborts the
            // whole response.
            let duration = self.fetch_duration(key, &item.id.video_id).await?;
            let snippet = item.snippet;
            videos.push(VideoResult {
                url: format!("https://www.youtube.com/watch?v={}", item.id.video_id),
                id: item.id.video_id,
                title: snippet.title,
                description: Self::truncate_description(&snippet.description),
                thumbnail: snippet
                    .thumbnails
                    .medium
                    .map(|t| t.url)
                    .unwrap_or_default(),
                channel: snippet.channel_title,
                published_at: snippet.published_at,
                duration,
                source: "youtube".to_string(),
            });
        }

        Ok(videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_descriptions_pass_through() {
        let text = "a short description";
        assert_eq!(YoutubeAdapter::truncate_description(text), text);
    }

    #[test]
    fn boundary_description_is_not_truncated() {
        let text = "x".repeat(200);
        assert_eq!(YoutubeAdapter::truncate_description(&text), text);
    }

    #[test]
    fn long_descriptions_get_an_ellipsis() {
        let text = "x".repeat(201);
        let truncated = YoutubeAdapter::truncate_description(&text);
        assert_eq!(truncated.chars().count(), 203);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let text = "é".repeat(250);
        let truncated = YoutubeAdapter::truncate_description(&text);
        assert!(truncated.starts_with(&"é".repeat(200)));
        assert!(truncated.ends_with("..."));
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_error() {
        let adapter = YoutubeAdapter::new(None);
        let err = adapter.search("rust", 20).await.unwrap_err();
        assert!(matches!(err, PortError::Configuration(_)));
    }
}
