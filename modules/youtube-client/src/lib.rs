pub mod error;
pub mod transcript;
pub mod types;

pub use error::{Result, YoutubeError};
pub use types::{SearchPage, TranscriptSegment, VideoStatistics, VideoSummary};

use serde::de::DeserializeOwned;
use types::{ChannelItem, CommentThread, ListResponse, PlaylistItem, SearchItem, VideoItem};

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Public caption endpoint; needs no OAuth, unlike `captions.download`.
const TIMEDTEXT_URL: &str = "https://www.youtube.com/api/timedtext";

/// The Data API caps `maxResults` at 50 for every list call used here.
const MAX_RESULTS: u32 = 50;

pub struct YoutubeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    region_code: String,
    relevance_language: String,
}

impl YoutubeClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: BASE_URL.to_string(),
            region_code: "KR".to_string(),
            relevance_language: "ko".to_string(),
        }
    }

    pub fn with_region(mut self, region_code: impl Into<String>, language: impl Into<String>) -> Self {
        self.region_code = region_code.into();
        self.relevance_language = language.into();
        self
    }

    async fn get<T: DeserializeOwned>(&self, resource: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, resource);
        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(YoutubeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }

    /// One page of video search results for `query`.
    pub async fn search(&self, query: &str, page_token: Option<&str>, limit: u32) -> Result<SearchPage> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("q", query.to_string()),
            ("maxResults", limit.min(MAX_RESULTS).to_string()),
            ("regionCode", self.region_code.clone()),
            ("relevanceLanguage", self.relevance_language.clone()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let resp: ListResponse<SearchItem> = self.get("search", &params).await?;
        let videos: Vec<VideoSummary> = resp
            .items
            .into_iter()
            .filter_map(|item| {
                let id = item.id.video_id?;
                Some(item.snippet.into_summary(id))
            })
            .collect();
        tracing::debug!(query, count = videos.len(), "YouTube search page fetched");

        Ok(SearchPage {
            videos,
            next_page_token: resp.next_page_token,
        })
    }

    /// View / like / comment counts for a single video.
    pub async fn statistics(&self, video_id: &str) -> Result<VideoStatistics> {
        let params = [("part", "statistics".to_string()), ("id", video_id.to_string())];
        let resp: ListResponse<VideoItem> = self.get("videos", &params).await?;
        resp.items
            .into_iter()
            .find(|v| v.id == video_id)
            .map(|v| v.statistics.into())
            .ok_or_else(|| YoutubeError::NotFound(format!("video {video_id}")))
    }

    /// The channel's most recent uploads, newest first.
    pub async fn recent_uploads(&self, channel_id: &str, limit: u32) -> Result<Vec<VideoSummary>> {
        let params = [("part", "contentDetails".to_string()), ("id", channel_id.to_string())];
        let channels: ListResponse<ChannelItem> = self.get("channels", &params).await?;
        let uploads = channels
            .items
            .into_iter()
            .next()
            .map(|c| c.content_details.related_playlists.uploads)
            .ok_or_else(|| YoutubeError::NotFound(format!("channel {channel_id}")))?;

        let params = [
            ("part", "snippet".to_string()),
            ("playlistId", uploads),
            ("maxResults", limit.min(MAX_RESULTS).to_string()),
        ];
        let resp: ListResponse<PlaylistItem> = self.get("playlistItems", &params).await?;

        Ok(resp
            .items
            .into_iter()
            .filter_map(|item| {
                let id = item.snippet.resource_id.as_ref()?.video_id.clone()?;
                Some(item.snippet.into_summary(id))
            })
            .collect())
    }

    /// Top-level comment texts ordered by relevance.
    pub async fn top_comments(&self, video_id: &str, limit: u32) -> Result<Vec<String>> {
        let params = [
            ("part", "snippet".to_string()),
            ("videoId", video_id.to_string()),
            ("maxResults", limit.min(MAX_RESULTS).to_string()),
            ("order", "relevance".to_string()),
            ("textFormat", "plainText".to_string()),
        ];
        let resp: ListResponse<CommentThread> = self.get("commentThreads", &params).await?;

        Ok(resp
            .items
            .into_iter()
            .map(|t| t.snippet.top_level_comment.snippet.text_display)
            .filter(|t| !t.trim().is_empty())
            .collect())
    }

    /// Caption track in the first available language from `languages`.
    pub async fn transcript(&self, video_id: &str, languages: &[&str]) -> Result<Vec<TranscriptSegment>> {
        for lang in languages {
            let resp = self
                .client
                .get(TIMEDTEXT_URL)
                .query(&[("v", video_id), ("lang", *lang)])
                .send()
                .await?;

            if !resp.status().is_success() {
                tracing::debug!(video_id, lang, status = %resp.status(), "No timedtext track");
                continue;
            }

            let body = resp.text().await?;
            let segments = transcript::parse_timedtext(&body);
            if !segments.is_empty() {
                return Ok(segments);
            }
        }

        Err(YoutubeError::NotFound(format!("transcript for {video_id}")))
    }
}
