// Trait abstractions for the scout's external collaborators.
//
// VideoSource: search, transcripts, statistics, comments, channel uploads.
// TextCompleter: one chat completion, optionally schema-constrained.
// RecordSink: the dedup snapshot plus idempotent-by-key writes.
//
// The pipeline only ever sees these traits, so tests run against the
// in-memory mocks in `testing.rs` with no network.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use ai_client::{ChatOptions, OpenAi};
use recipe_common::{CandidateItem, ExtractedRecord};
use youtube_client::{VideoSummary, YoutubeClient};

pub use youtube_client::{TranscriptSegment, VideoStatistics};

/// Results requested per search call.
const SEARCH_PAGE_SIZE: u32 = 50;

/// Caption languages tried in order.
const TRANSCRIPT_LANGUAGES: &[&str] = &["ko", "en"];

// ---------------------------------------------------------------------------
// VideoSource
// ---------------------------------------------------------------------------

/// One page of candidates for a query.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub items: Vec<CandidateItem>,
    pub next_page_token: Option<String>,
}

#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Search for videos. `page_token` continues a previous page.
    async fn search(&self, query: &str, page_token: Option<&str>) -> Result<SearchPage>;

    /// Caption cues for a video.
    async fn transcript(&self, video_id: &str) -> Result<Vec<TranscriptSegment>>;

    async fn statistics(&self, video_id: &str) -> Result<VideoStatistics>;

    /// Up to `limit` top-level comment texts.
    async fn comments(&self, video_id: &str, limit: u32) -> Result<Vec<String>>;

    /// The channel's `limit` most recent uploads.
    async fn recent_uploads(&self, channel_id: &str, limit: u32) -> Result<Vec<CandidateItem>>;
}

fn candidate_from(video: VideoSummary) -> CandidateItem {
    let mut raw_stats = std::collections::BTreeMap::new();
    if let Some(published) = video.published_at {
        raw_stats.insert("published_at".to_string(), published.to_rfc3339());
    }
    CandidateItem {
        id: video.video_id,
        title: video.title,
        description: video.description,
        channel: video.channel_title,
        channel_id: video.channel_id,
        raw_stats,
    }
}

#[async_trait]
impl VideoSource for YoutubeClient {
    async fn search(&self, query: &str, page_token: Option<&str>) -> Result<SearchPage> {
        let page = self.search(query, page_token, SEARCH_PAGE_SIZE).await?;
        Ok(SearchPage {
            items: page.videos.into_iter().map(candidate_from).collect(),
            next_page_token: page.next_page_token,
        })
    }

    async fn transcript(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        Ok(self.transcript(video_id, TRANSCRIPT_LANGUAGES).await?)
    }

    async fn statistics(&self, video_id: &str) -> Result<VideoStatistics> {
        Ok(self.statistics(video_id).await?)
    }

    async fn comments(&self, video_id: &str, limit: u32) -> Result<Vec<String>> {
        Ok(self.top_comments(video_id, limit).await?)
    }

    async fn recent_uploads(&self, channel_id: &str, limit: u32) -> Result<Vec<CandidateItem>> {
        let uploads = self.recent_uploads(channel_id, limit).await?;
        Ok(uploads.into_iter().map(candidate_from).collect())
    }
}

// ---------------------------------------------------------------------------
// TextCompleter
// ---------------------------------------------------------------------------

/// A single completion: prompts, token budget, temperature, and an optional
/// JSON schema the answer must conform to.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub json_schema: Option<Value>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens,
            temperature: 0.0,
            json_schema: None,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.json_schema = Some(schema);
        self
    }
}

#[async_trait]
pub trait TextCompleter: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

#[async_trait]
impl TextCompleter for OpenAi {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let options = ChatOptions {
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        let text = match request.json_schema {
            Some(schema) => {
                self.structured_output(&request.system, &request.user, options, schema)
                    .await?
            }
            None => self.chat(Some(&request.system), &request.user, options).await?,
        };
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// RecordSink
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Keys already present in the store. Fetched once per run.
    async fn existing_keys(&self, page_size: u32) -> Result<HashSet<String>>;

    /// Write one record keyed by `video_id`. Returns the store's record id.
    async fn upsert(&self, record: &ExtractedRecord) -> Result<String>;
}
