use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

// --- Platform-facing results ---

/// A video as seen from search or a channel's uploads playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub videos: Vec<VideoSummary>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoStatistics {
    pub view_count: u64,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
}

/// One caption cue from the timedtext endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

// --- Wire types (Data API v3) ---

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Snippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "channelId", default)]
    pub channel_id: String,
    #[serde(rename = "channelTitle", default)]
    pub channel_title: String,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(rename = "resourceId")]
    pub resource_id: Option<ResourceId>,
}

impl Snippet {
    pub fn into_summary(self, video_id: String) -> VideoSummary {
        VideoSummary {
            video_id,
            title: self.title,
            description: self.description,
            channel_id: self.channel_id,
            channel_title: self.channel_title,
            published_at: self.published_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResourceId {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

/// `search.list` item. `id.videoId` is absent for channel/playlist hits.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchItem {
    pub id: ResourceId,
    pub snippet: Snippet,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PlaylistItem {
    pub snippet: Snippet,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct VideoItem {
    pub id: String,
    #[serde(default)]
    pub statistics: WireStatistics,
}

/// The Data API encodes counts as decimal strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct WireStatistics {
    #[serde(rename = "viewCount", default, deserialize_with = "count")]
    pub view_count: Option<u64>,
    #[serde(rename = "likeCount", default, deserialize_with = "count")]
    pub like_count: Option<u64>,
    #[serde(rename = "commentCount", default, deserialize_with = "count")]
    pub comment_count: Option<u64>,
}

impl From<WireStatistics> for VideoStatistics {
    fn from(s: WireStatistics) -> Self {
        Self {
            view_count: s.view_count.unwrap_or(0),
            like_count: s.like_count,
            comment_count: s.comment_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChannelItem {
    #[serde(rename = "contentDetails")]
    pub content_details: ChannelContentDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChannelContentDetails {
    #[serde(rename = "relatedPlaylists")]
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RelatedPlaylists {
    pub uploads: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommentThread {
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommentThreadSnippet {
    #[serde(rename = "topLevelComment")]
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TopLevelComment {
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommentSnippet {
    #[serde(rename = "textDisplay", default)]
    pub text_display: String,
}

fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Text(String),
        Number(u64),
    }

    Ok(match Option::<Count>::deserialize(deserializer)? {
        Some(Count::Number(n)) => Some(n),
        Some(Count::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}
