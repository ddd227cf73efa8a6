// Test mocks for the scout pipeline.
//
// Three mocks matching the three trait boundaries:
// - MockVideoSource (VideoSource): HashMap-based query/channel/video → response
// - ScriptedCompleter (TextCompleter): rule-based replies keyed on prompt text
// - MemorySink (RecordSink): stateful in-memory store keyed by video id
//
// Plus `candidate()` for building CandidateItems.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use recipe_common::{CandidateItem, ExtractedRecord};

use crate::traits::{
    CompletionRequest, RecordSink, SearchPage, TextCompleter, TranscriptSegment, VideoSource,
    VideoStatistics,
};

/// A candidate with the given id, channel, title and description.
pub fn candidate(id: &str, channel_id: &str, title: &str, description: &str) -> CandidateItem {
    CandidateItem {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        channel: format!("channel {channel_id}"),
        channel_id: channel_id.to_string(),
        raw_stats: BTreeMap::new(),
    }
}

// ---------------------------------------------------------------------------
// MockVideoSource
// ---------------------------------------------------------------------------

/// Returns `Err` for anything unregistered.
/// Builder pattern: `.on_search()`, `.on_uploads()`, `.on_transcript()`,
/// `.on_comments()`, `.on_views()`.
///
/// Each `.on_search()` call for the same query registers the next page;
/// page tokens are generated so the pages chain in registration order.
#[derive(Default)]
pub struct MockVideoSource {
    searches: HashMap<String, Vec<Vec<CandidateItem>>>,
    failing_searches: HashSet<String>,
    uploads: HashMap<String, Vec<CandidateItem>>,
    transcripts: HashMap<String, String>,
    comments: HashMap<String, Vec<String>>,
    views: HashMap<String, u64>,
    search_log: Mutex<Vec<(String, Option<String>)>>,
    upload_log: Mutex<Vec<String>>,
}

impl MockVideoSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_search(mut self, query: &str, items: Vec<CandidateItem>) -> Self {
        self.searches.entry(query.to_string()).or_default().push(items);
        self
    }

    pub fn failing_search(mut self, query: &str) -> Self {
        self.failing_searches.insert(query.to_string());
        self
    }

    pub fn on_uploads(mut self, channel_id: &str, uploads: Vec<CandidateItem>) -> Self {
        self.uploads.insert(channel_id.to_string(), uploads);
        self
    }

    pub fn on_transcript(mut self, video_id: &str, text: &str) -> Self {
        self.transcripts.insert(video_id.to_string(), text.to_string());
        self
    }

    pub fn on_comments(mut self, video_id: &str, comments: &[&str]) -> Self {
        self.comments.insert(
            video_id.to_string(),
            comments.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    pub fn on_views(mut self, video_id: &str, views: u64) -> Self {
        self.views.insert(video_id.to_string(), views);
        self
    }

    /// Every `(query, page_token)` searched, in order.
    pub fn searches(&self) -> Vec<(String, Option<String>)> {
        self.search_log.lock().unwrap().clone()
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_log.lock().unwrap().len()
    }

    fn page_token(query: &str, index: usize) -> String {
        format!("{query}#{index}")
    }
}

#[async_trait]
impl VideoSource for MockVideoSource {
    async fn search(&self, query: &str, page_token: Option<&str>) -> Result<SearchPage> {
        self.search_log
            .lock()
            .unwrap()
            .push((query.to_string(), page_token.map(String::from)));

        if self.failing_searches.contains(query) {
            bail!("MockVideoSource: search failure for {query}");
        }
        let pages = self
            .searches
            .get(query)
            .ok_or_else(|| anyhow!("MockVideoSource: no search registered for {query}"))?;

        let index = match page_token {
            None => 0,
            Some(token) => token
                .rsplit_once('#')
                .and_then(|(_, i)| i.parse::<usize>().ok())
                .ok_or_else(|| anyhow!("MockVideoSource: bad page token {token}"))?,
        };
        let items = pages
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow!("MockVideoSource: no page {index} for {query}"))?;
        let next_page_token = (index + 1 < pages.len()).then(|| Self::page_token(query, index + 1));

        Ok(SearchPage {
            items,
            next_page_token,
        })
    }

    async fn transcript(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        let text = self
            .transcripts
            .get(video_id)
            .ok_or_else(|| anyhow!("MockVideoSource: no transcript registered for {video_id}"))?;
        Ok(vec![TranscriptSegment {
            text: text.clone(),
            start: 0.0,
            duration: 0.0,
        }])
    }

    async fn statistics(&self, video_id: &str) -> Result<VideoStatistics> {
        let view_count = *self
            .views
            .get(video_id)
            .ok_or_else(|| anyhow!("MockVideoSource: no statistics registered for {video_id}"))?;
        Ok(VideoStatistics {
            view_count,
            ..Default::default()
        })
    }

    async fn comments(&self, video_id: &str, limit: u32) -> Result<Vec<String>> {
        let comments = self
            .comments
            .get(video_id)
            .ok_or_else(|| anyhow!("MockVideoSource: no comments registered for {video_id}"))?;
        Ok(comments.iter().take(limit as usize).cloned().collect())
    }

    async fn recent_uploads(&self, channel_id: &str, limit: u32) -> Result<Vec<CandidateItem>> {
        self.upload_log.lock().unwrap().push(channel_id.to_string());
        let uploads = self
            .uploads
            .get(channel_id)
            .ok_or_else(|| anyhow!("MockVideoSource: no uploads registered for {channel_id}"))?;
        Ok(uploads.iter().take(limit as usize).cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// ScriptedCompleter
// ---------------------------------------------------------------------------

enum Reply {
    Text(String),
    Fail,
}

/// Replies by the first rule whose needle appears in the system or user
/// prompt. Unmatched prompts are an error. Every request is recorded.
#[derive(Default)]
pub struct ScriptedCompleter {
    rules: Vec<(String, Reply)>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), Reply::Text(reply.to_string())));
        self
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.rules.push((needle.to_string(), Reply::Fail));
        self
    }

    /// Rules for a full happy path: every relevance score is `confidence`,
    /// every classification is `category`, details are empty JSON lists.
    pub fn recipe_defaults(self, confidence: &str, category: &str) -> Self {
        self.on("You judge whether", confidence)
            .on("You classify cooking videos", category)
            .on("extract recipe details", r#"{"instructions": [], "hashtags": []}"#)
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Calls whose system or user prompt contains `needle`.
    pub fn calls_matching(&self, needle: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.system.contains(needle) || r.user.contains(needle))
            .count()
    }
}

#[async_trait]
impl TextCompleter for ScriptedCompleter {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| request.system.contains(needle.as_str()) || request.user.contains(needle.as_str()))
            .map(|(_, reply)| reply);
        let system_head: String = request.system.chars().take(40).collect();
        self.calls.lock().unwrap().push(request);

        match reply {
            Some(Reply::Text(text)) => Ok(text.clone()),
            Some(Reply::Fail) => bail!("ScriptedCompleter: scripted failure"),
            None => bail!("ScriptedCompleter: no rule for prompt starting {system_head:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// In-memory store keyed by video id. Writes replace by key.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<ExtractedRecord>>,
    preexisting: HashSet<String>,
    failing_ids: HashSet<String>,
    fail_snapshot: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids the store already holds from an earlier run.
    pub fn with_existing<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preexisting.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn failing_on(mut self, video_id: &str) -> Self {
        self.failing_ids.insert(video_id.to_string());
        self
    }

    pub fn failing_snapshot(mut self) -> Self {
        self.fail_snapshot = true;
        self
    }

    pub fn records(&self) -> Vec<ExtractedRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn written_ids(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.video_id.clone())
            .collect()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn existing_keys(&self, _page_size: u32) -> Result<HashSet<String>> {
        if self.fail_snapshot {
            bail!("MemorySink: snapshot unavailable");
        }
        let mut keys = self.preexisting.clone();
        keys.extend(self.written_ids());
        Ok(keys)
    }

    async fn upsert(&self, record: &ExtractedRecord) -> Result<String> {
        if self.failing_ids.contains(&record.video_id) {
            bail!("MemorySink: write failure for {}", record.video_id);
        }
        let mut records = self.records.lock().unwrap();
        records.retain(|r| r.video_id != record.video_id);
        records.push(record.clone());
        Ok(format!("mem-{}", record.video_id))
    }
}
