//! Scout run log: persisted JSON timeline of every decision taken during a run.
//!
//! Each run produces a single `{DATA_DIR}/scout-runs/{run_id}.json` file
//! containing the final stats and an ordered list of events with timestamps.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::scout::ScoutStats;

pub struct RunLog {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    events: Vec<RunEvent>,
    seq: u32,
}

#[derive(Debug, Serialize)]
struct RunEvent {
    seq: u32,
    ts: DateTime<Utc>,
    #[serde(flatten)]
    kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    SnapshotLoaded {
        existing_ids: u32,
        trusted_channels: u32,
    },
    SearchPage {
        query: String,
        page: u32,
        results: u32,
    },
    SearchFailed {
        query: String,
        error: String,
    },
    ChannelTrusted {
        channel_id: String,
        matches: u32,
    },
    CategoryDiscovered {
        video_id: String,
        category: String,
    },
    CandidateRejected {
        video_id: String,
        reason: String,
        detail: Option<String>,
    },
    CandidateFailed {
        video_id: String,
        stage: String,
        error: String,
    },
    RecordWritten {
        video_id: String,
        record_id: String,
        category: String,
        trusted: bool,
    },
    KeywordLearned {
        keyword: String,
    },
}

impl RunLog {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            events: Vec::new(),
            seq: 0,
        }
    }

    pub fn log(&mut self, kind: EventKind) {
        self.events.push(RunEvent {
            seq: self.seq,
            ts: Utc::now(),
            kind,
        });
        self.seq += 1;
    }

    pub fn events(&self) -> impl Iterator<Item = &EventKind> {
        self.events.iter().map(|e| &e.kind)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Serialize the run log to JSON under `data_dir` and write it to disk.
    /// Returns the file path on success.
    pub fn save(&self, data_dir: &Path, stats: &ScoutStats) -> Result<PathBuf> {
        let dir = data_dir.join("scout-runs");
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.json", self.run_id));

        let output = SerializedRunLog {
            run_id: &self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            stats,
            events: &self.events,
        };

        std::fs::write(&path, serde_json::to_string_pretty(&output)?)?;
        info!(path = %path.display(), events = self.events.len(), "Scout run log saved");

        Ok(path)
    }
}

#[derive(Serialize)]
struct SerializedRunLog<'a> {
    run_id: &'a str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    stats: &'a ScoutStats,
    events: &'a [RunEvent],
}
