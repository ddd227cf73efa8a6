//! Per-candidate stages of the ingestion pipeline.
//!
//! Gating stages return [`Skip`] so the controller can tell a deliberate
//! rejection from a collaborator failure. Every other stage is total.

pub mod assemble;
pub mod classify;
pub mod dedup;
pub mod extract;
pub mod relevance;
pub mod state;
pub mod translate;
pub mod trust;

use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::traits::{CompletionRequest, TextCompleter};

pub use state::{PipelineConfig, RunState};

/// A collaborator call failed. The candidate is abandoned, the run goes on.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("translation failed: {0:#}")]
    Translate(anyhow::Error),

    #[error("confidence scoring failed: {0:#}")]
    Confidence(anyhow::Error),

    #[error("classification failed: {0:#}")]
    Classify(anyhow::Error),

    #[error("sink write failed: {0:#}")]
    Write(anyhow::Error),
}

impl StageError {
    pub fn stage(&self) -> &'static str {
        match self {
            StageError::Translate(_) => "translate",
            StageError::Confidence(_) => "confidence",
            StageError::Classify(_) => "classify",
            StageError::Write(_) => "write",
        }
    }
}

/// A gate said no.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Duplicate,
    KeywordMismatch,
    LowConfidence { score: f32 },
    CategoryOutsideVocabulary { label: String },
    NoIngredients,
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::Duplicate => "duplicate",
            Rejection::KeywordMismatch => "keyword_mismatch",
            Rejection::LowConfidence { .. } => "low_confidence",
            Rejection::CategoryOutsideVocabulary { .. } => "category_outside_vocabulary",
            Rejection::NoIngredients => "no_ingredients",
        }
    }
}

/// Why a candidate did not produce a record.
#[derive(Debug)]
pub enum Skip {
    Rejected(Rejection),
    Failed(StageError),
}

impl From<Rejection> for Skip {
    fn from(r: Rejection) -> Self {
        Skip::Rejected(r)
    }
}

impl From<StageError> for Skip {
    fn from(e: StageError) -> Self {
        Skip::Failed(e)
    }
}

/// Counts completions passing through, so the controller knows whether a
/// candidate reached a model call and must be throttled.
pub struct MeteredCompleter<'a> {
    inner: &'a dyn TextCompleter,
    calls: AtomicU32,
}

impl<'a> MeteredCompleter<'a> {
    pub fn new(inner: &'a dyn TextCompleter) -> Self {
        Self {
            inner,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TextCompleter for MeteredCompleter<'_> {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.complete(request).await
    }
}

/// Model prompts see at most this many bytes of a document.
pub(crate) const MAX_PROMPT_BYTES: usize = 12_000;

pub(crate) fn prompt_excerpt(text: &str) -> &str {
    ai_client::truncate_to_char_boundary(text, MAX_PROMPT_BYTES)
}
