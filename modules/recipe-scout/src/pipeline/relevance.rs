use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::pipeline::{prompt_excerpt, StageError};
use crate::traits::{CompletionRequest, TextCompleter};

const CONFIDENCE_SYSTEM: &str = "You judge whether a video transcript describes a cooking \
process. Reply with a single number between 0 and 1, where 1 means it certainly walks \
through cooking a dish. Reply with the number only.";

const CONFIDENCE_MAX_TOKENS: u32 = 8;

// ---------------------------------------------------------------------------
// KeywordSet
// ---------------------------------------------------------------------------

/// Case-insensitive substring keywords. Grows during a run, never shrinks.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for kw in keywords {
            set.add(kw.as_ref());
        }
        set
    }

    /// Add a keyword. Returns false for blanks and duplicates.
    pub fn add(&mut self, keyword: &str) -> bool {
        let kw = keyword.trim().to_lowercase();
        if kw.is_empty() || self.keywords.contains(&kw) {
            return false;
        }
        self.keywords.push(kw);
        true
    }

    pub fn matches(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.keywords.iter().any(|kw| haystack.contains(kw.as_str()))
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Confidence
// ---------------------------------------------------------------------------

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?[%/]?").expect("valid regex"))
}

/// Read a model score. The reply must carry exactly one number in [0, 1];
/// anything else (percentages, ratios, out-of-range values) is 0.0.
pub fn parse_confidence(raw: &str) -> f32 {
    let trimmed = raw.trim();
    let value = trimmed.parse::<f32>().ok().or_else(|| {
        let mut tokens = number_re().find_iter(trimmed);
        match (tokens.next(), tokens.next()) {
            (Some(token), None) => token.as_str().parse::<f32>().ok(),
            _ => None,
        }
    });
    match value {
        Some(v) if (0.0..=1.0).contains(&v) => v,
        _ => 0.0,
    }
}

pub fn meets_threshold(score: f32, threshold: f32) -> bool {
    score >= threshold
}

/// Ask the model how likely the document is to describe cooking.
pub async fn score_confidence(
    completer: &dyn TextCompleter,
    document: &str,
) -> Result<f32, StageError> {
    let request = CompletionRequest::new(CONFIDENCE_SYSTEM, prompt_excerpt(document), CONFIDENCE_MAX_TOKENS);
    let raw = completer
        .complete(request)
        .await
        .map_err(StageError::Confidence)?;
    let score = parse_confidence(&raw);
    debug!(raw = raw.as_str(), score, "Confidence scored");
    Ok(score)
}
