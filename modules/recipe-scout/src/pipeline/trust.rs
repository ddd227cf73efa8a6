//! Channel reputation. A channel whose recent uploads are mostly on-topic is
//! trusted for the rest of the run (and across runs when persisted); its
//! candidates skip the keyword and confidence checks.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::pipeline::relevance::KeywordSet;
use crate::traits::VideoSource;

#[derive(Debug, Clone, Default)]
pub struct TrustCache {
    trusted: HashSet<String>,
}

impl TrustCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a persisted cache. A missing or unreadable file starts empty.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "No trust cache on disk, starting empty");
            return Self::new();
        }
        match Self::read(path) {
            Ok(cache) => {
                info!(path = %path.display(), channels = cache.len(), "Trust cache loaded");
                cache
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Trust cache unreadable, starting empty");
                Self::new()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let ids: Vec<String> = serde_json::from_str(&json)?;
        Ok(Self::from_iter(ids))
    }

    /// Persist as a sorted JSON array.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let sorted: BTreeSet<&String> = self.trusted.iter().collect();
        std::fs::write(path, serde_json::to_string_pretty(&sorted)?)
            .with_context(|| format!("Failed to write trust cache {}", path.display()))?;
        info!(path = %path.display(), channels = sorted.len(), "Trust cache saved");
        Ok(())
    }

    pub fn is_trusted(&self, channel_id: &str) -> bool {
        self.trusted.contains(channel_id)
    }

    /// Mark a channel trusted. Returns true if it was not already.
    pub fn trust(&mut self, channel_id: &str) -> bool {
        self.trusted.insert(channel_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.trusted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trusted.is_empty()
    }
}

impl FromIterator<String> for TrustCache {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            trusted: iter.into_iter().filter(|id| !id.trim().is_empty()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustPolicy {
    pub sample_size: u32,
    pub threshold: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustDecision {
    /// Cached from an earlier candidate or run. No calls made.
    AlreadyTrusted,
    NewlyTrusted { matches: u32 },
    NotTrusted { matches: u32 },
    /// Upload sampling failed; treated as untrusted and not cached.
    SamplingFailed,
}

impl TrustDecision {
    pub fn is_trusted(self) -> bool {
        matches!(self, TrustDecision::AlreadyTrusted | TrustDecision::NewlyTrusted { .. })
    }
}

/// Decide whether `channel_id` is trusted, sampling its recent uploads if
/// the cache has no answer. Never revokes trust.
pub async fn evaluate(
    source: &dyn VideoSource,
    cache: &mut TrustCache,
    channel_id: &str,
    keywords: &KeywordSet,
    policy: TrustPolicy,
) -> TrustDecision {
    if cache.is_trusted(channel_id) {
        return TrustDecision::AlreadyTrusted;
    }
    if channel_id.trim().is_empty() || policy.sample_size == 0 {
        return TrustDecision::NotTrusted { matches: 0 };
    }

    let uploads = match source.recent_uploads(channel_id, policy.sample_size).await {
        Ok(uploads) => uploads,
        Err(e) => {
            warn!(channel_id, error = %e, "Channel sampling failed, treating as untrusted");
            return TrustDecision::SamplingFailed;
        }
    };

    let matches = uploads
        .iter()
        .take(policy.sample_size as usize)
        .filter(|u| keywords.matches(&u.headline()))
        .count() as u32;

    if matches >= policy.threshold {
        cache.trust(channel_id);
        info!(channel_id, matches, sampled = uploads.len(), "Channel trusted");
        TrustDecision::NewlyTrusted { matches }
    } else {
        TrustDecision::NotTrusted { matches }
    }
}
