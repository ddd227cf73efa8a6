//! Run-scoped state and pipeline settings.
//!
//! `RunState` is owned by the controller and lent `&mut` to the stages that
//! grow it. Everything in it only ever grows during a run.

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use typed_builder::TypedBuilder;

use recipe_common::{
    CategoryLabel, CategoryMode, Config, DEFAULT_CATEGORY_VOCABULARY, DEFAULT_KEYWORDS,
    DEFAULT_SEARCH_QUERIES,
};

use crate::pipeline::relevance::KeywordSet;
use crate::pipeline::trust::{TrustCache, TrustPolicy};
use crate::scout::ScoutStats;

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Settings for one run: quota, query plan, filters, and which optional
/// stages are on.
#[derive(Debug, Clone, TypedBuilder)]
pub struct PipelineConfig {
    #[builder(default = 100)]
    pub daily_quota: u32,
    #[builder(default = owned(DEFAULT_SEARCH_QUERIES))]
    pub search_queries: Vec<String>,
    #[builder(default = 5)]
    pub max_pages_per_query: u32,
    #[builder(default = Duration::from_secs(1))]
    pub item_delay: Duration,
    #[builder(default = 100)]
    pub existing_page_size: u32,
    #[builder(default = 20)]
    pub comment_limit: u32,

    #[builder(default = owned(DEFAULT_KEYWORDS))]
    pub keyword_filter: Vec<String>,
    #[builder(default = owned(DEFAULT_CATEGORY_VOCABULARY))]
    pub category_vocabulary: Vec<String>,
    #[builder(default)]
    pub category_mode: CategoryMode,
    #[builder(default = 7)]
    pub trust_threshold: u32,
    #[builder(default = 10)]
    pub trust_sample_size: u32,
    #[builder(default = 0.7)]
    pub confidence_threshold: f32,
    #[builder(default)]
    pub require_ingredients: bool,

    /// Translate non-Korean documents before scoring.
    #[builder(default = true)]
    pub translate: bool,
    /// Sample channels and let trusted ones bypass the relevance checks.
    #[builder(default = true)]
    pub trust_gate: bool,
    /// Translate non-Korean instruction and ingredient lines.
    #[builder(default = true)]
    pub translate_fields: bool,
    #[builder(default)]
    pub shuffle_candidates: bool,
    #[builder(default, setter(strip_option, into))]
    pub coupang_partner_id: Option<String>,
}

impl PipelineConfig {
    pub fn trust_policy(&self) -> TrustPolicy {
        TrustPolicy {
            sample_size: self.trust_sample_size,
            threshold: self.trust_threshold,
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            daily_quota: config.daily_quota,
            search_queries: config.search_queries.clone(),
            max_pages_per_query: config.max_pages_per_query,
            item_delay: config.item_delay,
            existing_page_size: config.existing_page_size,
            comment_limit: 20,
            keyword_filter: config.keyword_filter.clone(),
            category_vocabulary: config.category_vocabulary.clone(),
            category_mode: config.category_mode,
            trust_threshold: config.trust_threshold,
            trust_sample_size: config.trust_sample_size,
            confidence_threshold: config.confidence_threshold,
            require_ingredients: config.require_ingredients,
            translate: true,
            trust_gate: true,
            translate_fields: true,
            shuffle_candidates: config.shuffle_candidates,
            coupang_partner_id: config.coupang_partner_id.clone(),
        }
    }
}

/// Mutable state for one scout run.
pub struct RunState {
    /// Sink snapshot plus every id written this run.
    pub existing_ids: HashSet<String>,

    pub trust: TrustCache,

    /// Configured keywords plus dish names learned from accepted labels.
    pub keywords: KeywordSet,

    /// Dynamic-mode labels outside the configured vocabulary.
    pub discovered_categories: BTreeSet<CategoryLabel>,

    pub stats: ScoutStats,
}

impl RunState {
    pub fn new(existing_ids: HashSet<String>, trust: TrustCache, keywords: KeywordSet) -> Self {
        Self {
            existing_ids,
            trust,
            keywords,
            discovered_categories: BTreeSet::new(),
            stats: ScoutStats::default(),
        }
    }

    pub fn quota_met(&self, quota: u32) -> bool {
        self.stats.records_written >= quota
    }

    /// Record a successful write so later duplicates in this run are skipped.
    pub fn mark_written(&mut self, video_id: &str) {
        self.existing_ids.insert(video_id.to_string());
        self.stats.records_written += 1;
    }
}
