use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use recipe_common::{CandidateItem, CategoryLabel, ExtractedRecord, IngredientList};

use crate::pipeline::classify::{self, Classification};
use crate::pipeline::extract::{self, RecipeDetails};
use crate::pipeline::relevance::{self, KeywordSet};
use crate::pipeline::trust::{self, TrustCache, TrustDecision};
use crate::pipeline::{
    assemble, dedup, translate, MeteredCompleter, PipelineConfig, Rejection, RunState, Skip,
    StageError,
};
use crate::run_log::{EventKind, RunLog};
use crate::traits::{RecordSink, TextCompleter, VideoSource};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoutStats {
    pub pages_fetched: u32,
    pub search_failures: u32,
    pub candidates_seen: u32,
    pub duplicates_skipped: u32,
    pub keyword_rejected: u32,
    pub low_confidence_rejected: u32,
    pub category_rejected: u32,
    pub missing_ingredients: u32,
    pub stage_failures: u32,
    pub write_failures: u32,
    pub channels_trusted: u32,
    pub trusted_bypasses: u32,
    pub categories_discovered: u32,
    pub keywords_learned: u32,
    pub model_calls: u32,
    pub records_written: u32,
}

impl std::fmt::Display for ScoutStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Scout Run Complete ===")?;
        writeln!(f, "Pages fetched:      {}", self.pages_fetched)?;
        writeln!(f, "Search failures:    {}", self.search_failures)?;
        writeln!(f, "Candidates seen:    {}", self.candidates_seen)?;
        writeln!(f, "Records written:    {}", self.records_written)?;
        writeln!(f, "\nSkipped:")?;
        writeln!(f, "  Duplicates:       {}", self.duplicates_skipped)?;
        writeln!(f, "  Keyword mismatch: {}", self.keyword_rejected)?;
        writeln!(f, "  Low confidence:   {}", self.low_confidence_rejected)?;
        writeln!(f, "  Category:         {}", self.category_rejected)?;
        writeln!(f, "  No ingredients:   {}", self.missing_ingredients)?;
        writeln!(f, "  Stage failures:   {}", self.stage_failures)?;
        writeln!(f, "  Write failures:   {}", self.write_failures)?;
        writeln!(f, "\nRun state:")?;
        writeln!(f, "  Channels trusted:      {}", self.channels_trusted)?;
        writeln!(f, "  Trusted bypasses:      {}", self.trusted_bypasses)?;
        writeln!(f, "  Categories discovered: {}", self.categories_discovered)?;
        writeln!(f, "  Keywords learned:      {}", self.keywords_learned)?;
        writeln!(f, "  Model calls:           {}", self.model_calls)?;
        Ok(())
    }
}

/// Everything a run leaves behind.
pub struct RunOutcome {
    pub stats: ScoutStats,
    pub trust: TrustCache,
    pub keywords: KeywordSet,
    pub discovered_categories: BTreeSet<CategoryLabel>,
    pub log: RunLog,
}

pub struct Scout {
    source: Arc<dyn VideoSource>,
    completer: Arc<dyn TextCompleter>,
    sink: Arc<dyn RecordSink>,
    config: PipelineConfig,
}

impl Scout {
    pub fn new(
        source: Arc<dyn VideoSource>,
        completer: Arc<dyn TextCompleter>,
        sink: Arc<dyn RecordSink>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            completer,
            sink,
            config,
        }
    }

    /// Run until the quota is met or every query is exhausted.
    ///
    /// Only the dedup snapshot can fail the run; after that every failure
    /// abandons a single candidate or query.
    pub async fn run(&self, trust: TrustCache) -> Result<RunOutcome> {
        let existing = self
            .sink
            .existing_keys(self.config.existing_page_size)
            .await
            .context("Failed to load existing video ids from sink")?;

        let mut log = RunLog::new(Uuid::new_v4().to_string());
        log.log(EventKind::SnapshotLoaded {
            existing_ids: existing.len() as u32,
            trusted_channels: trust.len() as u32,
        });
        info!(
            run_id = log.run_id.as_str(),
            existing = existing.len(),
            trusted = trust.len(),
            quota = self.config.daily_quota,
            "Scout run starting"
        );

        let keywords = KeywordSet::new(&self.config.keyword_filter);
        let mut state = RunState::new(existing, trust, keywords);
        let model = MeteredCompleter::new(self.completer.as_ref());

        self.run_queries(&mut state, &model, &mut log).await;

        state.stats.model_calls = model.calls();
        state.stats.categories_discovered = state.discovered_categories.len() as u32;
        info!("{}", state.stats);

        Ok(RunOutcome {
            stats: state.stats,
            trust: state.trust,
            keywords: state.keywords,
            discovered_categories: state.discovered_categories,
            log,
        })
    }

    async fn run_queries(&self, state: &mut RunState, model: &MeteredCompleter<'_>, log: &mut RunLog) {
        let quota = self.config.daily_quota;

        'queries: for query in &self.config.search_queries {
            let mut page_token: Option<String> = None;

            for page_number in 1..=self.config.max_pages_per_query {
                if state.quota_met(quota) {
                    break 'queries;
                }

                let page = match self.source.search(query, page_token.as_deref()).await {
                    Ok(page) => page,
                    Err(e) => {
                        warn!(query = query.as_str(), error = %e, "Search failed, moving to next query");
                        state.stats.search_failures += 1;
                        log.log(EventKind::SearchFailed {
                            query: query.clone(),
                            error: format!("{e:#}"),
                        });
                        continue 'queries;
                    }
                };

                state.stats.pages_fetched += 1;
                info!(query = query.as_str(), page = page_number, results = page.items.len(), "Search page fetched");
                log.log(EventKind::SearchPage {
                    query: query.clone(),
                    page: page_number,
                    results: page.items.len() as u32,
                });

                let mut items = page.items;
                if self.config.shuffle_candidates {
                    items.shuffle(&mut rand::rng());
                }

                for item in &items {
                    if state.quota_met(quota) {
                        break 'queries;
                    }
                    let calls_before = model.calls();
                    self.handle(item, state, model, log).await;
                    if model.calls() > calls_before && !self.config.item_delay.is_zero() {
                        tokio::time::sleep(self.config.item_delay).await;
                    }
                }

                match page.next_page_token {
                    Some(token) => page_token = Some(token),
                    None => continue 'queries,
                }
            }
        }
    }

    /// Process one candidate and account for the outcome.
    async fn handle(
        &self,
        item: &CandidateItem,
        state: &mut RunState,
        model: &MeteredCompleter<'_>,
        log: &mut RunLog,
    ) {
        state.stats.candidates_seen += 1;

        match self.process(item, state, model, log).await {
            Ok(_) => {}
            Err(Skip::Rejected(rejection)) => {
                let stats = &mut state.stats;
                let detail = match &rejection {
                    Rejection::Duplicate => {
                        stats.duplicates_skipped += 1;
                        None
                    }
                    Rejection::KeywordMismatch => {
                        stats.keyword_rejected += 1;
                        None
                    }
                    Rejection::LowConfidence { score } => {
                        stats.low_confidence_rejected += 1;
                        Some(format!("{score:.2}"))
                    }
                    Rejection::CategoryOutsideVocabulary { label } => {
                        stats.category_rejected += 1;
                        Some(label.clone())
                    }
                    Rejection::NoIngredients => {
                        stats.missing_ingredients += 1;
                        None
                    }
                };
                debug!(video_id = item.id.as_str(), reason = rejection.reason(), ?detail, "Candidate rejected");
                log.log(EventKind::CandidateRejected {
                    video_id: item.id.clone(),
                    reason: rejection.reason().to_string(),
                    detail,
                });
            }
            Err(Skip::Failed(e)) => {
                if matches!(e, StageError::Write(_)) {
                    state.stats.write_failures += 1;
                } else {
                    state.stats.stage_failures += 1;
                }
                warn!(video_id = item.id.as_str(), stage = e.stage(), error = %e, "Candidate abandoned");
                log.log(EventKind::CandidateFailed {
                    video_id: item.id.clone(),
                    stage: e.stage().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// DEDUP → ASSEMBLE → TRANSLATE → TRUST_OR_CONFIDENCE → CLASSIFY → EXTRACT → WRITE.
    /// Returns the sink's record id.
    async fn process(
        &self,
        item: &CandidateItem,
        state: &mut RunState,
        model: &MeteredCompleter<'_>,
        log: &mut RunLog,
    ) -> Result<String, Skip> {
        dedup::check(&item.id, &state.existing_ids)?;

        let document = assemble::gather(self.source.as_ref(), item, self.config.comment_limit).await;
        debug!(
            video_id = item.id.as_str(),
            has_transcript = document.has_transcript,
            comments = document.comment_count,
            chars = document.text.chars().count(),
            "Document assembled"
        );
        let text = if self.config.translate {
            translate::to_korean(model, &document.text).await?
        } else {
            document.text.clone()
        };

        let trusted = self.trust_gate(item, state, log).await;
        if trusted {
            state.stats.trusted_bypasses += 1;
        } else {
            if !state.keywords.matches(&item.headline()) {
                return Err(Rejection::KeywordMismatch.into());
            }
            let score = relevance::score_confidence(model, &text).await?;
            if !relevance::meets_threshold(score, self.config.confidence_threshold) {
                return Err(Rejection::LowConfidence { score }.into());
            }
        }

        let classification = classify::classify(
            model,
            &item.title,
            &text,
            &self.config.category_vocabulary,
            &state.discovered_categories,
            self.config.category_mode,
        )
        .await?;
        if let Classification::Discovered(label) = &classification {
            if state.discovered_categories.insert(label.clone()) {
                info!(video_id = item.id.as_str(), category = %label, "New category discovered");
                log.log(EventKind::CategoryDiscovered {
                    video_id: item.id.clone(),
                    category: label.to_string(),
                });
            }
        }
        let category = classification.into_label();

        let record = self.extract(item, &document.text, &text, category, model).await?;

        let record_id = self
            .sink
            .upsert(&record)
            .await
            .map_err(StageError::Write)?;
        state.mark_written(&record.video_id);
        info!(
            video_id = record.video_id.as_str(),
            record_id = record_id.as_str(),
            category = %record.category,
            trusted,
            "Record written"
        );
        log.log(EventKind::RecordWritten {
            video_id: record.video_id.clone(),
            record_id: record_id.clone(),
            category: record.category.to_string(),
            trusted,
        });

        // Catch-all labels carry raw model text, not a dish name.
        if !record.category.is_catch_all() && state.keywords.add(record.category.secondary()) {
            state.stats.keywords_learned += 1;
            log.log(EventKind::KeywordLearned {
                keyword: record.category.secondary().to_string(),
            });
        }

        Ok(record_id)
    }

    async fn trust_gate(&self, item: &CandidateItem, state: &mut RunState, log: &mut RunLog) -> bool {
        if !self.config.trust_gate {
            return false;
        }
        let decision = trust::evaluate(
            self.source.as_ref(),
            &mut state.trust,
            &item.channel_id,
            &state.keywords,
            self.config.trust_policy(),
        )
        .await;
        if let TrustDecision::NewlyTrusted { matches } = decision {
            state.stats.channels_trusted += 1;
            log.log(EventKind::ChannelTrusted {
                channel_id: item.channel_id.clone(),
                matches,
            });
        }
        decision.is_trusted()
    }

    /// Build the record. Cook time and ingredient lines come from the source
    /// text; steps and hashtags from the normalized one.
    async fn extract(
        &self,
        item: &CandidateItem,
        original: &str,
        normalized: &str,
        category: CategoryLabel,
        model: &MeteredCompleter<'_>,
    ) -> Result<ExtractedRecord, Skip> {
        let mut lines = extract::ingredient_lines(original);
        if lines.is_empty() && normalized != original {
            lines = extract::ingredient_lines(normalized);
        }
        if lines.is_empty() && self.config.require_ingredients {
            return Err(Rejection::NoIngredients.into());
        }

        let cook_time = match extract::cook_time_minutes(original) {
            0 => extract::cook_time_minutes(normalized),
            minutes => minutes,
        };

        let mut details = extract::recipe_details(model, normalized).await;
        if self.config.translate_fields {
            lines = translate::lines_to_korean(model, lines).await;
            details = RecipeDetails {
                instructions: translate::lines_to_korean(model, details.instructions).await,
                hashtags: details.hashtags,
            };
        }

        let purchase_links = match &self.config.coupang_partner_id {
            Some(partner_id) => lines
                .iter()
                .filter_map(|line| extract::purchase_link(line, partner_id))
                .collect(),
            None => Vec::new(),
        };

        let views = match self.source.statistics(&item.id).await {
            Ok(stats) => stats.view_count,
            Err(e) => {
                debug!(video_id = item.id.as_str(), error = %e, "No statistics, recording 0 views");
                item.raw_stats
                    .get("view_count")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0)
            }
        };

        Ok(ExtractedRecord::builder()
            .video_id(item.id.as_str())
            .url(item.url())
            .title(item.title.as_str())
            .channel(item.channel.as_str())
            .category(category)
            .cook_time_minutes(cook_time)
            .ingredients(IngredientList::from_lines(lines))
            .instructions(details.render_instructions())
            .hashtags(details.render_hashtags())
            .views(views)
            .purchase_links(purchase_links)
            .build())
    }
}
