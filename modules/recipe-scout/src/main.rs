use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ai_client::OpenAi;
use notion_client::NotionClient;
use recipe_common::{CategoryMode, Config, SinkKind};
use recipe_scout::pipeline::trust::TrustCache;
use recipe_scout::sinks::{DryRunSink, NotionSink, SupabaseSink};
use recipe_scout::traits::RecordSink;
use recipe_scout::{PipelineConfig, Scout};
use supabase_client::SupabaseClient;
use youtube_client::YoutubeClient;

/// Collect cooking videos, extract recipes, and write them to the sink.
#[derive(Debug, Parser)]
#[command(name = "recipe-scout", version)]
struct Cli {
    /// Records to write this run (overrides DAILY_QUOTA).
    #[arg(long)]
    quota: Option<u32>,

    /// Search query; repeat for several (overrides SEARCH_QUERIES).
    #[arg(long = "query")]
    queries: Vec<String>,

    /// Log records instead of writing them.
    #[arg(long)]
    dry_run: bool,

    /// `closed` or `dynamic` (overrides CATEGORY_MODE).
    #[arg(long)]
    category_mode: Option<CategoryMode>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("recipe_scout=info".parse()?))
        .init();

    let cli = Cli::parse();
    info!("Recipe Scout starting...");

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(quota) = cli.quota {
        config.daily_quota = quota;
    }
    if !cli.queries.is_empty() {
        config.search_queries = cli.queries.clone();
    }
    if let Some(mode) = cli.category_mode {
        config.category_mode = mode;
    }
    config.log_redacted();

    let source = YoutubeClient::new(config.youtube_api_key.clone());
    let mut completer = OpenAi::new(config.openai_api_key.clone(), config.openai_model.clone());
    if let Some(url) = &config.openai_base_url {
        completer = completer.with_base_url(url.clone());
    }
    info!(model = completer.model(), "Language model ready");
    let sink: Arc<dyn RecordSink> = if cli.dry_run {
        info!("Dry run: records will be logged, not written");
        Arc::new(DryRunSink)
    } else {
        match &config.sink {
            SinkKind::Notion { token, database_id } => {
                Arc::new(NotionSink::new(NotionClient::new(token.clone()), database_id.clone()))
            }
            SinkKind::Supabase { url, key, table } => Arc::new(SupabaseSink::new(
                SupabaseClient::new(url.clone(), key.clone()),
                table.clone(),
            )),
        }
    };

    let trust = match &config.trust_cache_path {
        Some(path) => TrustCache::load(path),
        None => TrustCache::new(),
    };

    let scout = Scout::new(
        Arc::new(source),
        Arc::new(completer),
        sink,
        PipelineConfig::from(&config),
    );
    let outcome = scout.run(trust).await?;

    if let Some(path) = &config.trust_cache_path {
        if let Err(e) = outcome.trust.save(path) {
            warn!(error = %e, "Failed to save trust cache");
        }
    }
    if let Err(e) = outcome.log.save(&config.data_dir, &outcome.stats) {
        warn!(error = %e, "Failed to save run log");
    }
    if !outcome.discovered_categories.is_empty() {
        let labels: Vec<String> = outcome
            .discovered_categories
            .iter()
            .map(|l| l.to_string())
            .collect();
        info!(categories = ?labels, "Categories discovered this run");
    }

    info!(written = outcome.stats.records_written, "Recipe Scout finished");
    Ok(())
}
