use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::RecipeScoutError;
use crate::types::{DEFAULT_CATEGORY_VOCABULARY, DEFAULT_KEYWORDS, DEFAULT_SEARCH_QUERIES};

/// Where accepted records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkKind {
    Notion { token: String, database_id: String },
    Supabase { url: String, key: String, table: String },
}

/// What the classifier does with a label outside the configured vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryMode {
    /// Reject the candidate.
    #[default]
    Closed,
    /// Coerce to a well-formed label and remember it as discovered.
    Dynamic,
}

impl FromStr for CategoryMode {
    type Err = RecipeScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "closed" => Ok(CategoryMode::Closed),
            "dynamic" => Ok(CategoryMode::Dynamic),
            other => Err(RecipeScoutError::Config(format!(
                "CATEGORY_MODE must be 'closed' or 'dynamic', got '{other}'"
            ))),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Collaborators
    pub youtube_api_key: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub sink: SinkKind,

    // Run shape
    pub daily_quota: u32,
    pub search_queries: Vec<String>,
    pub max_pages_per_query: u32,
    pub item_delay: Duration,
    pub existing_page_size: u32,

    // Filters
    pub keyword_filter: Vec<String>,
    pub category_vocabulary: Vec<String>,
    pub category_mode: CategoryMode,
    pub trust_threshold: u32,
    pub trust_sample_size: u32,
    pub confidence_threshold: f32,
    pub require_ingredients: bool,
    pub shuffle_candidates: bool,

    // Optional extras
    pub trust_cache_path: Option<PathBuf>,
    pub coupang_partner_id: Option<String>,
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, RecipeScoutError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RecipeScoutError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let sink = match vars.or("SINK", "notion").to_ascii_lowercase().as_str() {
            "notion" => SinkKind::Notion {
                token: vars.required("NOTION_TOKEN")?,
                database_id: vars.required("NOTION_DATABASE_ID")?,
            },
            "supabase" => SinkKind::Supabase {
                url: vars.required("SUPABASE_URL")?,
                key: vars.required("SUPABASE_KEY")?,
                table: vars.or("SUPABASE_TABLE", "recipes"),
            },
            other => {
                return Err(RecipeScoutError::Config(format!(
                    "SINK must be 'notion' or 'supabase', got '{other}'"
                )))
            }
        };

        let category_mode = match vars.get("CATEGORY_MODE") {
            Some(raw) => raw.parse()?,
            None => CategoryMode::default(),
        };

        Ok(Self {
            youtube_api_key: vars.required("YOUTUBE_API_KEY")?,
            openai_api_key: vars.required("OPENAI_API_KEY")?,
            openai_model: vars.or("OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: vars.get("OPENAI_BASE_URL"),
            sink,
            daily_quota: vars.parse("DAILY_QUOTA", 100)?,
            search_queries: vars.list("SEARCH_QUERIES", DEFAULT_SEARCH_QUERIES),
            max_pages_per_query: vars.parse("MAX_PAGES_PER_QUERY", 5)?,
            item_delay: Duration::from_millis(vars.parse("ITEM_DELAY_MS", 1000)?),
            existing_page_size: vars.parse("EXISTING_PAGE_SIZE", 100)?,
            keyword_filter: vars.list("KEYWORD_FILTER", DEFAULT_KEYWORDS),
            category_vocabulary: vars.list("CATEGORY_VOCABULARY", DEFAULT_CATEGORY_VOCABULARY),
            category_mode,
            trust_threshold: vars.parse("TRUST_THRESHOLD", 7)?,
            trust_sample_size: vars.parse("TRUST_SAMPLE_SIZE", 10)?,
            confidence_threshold: vars
                .parse::<f32>("CONFIDENCE_THRESHOLD", 0.7)?
                .clamp(0.0, 1.0),
            require_ingredients: vars.flag("REQUIRE_INGREDIENTS")?,
            shuffle_candidates: vars.flag("SHUFFLE_CANDIDATES")?,
            trust_cache_path: vars.get("TRUST_CACHE_PATH").map(PathBuf::from),
            coupang_partner_id: vars.get("COUPANG_PARTNER_ID"),
            data_dir: PathBuf::from(vars.or("DATA_DIR", "data")),
        })
    }

    /// Log the configuration with secrets masked.
    pub fn log_redacted(&self) {
        let sink = match &self.sink {
            SinkKind::Notion { database_id, .. } => format!("notion:{database_id}"),
            SinkKind::Supabase { url, table, .. } => format!("supabase:{url}/{table}"),
        };
        info!(
            youtube_api_key = redact(&self.youtube_api_key),
            openai_api_key = redact(&self.openai_api_key),
            openai_model = self.openai_model.as_str(),
            openai_base_url = ?self.openai_base_url,
            sink = sink.as_str(),
            daily_quota = self.daily_quota,
            queries = ?self.search_queries,
            keywords = self.keyword_filter.len(),
            categories = self.category_vocabulary.len(),
            category_mode = ?self.category_mode,
            trust_threshold = self.trust_threshold,
            trust_sample_size = self.trust_sample_size,
            confidence_threshold = self.confidence_threshold,
            require_ingredients = self.require_ingredients,
            trust_cache = ?self.trust_cache_path,
            affiliate_links = self.coupang_partner_id.is_some(),
            "Configuration loaded"
        );
    }
}

fn redact(secret: &str) -> String {
    match secret.char_indices().nth(4) {
        Some((idx, _)) => format!("{}…", &secret[..idx]),
        None => "****".to_string(),
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, RecipeScoutError> {
        self.get(key)
            .ok_or_else(|| RecipeScoutError::Config(format!("{key} environment variable is required")))
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> Result<T, RecipeScoutError> {
        match self.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|_| RecipeScoutError::Config(format!("{key} has an invalid value '{raw}'"))),
            None => Ok(default),
        }
    }

    fn flag(&self, key: &str) -> Result<bool, RecipeScoutError> {
        match self.get(key).map(|v| v.to_ascii_lowercase()) {
            None => Ok(false),
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes") => Ok(true),
            Some(v) if matches!(v.as_str(), "0" | "false" | "no") => Ok(false),
            Some(v) => Err(RecipeScoutError::Config(format!("{key} must be a boolean, got '{v}'"))),
        }
    }

    fn list(&self, key: &str, default: &[&str]) -> Vec<String> {
        match self.get(key) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => default.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, RecipeScoutError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    const BASE: &[(&str, &str)] = &[
        ("YOUTUBE_API_KEY", "yt-key"),
        ("OPENAI_API_KEY", "sk-test"),
        ("NOTION_TOKEN", "secret_abc"),
        ("NOTION_DATABASE_ID", "db123"),
    ];

    #[test]
    fn defaults_apply() {
        let config = load(BASE).unwrap();
        assert_eq!(config.daily_quota, 100);
        assert_eq!(config.trust_threshold, 7);
        assert_eq!(config.trust_sample_size, 10);
        assert_eq!(config.confidence_threshold, 0.7);
        assert_eq!(config.category_mode, CategoryMode::Closed);
        assert_eq!(config.item_delay, Duration::from_millis(1000));
        assert!(!config.require_ingredients);
        assert!(!config.shuffle_candidates);
        assert!(config.trust_cache_path.is_none());
        assert!(config.openai_base_url.is_none());
        assert_eq!(config.category_vocabulary.len(), DEFAULT_CATEGORY_VOCABULARY.len());
        assert_eq!(
            config.sink,
            SinkKind::Notion {
                token: "secret_abc".into(),
                database_id: "db123".into()
            }
        );
    }

    #[test]
    fn missing_required_key_names_the_variable() {
        let err = load(&BASE[1..]).unwrap_err();
        assert!(err.to_string().contains("YOUTUBE_API_KEY"));
    }

    #[test]
    fn supabase_sink_needs_its_own_keys() {
        let mut pairs = BASE.to_vec();
        pairs.push(("SINK", "supabase"));
        assert!(load(&pairs).is_err());

        pairs.push(("SUPABASE_URL", "https://x.supabase.co"));
        pairs.push(("SUPABASE_KEY", "service-key"));
        let config = load(&pairs).unwrap();
        assert_eq!(
            config.sink,
            SinkKind::Supabase {
                url: "https://x.supabase.co".into(),
                key: "service-key".into(),
                table: "recipes".into()
            }
        );
    }

    #[test]
    fn lists_split_on_commas() {
        let mut pairs = BASE.to_vec();
        pairs.push(("SEARCH_QUERIES", "김치찌개 레시피, 파스타 ,,"));
        pairs.push(("CATEGORY_MODE", "Dynamic"));
        let config = load(&pairs).unwrap();
        assert_eq!(config.search_queries, vec!["김치찌개 레시피", "파스타"]);
        assert_eq!(config.category_mode, CategoryMode::Dynamic);
    }

    #[test]
    fn openai_base_url_is_optional() {
        let mut pairs = BASE.to_vec();
        pairs.push(("OPENAI_BASE_URL", " http://localhost:8080/v1 "));
        let config = load(&pairs).unwrap();
        assert_eq!(config.openai_base_url.as_deref(), Some("http://localhost:8080/v1"));
    }

    #[test]
    fn confidence_threshold_is_clamped() {
        let mut pairs = BASE.to_vec();
        pairs.push(("CONFIDENCE_THRESHOLD", "1.5"));
        assert_eq!(load(&pairs).unwrap().confidence_threshold, 1.0);
    }

    #[test]
    fn invalid_numbers_are_errors() {
        let mut pairs = BASE.to_vec();
        pairs.push(("DAILY_QUOTA", "lots"));
        let err = load(&pairs).unwrap_err();
        assert!(err.to_string().contains("DAILY_QUOTA"));
    }

    #[test]
    fn redact_keeps_prefix_only() {
        assert_eq!(redact("sk-abcdef"), "sk-a…");
        assert_eq!(redact("abc"), "****");
    }
}
