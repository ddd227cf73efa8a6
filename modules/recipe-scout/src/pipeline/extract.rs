//! Structured fields: cook time and ingredient lines by pattern, instructions
//! and hashtags by one schema-constrained model call.

use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

use ai_client::StructuredOutput;
use recipe_common::PurchaseLink;

use crate::pipeline::prompt_excerpt;
use crate::traits::{CompletionRequest, TextCompleter};

const DETAILS_SYSTEM: &str = "You extract recipe details from cooking video text. Return the \
cooking steps in order as short imperative sentences, and up to eight hashtags describing \
the dish, without the leading '#'. Write both in Korean.";

const DETAILS_MAX_TOKENS: u32 = 1024;

const COUPANG_SEARCH_URL: &str = "https://www.coupang.com/np/search";

// ---------------------------------------------------------------------------
// Cook time
// ---------------------------------------------------------------------------

fn cook_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d+)\s*(?:분|(?i:minutes|minute|mins|min)(?:[^a-zA-Z]|$))").expect("valid regex")
    })
}

/// First integer directly followed by a minute token. 0 when there is none.
pub fn cook_time_minutes(text: &str) -> u32 {
    cook_time_re()
        .captures_iter(text)
        .find_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Ingredients
// ---------------------------------------------------------------------------

fn ingredient_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d+\s*(?:작은술|큰술|스푼|컵|개|(?i:tbsp|tsp|ml|oz|g)(?:[^a-zA-Z]|$))")
            .expect("valid regex")
    })
}

fn quantity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d+\s*(?:작은술|큰술|스푼|컵|개|(?i:tbsp|tsp|ml|oz|g)\b)?\s*").expect("valid regex")
    })
}

/// Lines that start with a quantity and a unit, in their original order.
pub fn ingredient_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| ingredient_re().is_match(line))
        .map(String::from)
        .collect()
}

/// The ingredient name with its leading quantity and unit stripped.
pub fn ingredient_name(line: &str) -> String {
    quantity_re().replace(line.trim(), "").trim().to_string()
}

/// `"1. first"`, `"2. second"`, ...
pub fn number_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {}", i + 1, line.trim()))
        .collect()
}

// ---------------------------------------------------------------------------
// Instructions and hashtags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize, JsonSchema)]
pub struct RecipeDetails {
    /// Cooking steps in order.
    pub instructions: Vec<String>,
    /// Hashtags without the leading '#'.
    pub hashtags: Vec<String>,
}

impl RecipeDetails {
    /// Numbered steps, one per line.
    pub fn render_instructions(&self) -> String {
        let steps: Vec<String> = self
            .instructions
            .iter()
            .map(|s| strip_step_number(s))
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        number_lines(&steps).join("\n")
    }

    /// Space-joined `#tag` tokens.
    pub fn render_hashtags(&self) -> String {
        let mut seen = Vec::new();
        for tag in &self.hashtags {
            let tag: String = tag
                .trim()
                .trim_start_matches('#')
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            if !tag.is_empty() && !seen.contains(&tag) {
                seen.push(tag);
            }
        }
        seen.iter().map(|t| format!("#{t}")).collect::<Vec<_>>().join(" ")
    }
}

fn strip_step_number(step: &str) -> &str {
    let trimmed = step.trim();
    let digits = trimmed.len() - trimmed.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        let rest = &trimmed[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim();
        }
    }
    trimmed
}

/// One model call for steps and hashtags. Any failure yields empty details.
pub async fn recipe_details(completer: &dyn TextCompleter, document: &str) -> RecipeDetails {
    let request = CompletionRequest::new(DETAILS_SYSTEM, prompt_excerpt(document), DETAILS_MAX_TOKENS)
        .with_schema(RecipeDetails::openai_schema());

    let raw = match completer.complete(request).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Recipe details call failed");
            return RecipeDetails::default();
        }
    };

    match serde_json::from_str(ai_client::strip_code_blocks(&raw)) {
        Ok(details) => details,
        Err(e) => {
            warn!(error = %e, "Recipe details unparsable");
            RecipeDetails::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Purchase links
// ---------------------------------------------------------------------------

/// Affiliate search link for one ingredient line.
pub fn purchase_link(line: &str, partner_id: &str) -> Option<PurchaseLink> {
    let ingredient = ingredient_name(line);
    if ingredient.is_empty() {
        return None;
    }
    let mut url = url::Url::parse(COUPANG_SEARCH_URL).ok()?;
    url.query_pairs_mut()
        .append_pair("q", &ingredient)
        .append_pair("channel", "affiliate")
        .append_pair("affid", partner_id);
    Some(PurchaseLink {
        ingredient,
        url: url.to_string(),
    })
}
