use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Literal placeholder stored when the ingredient extractor ran and found nothing.
pub const NO_INFORMATION: &str = "정보 없음";

/// Bucket for classifier output that carries no usable label at all.
pub const FALLBACK_CATEGORY: &str = "Other-misc";

/// Separator between the primary cuisine and the specific dish.
pub const CATEGORY_SEPARATOR: char = '-';

/// Primary cuisine vocabulary, English and Korean forms.
pub const PRIMARY_CATEGORIES: &[&str] = &[
    "Korean", "Chinese", "Western", "Japanese", "Dessert", "Other", "한식", "중식", "양식", "일식",
    "디저트", "기타",
];

/// Closed category list used when none is configured.
pub const DEFAULT_CATEGORY_VOCABULARY: &[&str] = &[
    "한식-찌개",
    "한식-볶음",
    "한식-전골",
    "양식-파스타",
    "양식-스테이크",
    "일식-초밥",
    "일식-라멘",
    "중식-탕수육",
    "중식-마라샹궈",
];

pub const DEFAULT_KEYWORDS: &[&str] = &["레시피", "요리", "만들기", "recipe", "cooking", "how to make"];

pub const DEFAULT_SEARCH_QUERIES: &[&str] = &["레시피", "요리", "recipe"];

// ---------------------------------------------------------------------------
// CandidateItem
// ---------------------------------------------------------------------------

/// A video fetched from the source, not yet accepted or rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel: String,
    pub channel_id: String,
    #[serde(default)]
    pub raw_stats: BTreeMap<String, String>,
}

impl CandidateItem {
    pub fn url(&self) -> String {
        format!("https://youtu.be/{}", self.id)
    }

    /// Title and description, the text every keyword heuristic runs over.
    pub fn headline(&self) -> String {
        format!("{}\n{}", self.title, self.description)
    }
}

// ---------------------------------------------------------------------------
// CategoryLabel
// ---------------------------------------------------------------------------

/// `"<primary>-<secondary>"`, e.g. `한식-볶음` or `Korean-kimchi stew`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryLabel(String);

impl CategoryLabel {
    /// Normalize raw classifier output, never failing.
    ///
    /// Quotes and trailing punctuation are stripped. Empty output becomes
    /// [`FALLBACK_CATEGORY`]; output without a separator becomes `Other-<raw>`.
    pub fn coerce(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_else(|| Self::other(raw))
    }

    /// File raw output under the `Other` primary, whatever its shape.
    pub fn other(raw: &str) -> Self {
        let cleaned = clean_label(raw);
        if cleaned.is_empty() {
            return CategoryLabel(FALLBACK_CATEGORY.to_string());
        }
        CategoryLabel(format!("Other{CATEGORY_SEPARATOR}{cleaned}"))
    }

    /// Accept only well-formed labels: non-empty primary and secondary halves.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = clean_label(raw);
        let (primary, secondary) = cleaned.split_once(CATEGORY_SEPARATOR)?;
        let (primary, secondary) = (primary.trim(), secondary.trim());
        if primary.is_empty() || secondary.is_empty() {
            return None;
        }
        Some(CategoryLabel(format!("{primary}{CATEGORY_SEPARATOR}{secondary}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn primary(&self) -> &str {
        self.0
            .split_once(CATEGORY_SEPARATOR)
            .map(|(p, _)| p)
            .unwrap_or(&self.0)
    }

    pub fn secondary(&self) -> &str {
        self.0
            .split_once(CATEGORY_SEPARATOR)
            .map(|(_, s)| s)
            .unwrap_or("")
    }

    pub fn has_known_primary(&self) -> bool {
        PRIMARY_CATEGORIES
            .iter()
            .any(|p| p.eq_ignore_ascii_case(self.primary()))
    }

    /// `Other-…` / `기타-…`: a bucket for output that named no real cuisine.
    pub fn is_catch_all(&self) -> bool {
        let primary = self.primary();
        primary.eq_ignore_ascii_case("Other") || primary == "기타"
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn clean_label(raw: &str) -> String {
    let first_line = raw.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    first_line
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '.' | '*' | '[' | ']'))
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Ingredients
// ---------------------------------------------------------------------------

/// Extractor output: matched lines, or an explicit "found nothing".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "lines", rename_all = "snake_case")]
pub enum IngredientList {
    Found(Vec<String>),
    NoInformation,
}

impl IngredientList {
    pub fn from_lines(lines: Vec<String>) -> Self {
        if lines.is_empty() {
            IngredientList::NoInformation
        } else {
            IngredientList::Found(lines)
        }
    }

    pub fn lines(&self) -> &[String] {
        match self {
            IngredientList::Found(lines) => lines,
            IngredientList::NoInformation => &[],
        }
    }

    /// Newline-joined lines, or the [`NO_INFORMATION`] sentinel.
    pub fn render(&self) -> String {
        match self {
            IngredientList::Found(lines) => lines.join("\n"),
            IngredientList::NoInformation => NO_INFORMATION.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// ExtractedRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLink {
    pub ingredient: String,
    pub url: String,
}

/// The row written to the sink for an accepted candidate. Written once,
/// keyed by `video_id`; re-runs skip existing ids rather than update them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct ExtractedRecord {
    #[builder(setter(into))]
    pub video_id: String,
    #[builder(setter(into))]
    pub url: String,
    #[builder(setter(into))]
    pub title: String,
    #[builder(setter(into))]
    pub channel: String,
    pub category: CategoryLabel,
    #[builder(default)]
    pub cook_time_minutes: u32,
    pub ingredients: IngredientList,
    #[builder(default, setter(into))]
    pub instructions: String,
    #[builder(default, setter(into))]
    pub hashtags: String,
    #[builder(default)]
    pub views: u64,
    #[builder(default)]
    pub purchase_links: Vec<PurchaseLink>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_keeps_well_formed_labels() {
        assert_eq!(CategoryLabel::coerce("한식-볶음").as_str(), "한식-볶음");
        assert_eq!(CategoryLabel::coerce(" \"Korean - kimchi stew\". ").as_str(), "Korean-kimchi stew");
    }

    #[test]
    fn coerce_wraps_labels_without_separator() {
        assert_eq!(CategoryLabel::coerce("김치찌개").as_str(), "Other-김치찌개");
    }

    #[test]
    fn coerce_empty_output_to_fallback() {
        assert_eq!(CategoryLabel::coerce("   ").as_str(), FALLBACK_CATEGORY);
        assert_eq!(CategoryLabel::coerce("\"\"").as_str(), FALLBACK_CATEGORY);
    }

    #[test]
    fn parse_rejects_half_labels() {
        assert!(CategoryLabel::parse("한식-").is_none());
        assert!(CategoryLabel::parse("-볶음").is_none());
        assert!(CategoryLabel::parse("볶음").is_none());
    }

    #[test]
    fn label_halves() {
        let label = CategoryLabel::coerce("Japanese-sushi");
        assert_eq!(label.primary(), "Japanese");
        assert_eq!(label.secondary(), "sushi");
        assert!(label.has_known_primary());
        assert!(!CategoryLabel::coerce("Fusion-taco").has_known_primary());
        assert!(!label.is_catch_all());
    }

    #[test]
    fn other_wraps_whole_output() {
        let label = CategoryLabel::other("This is a stir-fry");
        assert_eq!(label.as_str(), "Other-This is a stir-fry");
        assert!(label.is_catch_all());
        assert!(label.has_known_primary());
        assert_eq!(CategoryLabel::other("").as_str(), FALLBACK_CATEGORY);
        assert!(CategoryLabel::coerce("기타-간식").is_catch_all());
    }

    #[test]
    fn ingredient_sentinel_is_distinct_from_lines() {
        let none = IngredientList::from_lines(Vec::new());
        assert_eq!(none, IngredientList::NoInformation);
        assert_eq!(none.render(), NO_INFORMATION);
        assert!(none.lines().is_empty());

        let found = IngredientList::from_lines(vec!["300g 돼지고기".into(), "2개 양파".into()]);
        assert!(matches!(found, IngredientList::Found(_)));
        assert_eq!(found.render(), "300g 돼지고기\n2개 양파");
    }

    #[test]
    fn ingredient_list_serializes_tagged() {
        let json = serde_json::to_value(IngredientList::Found(vec!["2개 양파".into()])).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "found", "lines": ["2개 양파"]}));
        let json = serde_json::to_value(IngredientList::NoInformation).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "no_information"}));
        let label = serde_json::to_value(CategoryLabel::coerce("한식-볶음")).unwrap();
        assert_eq!(label, serde_json::json!("한식-볶음"));
    }

    #[test]
    fn candidate_url_and_headline() {
        let item = CandidateItem {
            id: "abc123".into(),
            title: "김치찌개".into(),
            description: "황금레시피".into(),
            channel: "백종원".into(),
            channel_id: "UC1".into(),
            raw_stats: BTreeMap::new(),
        };
        assert_eq!(item.url(), "https://youtu.be/abc123");
        assert_eq!(item.headline(), "김치찌개\n황금레시피");
    }

    #[test]
    fn record_builder_defaults() {
        let record = ExtractedRecord::builder()
            .video_id("abc123")
            .url("https://youtu.be/abc123")
            .title("김치찌개")
            .channel("백종원")
            .category(CategoryLabel::coerce("한식-찌개"))
            .ingredients(IngredientList::NoInformation)
            .build();
        assert_eq!(record.cook_time_minutes, 0);
        assert_eq!(record.views, 0);
        assert!(record.purchase_links.is_empty());
    }
}
