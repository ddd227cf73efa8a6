use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Notion rejects text objects longer than this many characters.
pub const MAX_TEXT_CHARS: usize = 2000;

/// A database property value in the shape `pages.create` expects.
///
/// Externally tagged, so `Number(3.0)` serializes as `{"number": 3.0}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    Url(String),
    Number(f64),
    Select(SelectOption),
}

impl PropertyValue {
    pub fn title(content: &str) -> Self {
        PropertyValue::Title(RichText::chunked(content))
    }

    pub fn rich_text(content: &str) -> Self {
        PropertyValue::RichText(RichText::chunked(content))
    }

    pub fn url(url: impl Into<String>) -> Self {
        PropertyValue::Url(url.into())
    }

    pub fn number(n: impl Into<f64>) -> Self {
        PropertyValue::Number(n.into())
    }

    /// Select option names may not contain commas.
    pub fn select(name: &str) -> Self {
        PropertyValue::Select(SelectOption {
            name: name.replace(',', " ").trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RichText {
    pub text: TextContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    pub content: String,
}

impl RichText {
    /// Split `content` into text objects under the per-object length limit.
    pub fn chunked(content: &str) -> Vec<RichText> {
        if content.is_empty() {
            return Vec::new();
        }
        let chars: Vec<char> = content.chars().collect();
        chars
            .chunks(MAX_TEXT_CHARS)
            .map(|chunk| RichText {
                text: TextContent {
                    content: chunk.iter().collect(),
                },
            })
            .collect()
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

// --- Requests ---

#[derive(Debug, Clone, Serialize)]
pub(crate) struct QueryRequest {
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreatePageRequest<'a> {
    pub parent: Parent<'a>,
    pub properties: &'a Properties,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Parent<'a> {
    pub database_id: &'a str,
}

// --- Responses ---

#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl Page {
    /// Plain text of a title or rich-text property, if present and non-empty.
    pub fn plain_text(&self, property: &str) -> Option<String> {
        let prop = self.properties.get(property)?;
        let parts = prop
            .get("title")
            .or_else(|| prop.get("rich_text"))?
            .as_array()?;
        let text: String = parts
            .iter()
            .filter_map(|part| {
                part.get("plain_text")
                    .or_else(|| part.get("text").and_then(|t| t.get("content")))
                    .and_then(|v| v.as_str())
            })
            .collect();
        (!text.is_empty()).then_some(text)
    }

    /// Page id without dashes, as used in notion.so URLs.
    pub fn compact_id(&self) -> String {
        self.id.replace('-', "")
    }
}
