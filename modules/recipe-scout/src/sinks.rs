//! `RecordSink` implementations: Notion database, Supabase table, and a
//! dry-run sink that only logs.

use std::collections::HashSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use notion_client::{NotionClient, Properties, PropertyValue};
use recipe_common::{ExtractedRecord, PurchaseLink};
use supabase_client::SupabaseClient;

use crate::traits::RecordSink;

/// Title property holding the unique key in the Notion database.
pub const NOTION_KEY_PROPERTY: &str = "VideoID";

/// Key column of the Supabase table.
pub const SUPABASE_KEY_COLUMN: &str = "video_id";

// ---------------------------------------------------------------------------
// Notion
// ---------------------------------------------------------------------------

pub struct NotionSink {
    client: NotionClient,
    database_id: String,
}

impl NotionSink {
    pub fn new(client: NotionClient, database_id: impl Into<String>) -> Self {
        Self {
            client,
            database_id: database_id.into(),
        }
    }
}

/// Map a record onto the database's property schema.
pub fn notion_properties(record: &ExtractedRecord) -> Properties {
    let mut props = Properties::new();
    props.insert(NOTION_KEY_PROPERTY.into(), PropertyValue::title(&record.video_id));
    props.insert("URL".into(), PropertyValue::url(&record.url));
    props.insert("Title".into(), PropertyValue::rich_text(&record.title));
    props.insert("Channel".into(), PropertyValue::rich_text(&record.channel));
    props.insert("Category".into(), PropertyValue::select(record.category.as_str()));
    props.insert("CookTime".into(), PropertyValue::number(record.cook_time_minutes));
    props.insert(
        "Ingredients".into(),
        PropertyValue::rich_text(&record.ingredients.render()),
    );
    props.insert(
        "Instructions".into(),
        PropertyValue::rich_text(&record.instructions),
    );
    props.insert("Hashtags".into(), PropertyValue::rich_text(&record.hashtags));
    // Notion numbers are f64; view counts stay exact well past any real video.
    props.insert("Views".into(), PropertyValue::number(record.views as f64));
    if !record.purchase_links.is_empty() {
        props.insert(
            "PurchaseLinks".into(),
            PropertyValue::rich_text(&render_links(&record.purchase_links)),
        );
    }
    props
}

fn render_links(links: &[PurchaseLink]) -> String {
    links
        .iter()
        .map(|l| format!("{}: {}", l.ingredient, l.url))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl RecordSink for NotionSink {
    async fn existing_keys(&self, page_size: u32) -> Result<HashSet<String>> {
        let resp = self
            .client
            .query_database(&self.database_id, page_size, None)
            .await
            .context("Failed to query Notion database for existing video ids")?;
        Ok(resp
            .results
            .iter()
            .filter_map(|page| page.plain_text(NOTION_KEY_PROPERTY))
            .collect())
    }

    async fn upsert(&self, record: &ExtractedRecord) -> Result<String> {
        let page = self
            .client
            .create_page(&self.database_id, &notion_properties(record))
            .await?;
        Ok(page.compact_id())
    }
}

// ---------------------------------------------------------------------------
// Supabase
// ---------------------------------------------------------------------------

pub struct SupabaseSink {
    client: SupabaseClient,
    table: String,
}

impl SupabaseSink {
    pub fn new(client: SupabaseClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SupabaseRow<'a> {
    pub video_id: &'a str,
    pub url: &'a str,
    pub title: &'a str,
    pub channel: &'a str,
    pub category: &'a str,
    pub cook_time: u32,
    pub ingredients: Vec<String>,
    pub instructions: &'a str,
    pub hashtags: &'a str,
    pub views: u64,
    pub purchase_links: &'a [PurchaseLink],
}

impl<'a> From<&'a ExtractedRecord> for SupabaseRow<'a> {
    fn from(record: &'a ExtractedRecord) -> Self {
        // Sentinel stays a single element so the column still says "no information".
        let ingredients = match record.ingredients.lines() {
            [] => vec![record.ingredients.render()],
            lines => lines.to_vec(),
        };
        Self {
            video_id: &record.video_id,
            url: &record.url,
            title: &record.title,
            channel: &record.channel,
            category: record.category.as_str(),
            cook_time: record.cook_time_minutes,
            ingredients,
            instructions: &record.instructions,
            hashtags: &record.hashtags,
            views: record.views,
            purchase_links: &record.purchase_links,
        }
    }
}

#[async_trait]
impl RecordSink for SupabaseSink {
    async fn existing_keys(&self, page_size: u32) -> Result<HashSet<String>> {
        let ids = self
            .client
            .select_column(&self.table, SUPABASE_KEY_COLUMN, page_size)
            .await
            .context("Failed to select existing video ids from Supabase")?;
        Ok(ids.into_iter().collect())
    }

    async fn upsert(&self, record: &ExtractedRecord) -> Result<String> {
        let row = SupabaseRow::from(record);
        let stored: Vec<serde_json::Value> = self
            .client
            .upsert(&self.table, SUPABASE_KEY_COLUMN, std::slice::from_ref(&row))
            .await?;
        let id = stored
            .first()
            .and_then(|r| r.get("id"))
            .map(|id| match id {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| record.video_id.clone());
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

/// Logs records instead of writing them. Starts with no existing keys.
#[derive(Debug, Default)]
pub struct DryRunSink;

#[async_trait]
impl RecordSink for DryRunSink {
    async fn existing_keys(&self, _page_size: u32) -> Result<HashSet<String>> {
        Ok(HashSet::new())
    }

    async fn upsert(&self, record: &ExtractedRecord) -> Result<String> {
        info!(
            video_id = record.video_id.as_str(),
            title = record.title.as_str(),
            category = %record.category,
            cook_time = record.cook_time_minutes,
            ingredients = record.ingredients.lines().len(),
            views = record.views,
            "Dry run: record not written"
        );
        Ok(format!("dry-run-{}", record.video_id))
    }
}
