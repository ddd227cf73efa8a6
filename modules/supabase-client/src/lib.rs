pub mod error;

pub use error::{Result, SupabaseError};

use serde::{de::DeserializeOwned, Serialize};

/// Rows whose key already exists are left untouched; only new rows come back.
const INSERT_ONCE: &str = "resolution=ignore-duplicates,return=representation";

/// PostgREST client for a Supabase project.
pub struct SupabaseClient {
    client: reqwest::Client,
    project_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(project_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            project_url: project_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.project_url, table)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(resp.json().await?)
    }

    /// Read up to `limit` non-null values of a single text column.
    pub async fn select_column(&self, table: &str, column: &str, limit: u32) -> Result<Vec<String>> {
        let resp = self
            .request(reqwest::Method::GET, &self.table_url(table))
            .query(&[("select", column.to_string()), ("limit", limit.to_string())])
            .send()
            .await?;

        let rows: Vec<serde_json::Map<String, serde_json::Value>> = Self::parse(resp).await?;
        let values: Vec<String> = rows
            .into_iter()
            .filter_map(|mut row| match row.remove(column) {
                Some(serde_json::Value::String(s)) => Some(s),
                _ => None,
            })
            .collect();
        tracing::debug!(table, column, count = values.len(), "Supabase column selected");
        Ok(values)
    }

    /// Insert `rows`, skipping any whose `on_conflict` key is already stored.
    /// Returns the representation of each newly inserted row; a batch made
    /// only of existing keys is [`SupabaseError::EmptyUpsert`].
    pub async fn upsert<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        on_conflict: &str,
        rows: &[T],
    ) -> Result<Vec<R>> {
        let resp = self
            .request(reqwest::Method::POST, &self.table_url(table))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", INSERT_ONCE)
            .json(rows)
            .send()
            .await?;

        let stored: Vec<R> = Self::parse(resp).await?;
        if stored.is_empty() && !rows.is_empty() {
            return Err(SupabaseError::EmptyUpsert(table.to_string()));
        }
        Ok(stored)
    }
}
