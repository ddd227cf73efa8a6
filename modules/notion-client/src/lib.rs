pub mod error;
pub mod types;

pub use error::{NotionError, Result};
pub use types::{Page, Properties, PropertyValue, QueryResponse, RichText};

use serde::{de::DeserializeOwned, Serialize};
use types::{CreatePageRequest, Parent, QueryRequest};

const BASE_URL: &str = "https://api.notion.com/v1";

const NOTION_VERSION: &str = "2022-06-28";

/// Notion caps `page_size` at 100.
const MAX_PAGE_SIZE: u32 = 100;

pub struct NotionClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl NotionClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotionError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }

    /// Query one page of a database.
    pub async fn query_database(
        &self,
        database_id: &str,
        page_size: u32,
        start_cursor: Option<String>,
    ) -> Result<QueryResponse> {
        let request = QueryRequest {
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            start_cursor,
        };
        let resp: QueryResponse = self
            .post(&format!("databases/{database_id}/query"), &request)
            .await?;
        tracing::debug!(
            database_id,
            results = resp.results.len(),
            has_more = resp.has_more,
            "Notion database queried"
        );
        Ok(resp)
    }

    /// Create a page (database row) under `database_id`.
    pub async fn create_page(&self, database_id: &str, properties: &Properties) -> Result<Page> {
        let request = CreatePageRequest {
            parent: Parent { database_id },
            properties,
        };
        let page: Page = self.post("pages", &request).await?;
        tracing::info!(page_id = %page.compact_id(), "Notion page created");
        Ok(page)
    }
}
