mod client;
pub(crate) mod schema;
pub(crate) mod types;

pub use schema::StructuredOutput;

use client::OpenAiClient;

use crate::error::Result;
use crate::util::strip_code_blocks;

/// Token budget and sampling temperature for a single completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.0,
        }
    }
}

// =============================================================================
// OpenAi
// =============================================================================

#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    model: String,
    base_url: Option<String>,
    http: reqwest::Client,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> OpenAiClient {
        let client = OpenAiClient::new(&self.api_key, self.http.clone());
        match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        }
    }

    /// Chat completion with an optional system prompt.
    pub async fn chat(
        &self,
        system: Option<&str>,
        user: &str,
        options: ChatOptions,
    ) -> Result<String> {
        let mut request = types::ChatRequest::new(&self.model);
        if let Some(system) = system {
            request = request.message(types::WireMessage::system(system));
        }
        let request = request
            .message(types::WireMessage::user(user))
            .budget(options.max_tokens, options.temperature);

        self.client().chat(&request).await
    }

    /// Completion constrained to a raw JSON schema. Returns the JSON text.
    pub async fn structured_output(
        &self,
        system: &str,
        user: &str,
        options: ChatOptions,
        schema: serde_json::Value,
    ) -> Result<String> {
        let request = types::ChatRequest::new(&self.model)
            .message(types::WireMessage::system(system))
            .message(types::WireMessage::user(user))
            .budget(options.max_tokens, options.temperature)
            .response_format(types::ResponseFormat::json_schema(
                "structured_response",
                schema,
            ));

        let raw = self.client().chat(&request).await?;
        Ok(strip_code_blocks(&raw).to_string())
    }
}
