//! Anthropic Messages API drafter

use crate::config::DraftConfig;
use crate::draft::{DraftRequest, MessageDrafter};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Drafts squash messages with Claude via reqwest
pub struct AnthropicDrafter {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct MessagesPayload<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<UserMessage<'a>>,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicDrafter {
    /// Create a drafter using the API key named by the config
    pub fn from_config(config: &DraftConfig) -> Result<Self> {
        Self::new(config.api_key()?, config)
    }

    /// Create a drafter with an explicit API key
    pub fn new(api_key: String, config: &DraftConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Draft(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl MessageDrafter for AnthropicDrafter {
    async fn draft(&self, request: &DraftRequest) -> Result<String> {
        let prompt = request.prompt();
        debug!(model = %self.model, prompt_len = prompt.len(), "requesting drafted message");

        let payload = MessagesPayload {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![UserMessage {
                role: "user",
                content: &prompt,
            }],
        };

        let response = self
            .client
            .post(self.api_url("/v1/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Draft(format!(
                "API returned {status}: {}",
                api_error_message(&body)
            )));
        }

        let response: MessagesResponse = response.json().await?;

        if response.content.is_empty() {
            return Err(Error::Draft("empty response".to_string()));
        }

        response
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| Error::Draft("response contained no text content".to_string()))
    }
}

/// The `error.message` of an API error body, or the raw body
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}
