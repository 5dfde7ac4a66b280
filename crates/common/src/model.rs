//! Thin client for the scoring model endpoint (Anthropic-style messages
//! API). The resolver owns prompt construction and response validation;
//! this module only moves text in and out.

use crate::config;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Transport-level failures, kept distinct from the resolver's validation
/// errors so "model is down" never reads as "model returned garbage".
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model endpoint unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),
    #[error("model API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("model returned no text content")]
    EmptyResponse,
    #[error("API key contains characters not valid in a header")]
    InvalidApiKey,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

pub struct ScoringModelClient {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
}

impl ScoringModelClient {
    pub fn new(api_key: &str, cfg: &config::Model) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            api_url: cfg.api_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
        }
    }

    fn headers(&self) -> Result<HeaderMap, ModelError> {
        let mut headers = HeaderMap::new();
        let mut key =
            HeaderValue::from_str(&self.api_key).map_err(|_| ModelError::InvalidApiKey)?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// One user-turn completion. Returns the first text block verbatim.
    pub async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        let url = format!("{}/messages", self.api_url);
        let request = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![WireMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(model = %self.model, "scoring model request");
        metrics::counter!("model_requests_total").increment(1);

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, body });
        }

        let parsed: ChatResponse = response.json().await?;
        extract_text(parsed)
    }
}

fn extract_text(response: ChatResponse) -> Result<String, ModelError> {
    response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .ok_or(ModelError::EmptyResponse)
}
