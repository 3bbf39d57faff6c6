//! OpenAI-compatible completion backend
//!
//! Sends each prompt as a single user message to `{base_url}/chat/completions`
//! and returns the first choice's content. Works with any server that speaks
//! the chat completions wire format.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{LLMError, LLMProvider, Result};
use crate::config::LLMConfig;
use crate::secrets::SecretString;

pub struct OpenAIProvider {
    base_url: String,
    model: String,
    temperature: f64,
    api_key: SecretString,
    client: Client,
}

impl OpenAIProvider {
    /// Create a new provider from the backend configuration
    ///
    /// The request timeout from `config` is applied to every call.
    pub fn new(config: &LLMConfig, api_key: SecretString) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| LLMError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        tracing::debug!(
            "OpenAI request: model={}, prompt_chars={}",
            self.model,
            prompt.len()
        );

        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.unsecure()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        tracing::debug!(
            "OpenAI response {} received in {:.1}s",
            response.status(),
            start.elapsed().as_secs_f64()
        );

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::Backend { status, body });
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(format!("Failed to parse response: {}", e)))?;

        data.choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?
            .message
            .content
            .ok_or_else(|| LLMError::ParseError("Empty content".to_string()))
    }
}

/// Chat completions request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat completions response body (only the fields we read)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
