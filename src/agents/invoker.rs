//! Reasoning service invocation.
//!
//! The invoker is the pipeline's only network boundary: it sends one built
//! prompt to an Ollama-compatible completion endpoint configured for low
//! output variance and returns the raw response text. Content is never
//! interpreted here; that is the parser's job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Typed transport failures from the reasoning service.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("cannot connect to reasoning service at {0}")]
    Connect(String),
    #[error("reasoning service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// A client capable of completing one prompt into raw text.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, InvokeError>;
}

/// Configuration for the Ollama-backed client.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    pub temperature: f32,
    /// Cap on generated tokens, to bound response length.
    pub max_tokens: Option<usize>,
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            model: "llama3.2:latest".to_string(),
            temperature: 0.1,
            max_tokens: Some(4096),
            timeout_seconds: 300,
        }
    }
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<usize>,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Reasoning client backed by an Ollama-compatible HTTP endpoint.
pub struct OllamaClient {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, InvokeError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl ReasoningClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String, InvokeError> {
        let url = format!("{}/api/chat", self.config.url);

        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        debug!("Sending completion request ({} prompt bytes)", prompt.len());

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InvokeError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    InvokeError::Connect(self.config.url.clone())
                } else {
                    InvokeError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(InvokeError::Status { status, body });
        }

        let chat_response: OllamaChatResponse = response.json().await?;

        Ok(chat_response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OllamaConfig::default();
        assert_eq!(config.model, "llama3.2:latest");
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.max_tokens, Some(4096));
    }

    #[test]
    fn test_request_serialization_caps_output() {
        let request = OllamaChatRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "p".to_string(),
            }],
            stream: false,
            options: OllamaOptions {
                temperature: 0.1,
                num_predict: Some(2048),
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 2048);
        let temp = json["options"]["temperature"].as_f64().unwrap();
        assert!((temp - 0.1).abs() < 1e-6);
    }
}
