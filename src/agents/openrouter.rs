// Chat-completions client for OpenRouter-compatible endpoints

use crate::error::{CrucibleError, CrucibleResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// One model behind a chat-completions endpoint
///
/// Holds its own credentials; nothing here reads the environment.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

impl OpenRouterClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one user prompt and return the reply content
    pub async fn chat(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
        timeout: Duration,
    ) -> CrucibleResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
            max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "http://localhost")
            .header("X-Title", "Crucible")
            .timeout(timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!("Model {}: status {}", self.model, status);
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CrucibleError::generation_error(format!(
                "model {} returned {}: {}",
                self.model, status, body
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                CrucibleError::generation_error(format!("model {} returned no choices", self.model))
            })
    }
}
