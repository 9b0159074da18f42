// src/services/llm.rs

//! OpenAI-compatible chat client for article reconstruction.
//!
//! When a page yields only a partial extraction, the model is asked to
//! rebuild the full readable text from that fragment. The endpoint is
//! configurable so proxies and compatible providers work unchanged.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Config;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

const SYSTEM_PROMPT: &str = "You are a news article reconstruction assistant. \
    Given a partial article extracted from a web page, produce the complete \
    readable article text in the original language. Output plain text \
    paragraphs separated by blank lines. No commentary, no markdown.";

/// Chat-completion client for the AI reconstruction tier.
pub struct LlmClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(config: &Config) -> Self {
        let ai = &config.tiers.ai;
        let api_key = if ai.api_key.trim().is_empty() {
            std::env::var("OPENAI_API_KEY").unwrap_or_default()
        } else {
            ai.api_key.clone()
        };
        let client = Client::builder()
            .user_agent(&config.global.user_agent)
            .timeout(Duration::from_secs(ai.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            endpoint: ai.endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: ai.model.clone(),
            max_tokens: ai.max_tokens,
        }
    }

    /// Rebuild the full article text from a partial extraction.
    pub async fn reconstruct_article(
        &self,
        url: &str,
        title: &str,
        partial_text: &str,
        language: &str,
    ) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user",
                    content: format!(
                        "URL: {url}\nTitle: {title}\nLanguage: {language}\n\n\
                         Partial article text:\n{partial_text}\n\n\
                         Reconstruct the full article text."
                    ),
                },
            ],
            temperature: 0.2,
            max_tokens: self.max_tokens,
        };

        let text = self.chat(&request).await?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(AppError::api("llm", "empty completion"));
        }
        Ok(text)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::api("llm", format!("{status}: {message}")));
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::api("llm", "no choices in response"))
    }
}
