// crates/core/src/openai_client.rs

//! OpenAI-compatible client for the Chat Completions API.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::ai_client::{ChatRequest, ChatResponse, CompletionClient};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat Completions client.
///
/// Environment variables:
/// - OPENAI_API_KEY: your API key (required)
/// - OPENAI_BASE_URL: e.g. "https://api.openai.com/v1" (optional)
/// - CALENDAR_AGENT_DEBUG: dump request/response bodies to stderr (optional)
///
/// A single call is made per request. Callers decide what a failure means.
pub struct OpenAiClient {
    client: Client,
    url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Option<Duration>) -> Result<Self> {
        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            client,
            url,
            api_key: api_key.to_string(),
        })
    }

    pub fn from_env(timeout: Option<Duration>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        tracing::debug!(url = %base_url, "using chat completions endpoint");

        Self::new(&base_url, &api_key, timeout)
    }

    fn debug_enabled() -> bool {
        std::env::var("CALENDAR_AGENT_DEBUG").is_ok()
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, request: ChatRequest) -> Result<String> {
        if Self::debug_enabled() {
            eprintln!("[OpenAiClient] URL: {}", self.url);
            eprintln!("[OpenAiClient] Model: {}", request.model);
            if let Ok(json) = serde_json::to_string_pretty(&request) {
                eprintln!("[OpenAiClient] Request:\n{}", preview(&json, 2000));
            }
        }

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .context("failed to send chat completion request")?;

        let status = resp.status();
        let raw_text = resp.text().context("failed to read response body")?;

        if !status.is_success() {
            tracing::warn!(%status, "chat completion request rejected");
            anyhow::bail!(
                "chat completion request failed: HTTP {} - {}",
                status,
                preview(&raw_text, 500)
            );
        }

        if Self::debug_enabled() {
            eprintln!("[OpenAiClient] Response: {}", preview(&raw_text, 500));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&raw_text).context("failed to parse chat completion response")?;

        parsed
            .first_text()
            .context("chat completion response contained no message content")
    }
}

/// Cut a body down for display without splitting a UTF-8 character.
pub(crate) fn preview(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
