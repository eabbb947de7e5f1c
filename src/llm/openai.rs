//! OpenAI chat-completions news summarizer.
//!
//! Implements `NewsSummarizer` by sending the industry news query to the
//! Chat Completions API and returning the assistant's text verbatim.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::{industry_news_query, NewsSummarizer};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 256;

const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_secs(1);

const SYSTEM_PROMPT: &str = "You are a concise financial news assistant. \
Answer in 2-3 plain sentences about today's market-moving news.";

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChatMessage>,
}

/// Doubling delay before retry `attempt` (1-based).
fn backoff(attempt: u32) -> Duration {
    BASE_BACKOFF * 2u32.pow(attempt.saturating_sub(1))
}

fn extract_text(body: ChatResponse) -> Option<String> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .map(|m| m.content.trim().to_string())
        .filter(|text| !text.is_empty())
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OpenAiSummarizer {
    http: Client,
    api_key: SecretString,
    model: String,
    max_tokens: u32,
    total_calls: AtomicU64,
}

impl OpenAiSummarizer {
    pub fn new(api_key: String, model: Option<String>, max_tokens: Option<u32>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build OpenAI HTTP client")?;

        Ok(Self {
            http,
            api_key: SecretString::new(api_key),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            total_calls: AtomicU64::new(0),
        })
    }

    fn build_request(&self, industry: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: industry_news_query(industry),
                },
            ],
        }
    }

    /// One POST. `Ok(Err(reason))` means the failure is worth retrying.
    async fn post_once(&self, request: &ChatRequest) -> Result<Result<String, String>> {
        let response = match self
            .http
            .post(OPENAI_API_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Ok(Err(format!("request error: {e}"))),
        };

        let status = response.status();
        if status.is_success() {
            let body: ChatResponse = response
                .json()
                .await
                .context("Failed to decode chat completion")?;
            self.total_calls.fetch_add(1, Ordering::Relaxed);
            return extract_text(body)
                .map(Ok)
                .context("Chat completion carried no text");
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Ok(Err(format!("HTTP {status}: {body}")));
        }
        bail!("OpenAI rejected the request ({status}): {body}")
    }

    async fn call_api(&self, request: &ChatRequest) -> Result<String> {
        let mut reason = String::new();
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                tokio::time::sleep(backoff(attempt)).await;
            }
            match self.post_once(request).await? {
                Ok(text) => return Ok(text),
                Err(why) => {
                    warn!(attempt, reason = %why, "Summary request failed, will retry");
                    reason = why;
                }
            }
        }
        bail!("Summary request gave up after {} attempts: {reason}", MAX_RETRIES + 1)
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl NewsSummarizer for OpenAiSummarizer {
    async fn summarize(&self, industry: &str) -> Result<String> {
        debug!(industry, model = %self.model, "Requesting industry news summary");
        let request = self.build_request(industry);
        let text = self.call_api(&request).await?;
        debug!(industry, calls = self.total_calls(), "Summary received");
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
