//! Language-model news summaries.
//!
//! Defines the `NewsSummarizer` trait: given an industry label, return a
//! short prose paragraph about today's news for it. The OpenAI adapter is
//! the only implementation shipped.

pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

/// Abstraction over a news search-and-summarize collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSummarizer: Send + Sync {
    /// A 2-3 sentence summary of today's news affecting `industry`.
    async fn summarize(&self, industry: &str) -> Result<String>;

    /// Model identifier string.
    fn model_name(&self) -> &str;
}

/// The question put to the summarizer for one industry.
pub fn industry_news_query(industry: &str) -> String {
    format!(
        "give me a short 2-3 sentence snippet of what happened in news today \
         for {industry} industry that affected the stock performance today?"
    )
}
