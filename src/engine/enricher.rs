//! Per-industry news enrichment.
//!
//! Asks the summarizer once for each distinct industry among the selected
//! rows. A failed summary is logged and left out; it never fails the run.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use crate::llm::NewsSummarizer;
use crate::types::RankedQuote;

/// Distinct industries among `rows`, sorted.
pub fn distinct_industries(rows: &[RankedQuote]) -> BTreeSet<&str> {
    rows.iter()
        .map(|r| r.quote.industry.as_str())
        .filter(|industry| !industry.is_empty())
        .collect()
}

/// Industry -> summary for every industry the summarizer answered.
pub async fn summarize_industries(
    summarizer: &dyn NewsSummarizer,
    rows: &[RankedQuote],
) -> BTreeMap<String, String> {
    let industries = distinct_industries(rows);
    info!(
        industries = industries.len(),
        model = summarizer.model_name(),
        "Summarizing industry news"
    );

    let mut summaries = BTreeMap::new();
    for industry in industries {
        match summarizer.summarize(industry).await {
            Ok(text) => {
                summaries.insert(industry.to_string(), text);
            }
            Err(e) => {
                warn!(industry, error = %e, "News summary failed, omitting");
            }
        }
    }

    summaries
}
