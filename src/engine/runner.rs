//! One screening run: universe → fetch → metrics → select → enrich.

use anyhow::Result;
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use super::enricher::summarize_industries;
use super::fetcher::QuoteFetcher;
use super::metrics::compute_metrics;
use super::selector::{select, SelectOptions};
use crate::llm::NewsSummarizer;
use crate::market::MarketDataProvider;
use crate::types::ScreenReport;
use crate::universe::UniverseLoader;

/// Run the pipeline once and return the report for the reporter.
///
/// Only an unavailable universe is fatal before fetching; per-symbol
/// failures are recorded in `ScreenReport::skipped`.
pub async fn run_screen<P: MarketDataProvider>(
    universe: &UniverseLoader,
    fetcher: &mut QuoteFetcher<P>,
    summarizer: Option<&dyn NewsSummarizer>,
    options: &SelectOptions,
) -> Result<ScreenReport> {
    let run_id = Uuid::new_v4();
    info!(%run_id, policy = %options.policy, "Starting screen");

    // 1. Universe
    let entries = universe.get_universe().await?;
    let universe_size = entries.len();

    // 2. Quotes
    let fetched = fetcher.fetch(&entries).await;
    let quotes_fetched = fetched.quotes.len();

    // 3. Drawdown + per-sector rank
    let ranked = compute_metrics(fetched.quotes);
    info!(ranked = ranked.len(), "Metrics computed");

    // 4. Selection
    let rows = select(ranked, options);

    // 5. Optional news
    let industry_summaries = match summarizer {
        Some(s) if !rows.is_empty() => summarize_industries(s, &rows).await,
        _ => BTreeMap::new(),
    };

    let report = ScreenReport {
        run_id,
        generated_at: Utc::now(),
        policy: options.policy,
        universe_size,
        quotes_fetched,
        skipped: fetched.skipped,
        rows,
        industry_summaries,
    };

    info!("{report}");
    Ok(report)
}
