//! Sequential, paced quote fetcher.
//!
//! Walks the universe one symbol at a time. A failed symbol is logged
//! and skipped; if its error carries a rate-limit signature the pacer
//! slows down until the next success. There is no batch-level retry.

use tracing::{debug, info, warn};

use super::pacer::{Pacer, PacingConfig};
use crate::market::MarketDataProvider;
use crate::types::{Quote, SkippedSymbol, UniverseEntry};

/// Quotes that were fetched plus the symbols that were not.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub quotes: Vec<Quote>,
    pub skipped: Vec<SkippedSymbol>,
}

pub struct QuoteFetcher<P: MarketDataProvider> {
    provider: P,
    pacer: Pacer,
}

impl<P: MarketDataProvider> QuoteFetcher<P> {
    pub fn new(provider: P, pacing: PacingConfig) -> Self {
        Self {
            provider,
            pacer: Pacer::new(pacing),
        }
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// Fetch one quote per universe entry, skipping failures.
    pub async fn fetch(&mut self, universe: &[UniverseEntry]) -> FetchOutcome {
        info!(
            provider = self.provider.name(),
            symbols = universe.len(),
            "Fetching quotes"
        );

        let mut outcome = FetchOutcome::default();

        for entry in universe {
            self.pacer.wait().await;

            match self.provider.snapshot(&entry.symbol).await {
                Ok(snapshot) => {
                    outcome.quotes.push(Quote::from_snapshot(entry, snapshot));
                    self.pacer.record_success();
                    debug!(symbol = %entry.symbol, "Quote fetched");
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    let throttled = self.pacer.is_rate_limit_signal(&reason);
                    warn!(symbol = %entry.symbol, error = %reason, throttled, "Error fetching symbol");
                    if throttled {
                        self.pacer.record_throttled();
                    }
                    outcome.skipped.push(SkippedSymbol {
                        symbol: entry.symbol.clone(),
                        reason,
                        throttled,
                    });
                }
            }
        }

        info!(
            fetched = outcome.quotes.len(),
            skipped = outcome.skipped.len(),
            "Quote fetch complete"
        );

        outcome
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
