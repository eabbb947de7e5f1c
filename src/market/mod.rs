//! Market data providers.
//!
//! Defines the `MarketDataProvider` trait and the Yahoo Finance
//! implementation used by the binary.

pub mod yahoo;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::SymbolSnapshot;

/// Abstraction over a per-symbol market data source.
///
/// The fetcher only needs "given a symbol, return these fields, possibly
/// partially missing". Numeric gaps are `None` in the snapshot; an `Err`
/// means the symbol could not be fetched at all and will be skipped.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch price, fundamentals, cash line and trailing peak for one symbol.
    async fn snapshot(&self, symbol: &str) -> Result<SymbolSnapshot>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}
