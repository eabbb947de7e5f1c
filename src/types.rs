//! Shared types for the DIPWATCH screener.
//!
//! These types form the data model used across all modules.
//! Numeric market fields are `Option<Decimal>`: a value the provider
//! could not supply is `None`, never a sentinel string.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Universe
// ---------------------------------------------------------------------------

/// One tracked company. Field names match the saved constituent list
/// (`{"Symbol": "AAPL", "Security": "Apple Inc."}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniverseEntry {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Security")]
    pub company_name: String,
}

impl UniverseEntry {
    pub fn new(symbol: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            company_name: company_name.into(),
        }
    }
}

impl fmt::Display for UniverseEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.company_name)
    }
}

// ---------------------------------------------------------------------------
// Provider snapshot
// ---------------------------------------------------------------------------

/// Everything a market data provider returns for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    /// Close of the most recent daily bar.
    pub price: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    /// Trailing twelve-month EPS.
    pub eps: Option<Decimal>,
    /// Trailing P/E.
    pub pe_ratio: Option<Decimal>,
    /// Most recent "cash and cash equivalents" balance-sheet line.
    pub cash_on_hand: Option<Decimal>,
    /// Maximum daily high over the trailing window.
    pub peak_6m_price: Option<Decimal>,
    pub sector: String,
    pub industry: String,
}

// ---------------------------------------------------------------------------
// Quote
// ---------------------------------------------------------------------------

/// Market data for one universe entry, created once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub company_name: String,
    pub price: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub eps: Option<Decimal>,
    pub pe_ratio: Option<Decimal>,
    pub cash_on_hand: Option<Decimal>,
    pub peak_6m_price: Option<Decimal>,
    pub sector: String,
    pub industry: String,
}

impl Quote {
    pub fn from_snapshot(entry: &UniverseEntry, snapshot: SymbolSnapshot) -> Self {
        Self {
            symbol: entry.symbol.clone(),
            company_name: entry.company_name.clone(),
            price: snapshot.price,
            market_cap: snapshot.market_cap,
            eps: snapshot.eps,
            pe_ratio: snapshot.pe_ratio,
            cash_on_hand: snapshot.cash_on_hand,
            peak_6m_price: snapshot.peak_6m_price,
            sector: snapshot.sector,
            industry: snapshot.industry,
        }
    }

    /// Helper to build a test quote with only the fields the ranking uses.
    #[cfg(test)]
    pub fn sample(symbol: &str, sector: &str, price: f64, peak: f64) -> Self {
        use rust_decimal::prelude::FromPrimitive;
        Quote {
            symbol: symbol.to_string(),
            company_name: format!("{symbol} Corp"),
            price: Decimal::from_f64(price),
            market_cap: None,
            eps: None,
            pe_ratio: None,
            cash_on_hand: None,
            peak_6m_price: Decimal::from_f64(peak),
            sector: sector.to_string(),
            industry: "Other".to_string(),
        }
    }
}

/// A quote with its drawdown metric and per-sector dense rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedQuote {
    #[serde(flatten)]
    pub quote: Quote,
    /// `(price - peak) / peak`; negative when below the 6-month high.
    pub change_from_peak: f64,
    /// 1-based dense rank within the sector, ascending by `change_from_peak`.
    pub rank: u32,
}

impl fmt::Display for RankedQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} [{} / {}] {:+.2}% from 6M peak",
            self.rank,
            self.quote.symbol,
            self.quote.sector,
            self.quote.industry,
            self.change_from_peak * 100.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Selection policy
// ---------------------------------------------------------------------------

/// How rows are chosen after ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Keep rows ranked `<= max_rank` within their sector (`None` = all).
    PerSectorRank { max_rank: Option<u32> },
    /// Ignore sectors: the `n` deepest drawdowns overall.
    GlobalTopN { n: usize },
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::PerSectorRank { max_rank: Some(25) }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPolicy::PerSectorRank { max_rank: Some(n) } => {
                write!(f, "Top {n} opportunities per sector")
            }
            SelectionPolicy::PerSectorRank { max_rank: None } => {
                write!(f, "All opportunities per sector")
            }
            SelectionPolicy::GlobalTopN { n } => write!(f, "Top {n} opportunities overall"),
        }
    }
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// A symbol dropped during the fetch phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
    /// Whether the error carried a rate-limit signature.
    pub throttled: bool,
}

/// Everything the reporter receives at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub policy: SelectionPolicy,
    pub universe_size: usize,
    pub quotes_fetched: usize,
    pub skipped: Vec<SkippedSymbol>,
    /// Selected rows, already in presentation order.
    pub rows: Vec<RankedQuote>,
    /// Industry -> short news summary. Empty when enrichment is off.
    #[serde(default)]
    pub industry_summaries: BTreeMap<String, String>,
}

impl ScreenReport {
    pub fn subject(&self) -> String {
        format!("S&P 500 Stock Data Report: {}", self.policy)
    }
}

impl fmt::Display for ScreenReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Run {} | universe: {} | fetched: {} | skipped: {} | selected: {} | {}",
            self.run_id,
            self.universe_size,
            self.quotes_fetched,
            self.skipped.len(),
            self.rows.len(),
            self.policy,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for DIPWATCH.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("Universe unavailable: live source failed ({live}); fallback failed ({fallback})")]
    UniverseUnavailable { live: String, fallback: String },

    #[error("Missing {field} for {symbol}")]
    MissingProfileField { symbol: String, field: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
