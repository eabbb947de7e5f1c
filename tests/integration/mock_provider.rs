//! In-memory collaborators for pipeline tests.
//!
//! `MockProvider` answers snapshots from a fixed table and records every
//! symbol it was asked for. `StaticSource`/`FailingSource` stand in for
//! the live universe scrape.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dipwatch::llm::NewsSummarizer;
use dipwatch::market::MarketDataProvider;
use dipwatch::types::{SymbolSnapshot, UniverseEntry};
use dipwatch::universe::UniverseSource;

/// What the mock returns for one symbol.
#[derive(Clone)]
pub enum Canned {
    Snapshot(SymbolSnapshot),
    Error(String),
}

/// Deterministic market-data provider.
#[derive(Default)]
pub struct MockProvider {
    table: HashMap<String, Canned>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete snapshot with the given drawdown inputs.
    pub fn with_quote(mut self, symbol: &str, sector: &str, industry: &str, price: i64, peak: i64) -> Self {
        let snapshot = SymbolSnapshot {
            price: Some(Decimal::from(price)),
            peak_6m_price: Some(Decimal::from(peak)),
            market_cap: Some(Decimal::from(price * 1_000_000)),
            eps: Some(Decimal::new(250, 2)),
            pe_ratio: None,
            cash_on_hand: None,
            sector: sector.to_string(),
            industry: industry.to_string(),
        };
        self.table.insert(symbol.to_string(), Canned::Snapshot(snapshot));
        self
    }

    /// Snapshot without a 6M peak.
    pub fn with_partial(mut self, symbol: &str, sector: &str, price: i64) -> Self {
        let snapshot = SymbolSnapshot {
            price: Some(Decimal::from(price)),
            sector: sector.to_string(),
            industry: "Other".to_string(),
            ..Default::default()
        };
        self.table.insert(symbol.to_string(), Canned::Snapshot(snapshot));
        self
    }

    pub fn with_error(mut self, symbol: &str, message: &str) -> Self {
        self.table.insert(symbol.to_string(), Canned::Error(message.to_string()));
        self
    }

    /// Shared handle on the call log.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn snapshot(&self, symbol: &str) -> Result<SymbolSnapshot> {
        self.calls.lock().unwrap().push(symbol.to_string());
        match self.table.get(symbol) {
            Some(Canned::Snapshot(s)) => Ok(s.clone()),
            Some(Canned::Error(msg)) => Err(anyhow!("{msg}")),
            None => Err(anyhow!("No data found, symbol may be delisted: {symbol}")),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Live universe source that always answers with the same list.
pub struct StaticSource(pub Vec<UniverseEntry>);

#[async_trait]
impl UniverseSource for StaticSource {
    async fn load(&self) -> Result<Vec<UniverseEntry>> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Live universe source that is always down.
pub struct FailingSource;

#[async_trait]
impl UniverseSource for FailingSource {
    async fn load(&self) -> Result<Vec<UniverseEntry>> {
        Err(anyhow!("HTTP 503 from constituents page"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Summarizer that echoes the industry and fails for one of them.
pub struct EchoSummarizer {
    pub fail_for: Option<String>,
}

#[async_trait]
impl NewsSummarizer for EchoSummarizer {
    async fn summarize(&self, industry: &str) -> Result<String> {
        if self.fail_for.as_deref() == Some(industry) {
            return Err(anyhow!("summary provider unavailable"));
        }
        Ok(format!("{industry}: quiet week."))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}
