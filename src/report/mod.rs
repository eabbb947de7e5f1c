//! Reporter boundary.
//!
//! The pipeline hands a finished `ScreenReport` to a `Reporter`; the
//! reporter owns presentation and transport. Two are provided: a
//! structured-log reporter and a JSON file writer.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::prelude::*;
use tracing::info;

use crate::storage;
use crate::types::{RankedQuote, ScreenReport};

/// Something that can deliver a finished screen.
#[async_trait]
pub trait Reporter: Send + Sync {
    async fn deliver(&self, report: &ScreenReport) -> Result<()>;

    fn name(&self) -> &str;
}

/// Rows grouped by sector, sectors in first-appearance order.
pub fn group_by_sector(rows: &[RankedQuote]) -> Vec<(&str, Vec<&RankedQuote>)> {
    let mut groups: Vec<(&str, Vec<&RankedQuote>)> = Vec::new();
    for row in rows {
        let sector = row.quote.sector.as_str();
        match groups.iter_mut().find(|(s, _)| *s == sector) {
            Some((_, members)) => members.push(row),
            None => groups.push((sector, vec![row])),
        }
    }
    groups
}

fn fmt_decimal(value: Option<Decimal>) -> String {
    value
        .map(|v| v.round_dp(2).to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

// ---------------------------------------------------------------------------
// Log reporter
// ---------------------------------------------------------------------------

/// Emits the screen as `tracing` events.
pub struct LogReporter {
    log_rows: bool,
}

impl LogReporter {
    pub fn new(log_rows: bool) -> Self {
        Self { log_rows }
    }
}

#[async_trait]
impl Reporter for LogReporter {
    async fn deliver(&self, report: &ScreenReport) -> Result<()> {
        info!(
            run_id = %report.run_id,
            universe = report.universe_size,
            fetched = report.quotes_fetched,
            skipped = report.skipped.len(),
            selected = report.rows.len(),
            "{}",
            report.subject()
        );

        if !self.log_rows {
            return Ok(());
        }

        for (sector, rows) in group_by_sector(&report.rows) {
            info!(sector, rows = rows.len(), "Sector");
            for row in rows {
                let q = &row.quote;
                info!(
                    rank = row.rank,
                    symbol = %q.symbol,
                    company = %q.company_name,
                    price = %fmt_decimal(q.price),
                    peak_6m = %fmt_decimal(q.peak_6m_price),
                    change = format!("{:.2}%", row.change_from_peak * 100.0),
                    market_cap = %fmt_decimal(q.market_cap),
                    eps = %fmt_decimal(q.eps),
                    pe = %fmt_decimal(q.pe_ratio),
                    cash = %fmt_decimal(q.cash_on_hand),
                    industry = %q.industry,
                    "Opportunity"
                );
            }
        }

        for (industry, summary) in &report.industry_summaries {
            info!(industry = %industry, "{summary}");
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

// ---------------------------------------------------------------------------
// JSON file reporter
// ---------------------------------------------------------------------------

/// Writes the screen as pretty JSON.
pub struct JsonFileReporter {
    path: String,
}

impl JsonFileReporter {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Reporter for JsonFileReporter {
    async fn deliver(&self, report: &ScreenReport) -> Result<()> {
        storage::save_report(report, &self.path)?;
        info!(path = %self.path, "Report written");
        Ok(())
    }

    fn name(&self) -> &str {
        "json"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
