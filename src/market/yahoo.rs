//! Yahoo Finance market data provider.
//!
//! Per symbol this makes three calls:
//! - `/v8/finance/chart` with `range=1d` for the latest close,
//! - `/v8/finance/chart` with `range=<n>mo` for the trailing daily highs,
//! - `/v10/finance/quoteSummary` for profile, valuation and balance sheet.
//!
//! quoteSummary needs a session cookie plus a "crumb" token; both are
//! fetched lazily on first use and reused for the rest of the run.
//!
//! Auth: none beyond the cookie/crumb handshake. Rate limit: undocumented,
//! the endpoint answers 429 when hammered.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::prelude::*;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::MarketDataProvider;
use crate::types::{ScreenerError, SymbolSnapshot};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const CHART_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const SUMMARY_BASE_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const PROVIDER_NAME: &str = "yahoo";

const SUMMARY_MODULES: &str =
    "assetProfile,summaryDetail,defaultKeyStatistics,price,balanceSheetHistory";

/// Error text for HTTP 429. Carries the signature the pacer escalates on.
const RATE_LIMITED_MESSAGE: &str = "Too Many Requests. Rate limited. Try after a while.";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// ---------------------------------------------------------------------------
// API response types (Yahoo JSON → Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartData>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(default)]
    result: Option<Vec<SummaryResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryResult {
    asset_profile: Option<AssetProfile>,
    summary_detail: Option<SummaryDetail>,
    default_key_statistics: Option<KeyStatistics>,
    price: Option<PriceModule>,
    balance_sheet_history: Option<BalanceSheetHistory>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryDetail {
    market_cap: Option<RawValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KeyStatistics {
    trailing_eps: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PriceModule {
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BalanceSheetHistory {
    balance_sheet_statements: Vec<BalanceSheetStatement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BalanceSheetStatement {
    cash: Option<RawValue>,
}

/// Yahoo wraps numbers as `{"raw": 1.23, "fmt": "1.23"}`; empty objects
/// stand for "not reported".
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawValue {
    raw: Option<f64>,
}

impl RawValue {
    fn decimal(value: &Option<RawValue>) -> Option<Decimal> {
        value
            .as_ref()
            .and_then(|v| v.raw)
            .filter(|v| v.is_finite())
            .and_then(Decimal::from_f64)
    }
}

/// Profile and fundamentals extracted from quoteSummary.
#[derive(Debug, Clone, PartialEq)]
struct ProfileFields {
    market_cap: Option<Decimal>,
    eps: Option<Decimal>,
    pe_ratio: Option<Decimal>,
    cash_on_hand: Option<Decimal>,
    sector: String,
    industry: String,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn chart_quote(symbol: &str, resp: ChartResponse) -> Result<Option<ChartQuote>> {
    if let Some(err) = resp.chart.error {
        bail!(
            "{symbol}: chart error {}: {} (possibly delisted)",
            err.code,
            err.description
        );
    }

    let Some(data) = resp.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(None);
    };

    if data.timestamp.map_or(true, |ts| ts.is_empty()) {
        return Ok(None);
    }

    Ok(data.indicators.quote.into_iter().next())
}

/// Close of the most recent bar that has one.
fn parse_latest_close(symbol: &str, resp: ChartResponse) -> Result<Option<Decimal>> {
    let close = chart_quote(symbol, resp)?
        .and_then(|q| q.close.into_iter().rev().flatten().find(|v| v.is_finite()))
        .and_then(Decimal::from_f64);
    Ok(close)
}

/// Highest daily high across the window.
fn parse_peak_high(symbol: &str, resp: ChartResponse) -> Result<Option<Decimal>> {
    let peak = chart_quote(symbol, resp)?
        .and_then(|q| {
            q.high
                .into_iter()
                .flatten()
                .filter(|v| v.is_finite())
                .reduce(f64::max)
        })
        .and_then(Decimal::from_f64);
    Ok(peak)
}

fn parse_summary(symbol: &str, resp: SummaryResponse) -> Result<ProfileFields> {
    if let Some(err) = resp.quote_summary.error {
        bail!("{symbol}: quoteSummary error {}: {}", err.code, err.description);
    }

    let result = resp
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .unwrap_or_default();

    let profile = result.asset_profile.unwrap_or_default();
    let sector = profile
        .sector
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ScreenerError::MissingProfileField {
            symbol: symbol.to_string(),
            field: "sector",
        })?;
    let industry = profile
        .industry
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ScreenerError::MissingProfileField {
            symbol: symbol.to_string(),
            field: "industry",
        })?;

    let detail = result.summary_detail.unwrap_or_default();
    let market_cap = RawValue::decimal(&detail.market_cap).or_else(|| {
        result
            .price
            .as_ref()
            .and_then(|p| RawValue::decimal(&p.market_cap))
    });

    let eps = result
        .default_key_statistics
        .as_ref()
        .and_then(|k| RawValue::decimal(&k.trailing_eps));

    // Statements are newest first.
    let cash_on_hand = result
        .balance_sheet_history
        .as_ref()
        .and_then(|h| h.balance_sheet_statements.first())
        .and_then(|s| RawValue::decimal(&s.cash));

    Ok(ProfileFields {
        market_cap,
        eps,
        pe_ratio: RawValue::decimal(&detail.trailing_pe),
        cash_on_hand,
        sector,
        industry,
    })
}

/// Yahoo spells share classes with a dash (`BRK-B`), index lists use a dot.
pub fn to_yahoo_symbol(symbol: &str) -> String {
    symbol.trim().replace('.', "-")
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Yahoo Finance provider client.
pub struct YahooClient {
    http: Client,
    history_months: u32,
    crumb: Mutex<Option<String>>,
}

impl YahooClient {
    pub fn new(timeout_secs: u64, history_months: u32) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .context("Failed to build Yahoo HTTP client")?;

        Ok(Self {
            http,
            history_months,
            crumb: Mutex::new(None),
        })
    }

    /// GET a JSON document, mapping 429 to the rate-limit error text.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            bail!(RATE_LIMITED_MESSAGE);
        }
        if status == StatusCode::UNAUTHORIZED {
            // Crumb expired; next call re-handshakes.
            *self.crumb.lock().await = None;
        }
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            let body = resp.text().await.unwrap_or_default();
            bail!("Yahoo API error {status}: {}", body.chars().take(200).collect::<String>());
        }

        // 404 still carries a JSON body with an `error` object.
        resp.json::<T>()
            .await
            .with_context(|| format!("Failed to parse Yahoo response from {url}"))
    }

    async fn crumb(&self) -> Result<String> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        // Sets the session cookie; the response itself is usually a 404.
        let _ = self.http.get(COOKIE_URL).send().await;

        let resp = self
            .http
            .get(CRUMB_URL)
            .send()
            .await
            .context("Failed to request Yahoo crumb")?;
        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            bail!(RATE_LIMITED_MESSAGE);
        }
        let crumb = resp.text().await.context("Failed to read Yahoo crumb")?;
        if crumb.is_empty() || crumb.contains('<') {
            bail!("Yahoo returned an invalid crumb");
        }

        debug!("Obtained Yahoo crumb");
        *guard = Some(crumb.clone());
        Ok(crumb)
    }

    async fn fetch_chart(&self, symbol: &str, range: &str) -> Result<ChartResponse> {
        let url = format!(
            "{CHART_BASE_URL}/{}?range={range}&interval=1d",
            urlencoding::encode(symbol)
        );
        self.get_json(&url).await
    }

    async fn fetch_summary(&self, symbol: &str) -> Result<SummaryResponse> {
        let crumb = self.crumb().await?;
        let url = format!(
            "{SUMMARY_BASE_URL}/{}?modules={SUMMARY_MODULES}&crumb={}",
            urlencoding::encode(symbol),
            urlencoding::encode(&crumb)
        );
        self.get_json(&url).await
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn snapshot(&self, symbol: &str) -> Result<SymbolSnapshot> {
        let yahoo_symbol = to_yahoo_symbol(symbol);

        let summary = self.fetch_summary(&yahoo_symbol).await?;
        let profile = parse_summary(symbol, summary)?;

        let latest = self.fetch_chart(&yahoo_symbol, "1d").await?;
        let price = parse_latest_close(symbol, latest)?;
        if price.is_none() {
            warn!(symbol, "No daily bar available, price missing");
        }

        let range = format!("{}mo", self.history_months);
        let history = self.fetch_chart(&yahoo_symbol, &range).await?;
        let peak_6m_price = parse_peak_high(symbol, history)?;

        debug!(
            symbol,
            price = ?price,
            peak = ?peak_6m_price,
            sector = %profile.sector,
            "Snapshot fetched"
        );

        Ok(SymbolSnapshot {
            price,
            market_cap: profile.market_cap,
            eps: profile.eps,
            pe_ratio: profile.pe_ratio,
            cash_on_hand: profile.cash_on_hand,
            peak_6m_price,
            sector: profile.sector,
            industry: profile.industry,
        })
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
