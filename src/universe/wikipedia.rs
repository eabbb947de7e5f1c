//! Live S&P 500 constituent list scraped from Wikipedia.
//!
//! Page: `https://en.wikipedia.org/wiki/List_of_S%26P_500_companies`
//! The constituents table has `id="constituents"`; its first two columns
//! are the ticker symbol and the security name.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use super::UniverseSource;
use crate::types::UniverseEntry;

const SOURCE_NAME: &str = "wikipedia";

pub struct WikipediaSource {
    http: Client,
    url: String,
}

impl WikipediaSource {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .user_agent("DIPWATCH/0.1.0")
            .build()
            .context("Failed to build Wikipedia HTTP client")?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {css}: {e}"))
}

/// Extract (symbol, security) pairs from the constituents table.
pub fn parse_constituents(html: &str) -> Result<Vec<UniverseEntry>> {
    let document = Html::parse_document(html);
    let table_selector = selector("table#constituents")?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("td")?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| anyhow!("Constituents table not found"))?;

    let mut entries = Vec::new();
    for row in table.select(&row_selector) {
        let cells: Vec<_> = row.select(&cell_selector).collect();

        // Header row uses <th>, so it has no <td> cells.
        if cells.len() < 2 {
            continue;
        }

        let symbol = cells[0].text().collect::<String>().trim().to_string();
        let company_name = cells[1].text().collect::<String>().trim().to_string();

        if symbol.is_empty() || company_name.is_empty() {
            continue;
        }

        entries.push(UniverseEntry {
            symbol,
            company_name,
        });
    }

    if entries.is_empty() {
        bail!("Constituents table has no rows");
    }

    Ok(entries)
}

#[async_trait]
impl UniverseSource for WikipediaSource {
    async fn load(&self) -> Result<Vec<UniverseEntry>> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.url))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("Wikipedia returned {status}");
        }

        let html = resp.text().await.context("Failed to read Wikipedia page")?;
        let entries = parse_constituents(&html)?;
        debug!(count = entries.len(), "Parsed constituents table");
        Ok(entries)
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}
