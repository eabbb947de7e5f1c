//! Universe acquisition.
//!
//! The tracked tickers come from a live source (the Wikipedia constituents
//! table) with a previously saved JSON list as fallback. The run aborts
//! only when both are unavailable.

pub mod wikipedia;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::storage;
use crate::types::{ScreenerError, UniverseEntry};

/// A place the (symbol, company name) list can be read from.
#[async_trait]
pub trait UniverseSource: Send + Sync {
    async fn load(&self) -> Result<Vec<UniverseEntry>>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// Saved constituent list on local disk.
pub struct FileSource {
    path: String,
}

impl FileSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl UniverseSource for FileSource {
    async fn load(&self) -> Result<Vec<UniverseEntry>> {
        storage::load_universe(&self.path)
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Live source with file fallback.
pub struct UniverseLoader {
    live: Box<dyn UniverseSource>,
    fallback: FileSource,
    refresh_fallback: bool,
    max_symbols: Option<usize>,
}

impl UniverseLoader {
    pub fn new(live: Box<dyn UniverseSource>, fallback: FileSource) -> Self {
        Self {
            live,
            fallback,
            refresh_fallback: false,
            max_symbols: None,
        }
    }

    /// Rewrite the fallback file whenever the live source succeeds.
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh_fallback = refresh;
        self
    }

    /// Keep only the first `max` entries.
    pub fn with_max_symbols(mut self, max: Option<usize>) -> Self {
        self.max_symbols = max;
        self
    }

    /// Obtain the universe for this run.
    pub async fn get_universe(&self) -> Result<Vec<UniverseEntry>, ScreenerError> {
        let mut entries = match self.live.load().await {
            Ok(entries) if !entries.is_empty() => {
                info!(source = self.live.name(), count = entries.len(), "Universe fetched");
                if self.refresh_fallback {
                    if let Err(e) = storage::save_universe(&entries, self.fallback.path()) {
                        warn!(error = %e, "Could not refresh fallback universe file");
                    }
                }
                entries
            }
            live_result => {
                let live_error = match live_result {
                    Err(e) => format!("{e:#}"),
                    Ok(_) => "empty universe".to_string(),
                };
                warn!(
                    source = self.live.name(),
                    error = %live_error,
                    path = self.fallback.path(),
                    "Live universe unavailable, using fallback file"
                );

                match self.fallback.load().await {
                    Ok(entries) if !entries.is_empty() => entries,
                    Ok(_) => {
                        return Err(ScreenerError::UniverseUnavailable {
                            live: live_error,
                            fallback: "empty universe".to_string(),
                        })
                    }
                    Err(e) => {
                        return Err(ScreenerError::UniverseUnavailable {
                            live: live_error,
                            fallback: format!("{e:#}"),
                        })
                    }
                }
            }
        };

        if let Some(max) = self.max_symbols {
            entries.truncate(max);
        }

        Ok(entries)
    }
}
