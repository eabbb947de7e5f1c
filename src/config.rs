//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section has defaults, so a partial file (or none at all) yields
//! the stock behaviour. Secrets (API keys) are referenced by env-var name
//! in the config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::engine::pacer::PacingConfig;
use crate::engine::selector::SelectOptions;
use crate::types::{ScreenerError, SelectionPolicy};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub universe: UniverseConfig,
    pub pacing: PacingSection,
    pub provider: ProviderConfig,
    pub selection: SelectionConfig,
    pub news: NewsConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UniverseConfig {
    pub url: String,
    pub fallback_path: String,
    /// Rewrite the fallback file after a successful live scrape.
    pub refresh_fallback: bool,
    pub max_symbols: Option<usize>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            url: "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies".into(),
            fallback_path: crate::storage::DEFAULT_UNIVERSE_FILE.into(),
            refresh_fallback: true,
            max_symbols: None,
        }
    }
}

/// Pacing values are in "time units" of `unit_ms` milliseconds.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PacingSection {
    pub unit_ms: u64,
    pub base_delay: f64,
    pub throttled_delay: f64,
    pub batch_every: usize,
    pub batch_pause: f64,
    pub rate_limit_markers: Vec<String>,
}

impl Default for PacingSection {
    fn default() -> Self {
        let defaults = PacingConfig::default();
        Self {
            unit_ms: defaults.unit.as_millis() as u64,
            base_delay: defaults.base_delay,
            throttled_delay: defaults.throttled_delay,
            batch_every: defaults.batch_every,
            batch_pause: defaults.batch_pause,
            rate_limit_markers: defaults.rate_limit_markers,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    pub timeout_secs: u64,
    pub history_months: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            history_months: 6,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    PerSector,
    Global,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SelectionConfig {
    pub mode: SelectionMode,
    /// `0` disables the per-sector cutoff.
    pub max_rank_per_sector: u32,
    pub global_top_n: usize,
    /// Empty means "every sector".
    pub sector_allowlist: Vec<String>,
    pub industry_denylist: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::PerSector,
            max_rank_per_sector: 25,
            global_top_n: 50,
            sector_allowlist: Vec::new(),
            industry_denylist: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NewsConfig {
    pub enabled: bool,
    pub model: String,
    pub api_key_env: String,
    pub max_tokens: u32,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "gpt-4o-mini".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            max_tokens: 256,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportConfig {
    /// Where to write the JSON report. Empty disables the file.
    pub json_path: String,
    /// Emit one log line per selected row.
    pub log_rows: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            json_path: "dipwatch_report.json".into(),
            log_rows: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `path` if it exists, otherwise use the defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ScreenerError> {
        if self.pacing.batch_every == 0 {
            return Err(ScreenerError::Config("pacing.batch_every must be > 0".into()));
        }
        let delays = [
            self.pacing.base_delay,
            self.pacing.throttled_delay,
            self.pacing.batch_pause,
        ];
        if delays.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(ScreenerError::Config(
                "pacing delays must be finite and non-negative".into(),
            ));
        }
        if self.selection.mode == SelectionMode::Global && self.selection.global_top_n == 0 {
            return Err(ScreenerError::Config("selection.global_top_n must be > 0".into()));
        }
        if self.provider.history_months == 0 {
            return Err(ScreenerError::Config("provider.history_months must be > 0".into()));
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    pub fn pacing_config(&self) -> PacingConfig {
        PacingConfig {
            unit: Duration::from_millis(self.pacing.unit_ms),
            base_delay: self.pacing.base_delay,
            throttled_delay: self.pacing.throttled_delay,
            batch_every: self.pacing.batch_every,
            batch_pause: self.pacing.batch_pause,
            rate_limit_markers: self.pacing.rate_limit_markers.clone(),
        }
    }

    pub fn select_options(&self) -> SelectOptions {
        let as_set = |items: &[String]| -> Option<BTreeSet<String>> {
            if items.is_empty() {
                None
            } else {
                Some(items.iter().cloned().collect())
            }
        };

        let policy = match self.selection.mode {
            SelectionMode::PerSector => SelectionPolicy::PerSectorRank {
                max_rank: Some(self.selection.max_rank_per_sector).filter(|&n| n > 0),
            },
            SelectionMode::Global => SelectionPolicy::GlobalTopN {
                n: self.selection.global_top_n,
            },
        };

        SelectOptions {
            sector_allowlist: as_set(&self.selection.sector_allowlist),
            industry_denylist: as_set(&self.selection.industry_denylist),
            policy,
        }
    }
}
