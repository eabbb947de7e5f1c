//! DIPWATCH: S&P 500 drawdown-from-peak screener
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds the universe, market-data and news collaborators, runs one
//! screen and hands the result to the reporters.

use anyhow::Result;
use tracing::{error, info, warn};

use dipwatch::config;
use dipwatch::engine::fetcher::QuoteFetcher;
use dipwatch::engine::runner::run_screen;
use dipwatch::llm::openai::OpenAiSummarizer;
use dipwatch::llm::NewsSummarizer;
use dipwatch::market::yahoo::YahooClient;
use dipwatch::report::{JsonFileReporter, LogReporter, Reporter};
use dipwatch::universe::wikipedia::WikipediaSource;
use dipwatch::universe::{FileSource, UniverseLoader};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("DIPWATCH_CONFIG").unwrap_or_else(|_| CONFIG_PATH.to_string());
    let cfg = config::AppConfig::load_or_default(&config_path)?;

    init_logging();

    info!(
        config = %config_path,
        mode = ?cfg.selection.mode,
        news = cfg.news.enabled,
        "DIPWATCH starting up"
    );

    // -- Collaborators ---------------------------------------------------

    let universe = UniverseLoader::new(
        Box::new(WikipediaSource::new(cfg.universe.url.clone())?),
        FileSource::new(cfg.universe.fallback_path.clone()),
    )
    .with_refresh(cfg.universe.refresh_fallback)
    .with_max_symbols(cfg.universe.max_symbols);

    let provider = YahooClient::new(cfg.provider.timeout_secs, cfg.provider.history_months)?;
    let mut fetcher = QuoteFetcher::new(provider, cfg.pacing_config());

    let summarizer: Option<Box<dyn NewsSummarizer>> = if cfg.news.enabled {
        match config::AppConfig::resolve_env(&cfg.news.api_key_env) {
            Ok(key) => {
                info!(model = %cfg.news.model, "Industry news summaries enabled");
                Some(Box::new(OpenAiSummarizer::new(
                    key,
                    Some(cfg.news.model.clone()),
                    Some(cfg.news.max_tokens),
                )?))
            }
            Err(e) => {
                warn!(error = %e, "News enabled but no API key, skipping summaries");
                None
            }
        }
    } else {
        None
    };

    let mut reporters: Vec<Box<dyn Reporter>> = vec![Box::new(LogReporter::new(cfg.report.log_rows))];
    if !cfg.report.json_path.is_empty() {
        reporters.push(Box::new(JsonFileReporter::new(cfg.report.json_path.clone())));
    }

    // -- Run ---------------------------------------------------------------

    let report = run_screen(
        &universe,
        &mut fetcher,
        summarizer.as_deref(),
        &cfg.select_options(),
    )
    .await?;

    for reporter in &reporters {
        if let Err(e) = reporter.deliver(&report).await {
            error!(reporter = reporter.name(), error = %e, "Report delivery failed");
        }
    }

    info!(
        selected = report.rows.len(),
        skipped = report.skipped.len(),
        "DIPWATCH finished."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dipwatch=info"));

    let json_logging = std::env::var("DIPWATCH_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
