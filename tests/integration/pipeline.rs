//! End-to-end screen runs against in-memory collaborators.

use uuid::Uuid;

use dipwatch::engine::fetcher::QuoteFetcher;
use dipwatch::engine::pacer::PacingConfig;
use dipwatch::engine::runner::run_screen;
use dipwatch::engine::selector::SelectOptions;
use dipwatch::report::{JsonFileReporter, Reporter};
use dipwatch::storage;
use dipwatch::types::{ScreenerError, SelectionPolicy, UniverseEntry};
use dipwatch::universe::{FileSource, UniverseLoader};

use crate::mock_provider::{EchoSummarizer, FailingSource, MockProvider, StaticSource};

fn temp_path(tag: &str) -> String {
    let mut p = std::env::temp_dir();
    p.push(format!("dipwatch_it_{tag}_{}.json", Uuid::new_v4()));
    p.to_string_lossy().to_string()
}

fn universe() -> Vec<UniverseEntry> {
    [
        ("XOM", "Exxon Mobil"),
        ("CVX", "Chevron Corporation"),
        ("AAPL", "Apple Inc."),
        ("MSFT", "Microsoft"),
        ("NVDA", "Nvidia"),
        ("HALF", "Half Data Corp."),
        ("THR", "Throttled Inc."),
        ("GONE", "Delisted Co."),
    ]
    .iter()
    .map(|(s, n)| UniverseEntry::new(*s, *n))
    .collect()
}

/// Energy: XOM -30%, CVX -1%. Technology: MSFT -20%, AAPL -10%, NVDA -5%.
fn provider() -> MockProvider {
    MockProvider::new()
        .with_quote("XOM", "Energy", "Oil & Gas Integrated", 70, 100)
        .with_quote("CVX", "Energy", "Oil & Gas Integrated", 99, 100)
        .with_quote("AAPL", "Technology", "Consumer Electronics", 90, 100)
        .with_quote("MSFT", "Technology", "Software", 80, 100)
        .with_quote("NVDA", "Technology", "Semiconductors", 95, 100)
        .with_partial("HALF", "Technology", 42)
        .with_error("THR", "Too Many Requests. Rate limited. Try after a while.")
}

/// Loader whose live source is down, reading from a freshly written file.
fn fallback_loader(path: &str) -> UniverseLoader {
    storage::save_universe(&universe(), path).unwrap();
    UniverseLoader::new(Box::new(FailingSource), FileSource::new(path))
}

fn symbols(report: &dipwatch::types::ScreenReport) -> Vec<&str> {
    report.rows.iter().map(|r| r.quote.symbol.as_str()).collect()
}

#[tokio::test]
async fn test_per_sector_screen_from_fallback_universe() {
    let path = temp_path("universe");
    let loader = fallback_loader(&path);
    let mut fetcher = QuoteFetcher::new(provider(), PacingConfig::instant());

    let options = SelectOptions {
        policy: SelectionPolicy::PerSectorRank { max_rank: Some(2) },
        ..Default::default()
    };

    let report = run_screen(&loader, &mut fetcher, None, &options).await.unwrap();

    assert_eq!(report.universe_size, 8);
    assert_eq!(report.quotes_fetched, 6);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(symbols(&report), vec!["XOM", "CVX", "MSFT", "AAPL"]);

    let ranks: Vec<u32> = report.rows.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 1, 2]);
    assert!((report.rows[0].change_from_peak + 0.30).abs() < 1e-12);
    assert!(report.industry_summaries.is_empty());
    assert_eq!(report.subject(), "S&P 500 Stock Data Report: Top 2 opportunities per sector");

    storage::delete_file(&path).unwrap();
}

#[tokio::test]
async fn test_throttle_is_recorded_and_pacing_stays_escalated() {
    let path = temp_path("universe");
    let loader = fallback_loader(&path);
    let mut fetcher = QuoteFetcher::new(provider(), PacingConfig::instant());

    let report = run_screen(&loader, &mut fetcher, None, &SelectOptions::default())
        .await
        .unwrap();

    let throttled = report.skipped.iter().find(|s| s.symbol == "THR").unwrap();
    assert!(throttled.throttled);
    let gone = report.skipped.iter().find(|s| s.symbol == "GONE").unwrap();
    assert!(!gone.throttled);

    // A plain error after the throttle does not count as recovery.
    assert_eq!(fetcher.pacer().requests(), 8);
    assert!(fetcher.pacer().is_throttled());
    assert_eq!(fetcher.pacer().current_delay(), 10.0);

    storage::delete_file(&path).unwrap();
}

#[tokio::test]
async fn test_global_top_n_screen() {
    let path = temp_path("universe");
    let loader = fallback_loader(&path);
    let mut fetcher = QuoteFetcher::new(provider(), PacingConfig::instant());

    let options = SelectOptions {
        policy: SelectionPolicy::GlobalTopN { n: 3 },
        ..Default::default()
    };

    let report = run_screen(&loader, &mut fetcher, None, &options).await.unwrap();

    assert_eq!(symbols(&report), vec!["XOM", "MSFT", "AAPL"]);
    assert_eq!(report.subject(), "S&P 500 Stock Data Report: Top 3 opportunities overall");

    storage::delete_file(&path).unwrap();
}

#[tokio::test]
async fn test_allowlist_and_denylist_apply_before_cutoff() {
    let path = temp_path("universe");
    let loader = fallback_loader(&path);
    let mut fetcher = QuoteFetcher::new(provider(), PacingConfig::instant());

    let options = SelectOptions {
        sector_allowlist: Some(["Technology".to_string()].into_iter().collect()),
        industry_denylist: Some(["Software".to_string()].into_iter().collect()),
        policy: SelectionPolicy::PerSectorRank { max_rank: Some(2) },
    };

    let report = run_screen(&loader, &mut fetcher, None, &options).await.unwrap();

    // MSFT held rank 1; AAPL keeps its rank 2 rather than being promoted.
    assert_eq!(symbols(&report), vec!["AAPL"]);
    assert_eq!(report.rows[0].rank, 2);

    storage::delete_file(&path).unwrap();
}

#[tokio::test]
async fn test_live_universe_refreshes_fallback_and_caps_symbols() {
    let path = temp_path("refresh");
    let loader = UniverseLoader::new(Box::new(StaticSource(universe())), FileSource::new(&path))
        .with_refresh(true)
        .with_max_symbols(Some(3));

    let provider = provider();
    let calls = provider.calls();
    let mut fetcher = QuoteFetcher::new(provider, PacingConfig::instant());

    let report = run_screen(&loader, &mut fetcher, None, &SelectOptions::default())
        .await
        .unwrap();

    assert_eq!(report.universe_size, 3);
    assert_eq!(*calls.lock().unwrap(), vec!["XOM", "CVX", "AAPL"]);

    let saved = storage::load_universe(&path).unwrap();
    assert_eq!(saved.len(), 8);
    assert_eq!(saved[0].symbol, "XOM");

    storage::delete_file(&path).unwrap();
}

#[tokio::test]
async fn test_no_universe_aborts_before_fetching() {
    let path = temp_path("missing");
    let loader = UniverseLoader::new(Box::new(FailingSource), FileSource::new(&path));

    let provider = provider();
    let calls = provider.calls();
    let mut fetcher = QuoteFetcher::new(provider, PacingConfig::instant());

    let err = run_screen(&loader, &mut fetcher, None, &SelectOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ScreenerError>(),
        Some(ScreenerError::UniverseUnavailable { .. })
    ));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_industry_summaries_skip_failures() {
    let path = temp_path("universe");
    let loader = fallback_loader(&path);
    let mut fetcher = QuoteFetcher::new(provider(), PacingConfig::instant());
    let summarizer = EchoSummarizer {
        fail_for: Some("Software".to_string()),
    };

    let options = SelectOptions {
        policy: SelectionPolicy::PerSectorRank { max_rank: Some(2) },
        ..Default::default()
    };

    let report = run_screen(&loader, &mut fetcher, Some(&summarizer), &options)
        .await
        .unwrap();

    let industries: Vec<&str> = report.industry_summaries.keys().map(|k| k.as_str()).collect();
    assert_eq!(industries, vec!["Consumer Electronics", "Oil & Gas Integrated"]);
    assert_eq!(
        report.industry_summaries["Consumer Electronics"],
        "Consumer Electronics: quiet week."
    );

    storage::delete_file(&path).unwrap();
}

#[tokio::test]
async fn test_report_survives_json_round_trip_on_disk() {
    let universe_path = temp_path("universe");
    let report_path = temp_path("report");
    let loader = fallback_loader(&universe_path);
    let mut fetcher = QuoteFetcher::new(provider(), PacingConfig::instant());

    let report = run_screen(&loader, &mut fetcher, None, &SelectOptions::default())
        .await
        .unwrap();
    JsonFileReporter::new(&report_path).deliver(&report).await.unwrap();

    let loaded = storage::load_report(&report_path).unwrap().unwrap();
    assert_eq!(loaded.run_id, report.run_id);
    assert_eq!(loaded.policy, report.policy);
    assert_eq!(loaded.skipped, report.skipped);
    assert_eq!(loaded.rows.len(), report.rows.len());

    storage::delete_file(&universe_path).unwrap();
    storage::delete_file(&report_path).unwrap();
}
