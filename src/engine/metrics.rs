//! Drawdown metric and per-sector dense ranking.
//!
//! `change_from_peak = (price - peak) / peak`. Rank 1 within a sector is
//! the deepest drawdown; tied values share a rank and the next distinct
//! value takes rank + 1.

use rust_decimal::prelude::*;
use std::collections::HashMap;
use tracing::debug;

use crate::types::{Quote, RankedQuote};

/// Signed fractional change from the peak, or `None` when either input is
/// missing or the peak cannot anchor a ratio.
pub fn change_from_peak(quote: &Quote) -> Option<Decimal> {
    let price = quote.price?;
    let peak = quote.peak_6m_price?;
    if peak <= Decimal::ZERO {
        return None;
    }
    (price - peak).checked_div(peak)
}

/// Dense ranks (1-based) for `values`, ascending.
pub fn dense_rank<T: Ord>(values: &[T]) -> Vec<u32> {
    let mut distinct: Vec<&T> = values.iter().collect();
    distinct.sort();
    distinct.dedup();

    values
        .iter()
        .map(|v| distinct.binary_search(&v).unwrap_or_else(|idx| idx) as u32 + 1)
        .collect()
}

/// Drop incomplete quotes, compute drawdowns and rank within each sector.
/// Output keeps the input order of the surviving quotes.
pub fn compute_metrics(quotes: Vec<Quote>) -> Vec<RankedQuote> {
    let total = quotes.len();

    let measured: Vec<(Quote, Decimal)> = quotes
        .into_iter()
        .filter_map(|q| change_from_peak(&q).map(|change| (q, change)))
        .collect();

    if measured.len() < total {
        debug!(
            dropped = total - measured.len(),
            "Quotes without price or 6M peak dropped"
        );
    }

    // sector -> indices into `measured`
    let mut by_sector: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, (quote, _)) in measured.iter().enumerate() {
        by_sector.entry(quote.sector.as_str()).or_default().push(idx);
    }

    let mut ranks = vec![0u32; measured.len()];
    for indices in by_sector.values() {
        let changes: Vec<Decimal> = indices.iter().map(|&i| measured[i].1).collect();
        for (&i, rank) in indices.iter().zip(dense_rank(&changes)) {
            ranks[i] = rank;
        }
    }

    measured
        .into_iter()
        .zip(ranks)
        .map(|((quote, change), rank)| RankedQuote {
            quote,
            change_from_peak: change.to_f64().unwrap_or(f64::NAN),
            rank,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(ranked: &'a [RankedQuote], symbol: &str) -> &'a RankedQuote {
        ranked.iter().find(|r| r.quote.symbol == symbol).unwrap()
    }

    #[test]
    fn test_reference_scenario() {
        let quotes = vec![
            Quote::sample("AAA", "Tech", 90.0, 100.0),
            Quote::sample("BBB", "Tech", 50.0, 100.0),
            Quote::sample("CCC", "Health", 95.0, 100.0),
        ];

        let ranked = compute_metrics(quotes);
        assert_eq!(ranked.len(), 3);

        let changes: Vec<f64> = ranked.iter().map(|r| r.change_from_peak).collect();
        assert_eq!(changes, vec![-0.10, -0.50, -0.05]);

        assert_eq!(find(&ranked, "BBB").rank, 1);
        assert_eq!(find(&ranked, "AAA").rank, 2);
        assert_eq!(find(&ranked, "CCC").rank, 1);
    }

    #[test]
    fn test_ties_share_rank_and_ranks_stay_dense() {
        let quotes = vec![
            Quote::sample("A", "Energy", 80.0, 100.0),
            Quote::sample("B", "Energy", 80.0, 100.0),
            Quote::sample("C", "Energy", 90.0, 100.0),
            Quote::sample("D", "Energy", 40.0, 50.0),
        ];

        let ranked = compute_metrics(quotes);

        // A, B and D are all -20%.
        assert_eq!(find(&ranked, "A").rank, 1);
        assert_eq!(find(&ranked, "B").rank, 1);
        assert_eq!(find(&ranked, "D").rank, 1);
        assert_eq!(find(&ranked, "C").rank, 2);
    }

    #[test]
    fn test_missing_inputs_never_ranked() {
        let mut no_price = Quote::sample("NOP", "Tech", 10.0, 100.0);
        no_price.price = None;
        let mut no_peak = Quote::sample("NOK", "Tech", 10.0, 100.0);
        no_peak.peak_6m_price = None;
        let zero_peak = Quote::sample("ZER", "Tech", 10.0, 0.0);

        let ranked = compute_metrics(vec![
            no_price,
            no_peak,
            zero_peak,
            Quote::sample("OK", "Tech", 90.0, 100.0),
        ]);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].quote.symbol, "OK");
        assert_eq!(ranked[0].rank, 1);
    }

    #[test]
    fn test_lower_price_ranks_better_for_fixed_peak() {
        let prices = [99.0, 75.0, 50.0, 20.0, 5.0];
        let quotes = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Quote::sample(&format!("S{i}"), "Materials", p, 100.0))
            .collect();

        let ranked = compute_metrics(quotes);
        for pair in ranked.windows(2) {
            assert!(pair[1].change_from_peak < pair[0].change_from_peak);
            assert!(pair[1].rank < pair[0].rank);
        }
        assert_eq!(ranked.last().unwrap().rank, 1);
    }

    #[test]
    fn test_ranks_dense_per_sector() {
        let quotes = vec![
            Quote::sample("A1", "A", 10.0, 100.0),
            Quote::sample("A2", "A", 20.0, 100.0),
            Quote::sample("A3", "A", 20.0, 100.0),
            Quote::sample("A4", "A", 30.0, 100.0),
            Quote::sample("B1", "B", 99.0, 100.0),
            Quote::sample("B2", "B", 98.0, 100.0),
        ];

        let ranked = compute_metrics(quotes);

        for sector in ["A", "B"] {
            let mut ranks: Vec<u32> = ranked
                .iter()
                .filter(|r| r.quote.sector == sector)
                .map(|r| r.rank)
                .collect();
            ranks.sort();
            ranks.dedup();
            let expected: Vec<u32> = (1..=ranks.len() as u32).collect();
            assert_eq!(ranks, expected, "sector {sector} ranks not dense");
        }
    }

    #[test]
    fn test_price_above_peak_is_positive() {
        let q = Quote::sample("UP", "Tech", 110.0, 100.0);
        let change = change_from_peak(&q).unwrap();
        assert_eq!(change.to_f64().unwrap(), 0.1);
    }

    #[test]
    fn test_dense_rank_helper() {
        assert_eq!(dense_rank(&[3, 1, 3, 2]), vec![3, 1, 3, 2]);
        assert_eq!(dense_rank(&[5, 5, 5]), vec![1, 1, 1]);
        assert!(dense_rank::<i32>(&[]).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(compute_metrics(Vec::new()).is_empty());
    }
}
