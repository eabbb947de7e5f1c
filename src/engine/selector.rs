//! Row selection after ranking.
//!
//! Allowlist on sector, denylist on industry, then one of two policies:
//! a per-sector rank cutoff, or a flat top-N across all sectors ordered
//! by drawdown. The two encode different screening heuristics and are
//! kept as separate modes.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

use crate::types::{RankedQuote, SelectionPolicy};

/// Selector configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOptions {
    /// Keep only these sectors. `None` keeps every sector.
    pub sector_allowlist: Option<BTreeSet<String>>,
    /// Drop these industries.
    pub industry_denylist: Option<BTreeSet<String>>,
    pub policy: SelectionPolicy,
}

fn passes_lists(row: &RankedQuote, opts: &SelectOptions) -> bool {
    if let Some(allow) = &opts.sector_allowlist {
        if !allow.contains(&row.quote.sector) {
            return false;
        }
    }
    if let Some(deny) = &opts.industry_denylist {
        if deny.contains(&row.quote.industry) {
            return false;
        }
    }
    true
}

fn by_drawdown(a: &RankedQuote, b: &RankedQuote) -> Ordering {
    a.change_from_peak
        .total_cmp(&b.change_from_peak)
        .then_with(|| a.quote.symbol.cmp(&b.quote.symbol))
}

fn by_sector_rank(a: &RankedQuote, b: &RankedQuote) -> Ordering {
    a.quote
        .sector
        .cmp(&b.quote.sector)
        .then(a.rank.cmp(&b.rank))
        .then_with(|| a.quote.symbol.cmp(&b.quote.symbol))
}

/// Apply the filters and selection policy; output is in presentation order.
pub fn select(ranked: Vec<RankedQuote>, opts: &SelectOptions) -> Vec<RankedQuote> {
    let total = ranked.len();
    let mut rows: Vec<RankedQuote> = ranked
        .into_iter()
        .filter(|row| passes_lists(row, opts))
        .collect();
    let after_lists = rows.len();

    match opts.policy {
        SelectionPolicy::PerSectorRank { max_rank } => {
            if let Some(max_rank) = max_rank {
                rows.retain(|row| row.rank <= max_rank);
            }
            rows.sort_by(by_sector_rank);
        }
        SelectionPolicy::GlobalTopN { n } => {
            rows.sort_by(by_drawdown);
            rows.truncate(n);
        }
    }

    debug!(
        total,
        after_lists,
        selected = rows.len(),
        policy = %opts.policy,
        "Rows selected"
    );

    rows
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
