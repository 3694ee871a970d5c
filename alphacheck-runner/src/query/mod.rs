//! Read-side views over the fill-rate engine.
//!
//! Four granularities, each narrowing the cell set through a [`CellFilter`]
//! before any cell is built:
//!
//! | View               | Filter            |
//! |--------------------|-------------------|
//! | [`Overview`]       | none              |
//! | [`TimeSlice`]      | time              |
//! | [`TickerTimeline`] | ticker            |
//! | [`CellBreakdown`]  | time and ticker   |
//!
//! Maintain and unexpected-trade cells never enter means or medians but are
//! always counted. Every view carries a [`Finding`]: WARN when it holds
//! unexpected trades or fill-rate anomalies, PASS otherwise.
//!
//! [`CellFilter`]: alphacheck_core::CellFilter

pub mod breakdown;
pub mod overview;
pub mod stats;
pub mod time_slice;
pub mod timeline;

pub use breakdown::{CellBreakdown, MarketContext};
pub use overview::{Overview, TickerRank};
pub use stats::{CellCounts, TickerStats};
pub use time_slice::TimeSlice;
pub use timeline::{TickerTimeline, TimelinePoint};

use alphacheck_core::domain::Finding;
use alphacheck_core::{Anomaly, Cell, FillOutcome};

use crate::rules::{capped, qty};

fn flag(cell: &Cell) -> Option<&'static str> {
    match (cell.outcome, cell.anomaly) {
        (FillOutcome::UnexpectedTrade, _) => Some("UNEXPECTED_TRADE"),
        (_, Some(Anomaly::OverExecution)) => Some("OVER_EXECUTION"),
        (_, Some(Anomaly::WrongDirection)) => Some("WRONG_DIRECTION"),
        _ => None,
    }
}

/// PASS, or WARN listing every flagged cell with its raw numbers.
pub fn view_finding(view: &str, cells: &[Cell]) -> Finding {
    let lines: Vec<String> = cells
        .iter()
        .filter_map(|cell| {
            flag(cell).map(|tag| {
                let rate = cell
                    .fill_rate
                    .map_or_else(|| "n/a".to_string(), |r| format!("{r:.3}"));
                format!(
                    "[{tag}] {} {} at {}: target={} pos {} -> {} intended={} actual={} fill_rate={rate}",
                    cell.entity_id,
                    cell.ticker,
                    cell.time.label(),
                    qty(cell.target),
                    qty(cell.pos_t),
                    qty(cell.pos_t1),
                    qty(cell.intended_trade),
                    qty(cell.actual_trade),
                )
            })
        })
        .collect();

    let maintain = cells
        .iter()
        .filter(|c| c.outcome == FillOutcome::Maintain)
        .count();
    if lines.is_empty() {
        return Finding::pass(
            view,
            format!("{} cells, {maintain} maintain, no anomalies", cells.len()),
        );
    }
    Finding::warn(
        view,
        format!(
            "{} of {} cells flagged ({maintain} maintain not flagged)",
            lines.len(),
            cells.len()
        ),
    )
    .with_details(capped(lines))
}
