//! One ticker's fill rate through the day.
//!
//! Points are chronological and only exist at times with cells; a ticker that
//! goes quiet simply has no point there, nothing is interpolated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use alphacheck_core::domain::{EventTime, Finding, Ticker};
use alphacheck_core::{Cell, CellFilter, FillRateEngine};

use super::stats::{fill_rates, mean, CellCounts};
use super::view_finding;

pub const VIEW: &str = "Fill Rate Ticker Timeline";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub time: EventTime,
    pub label: String,
    pub mean_fill_rate: Option<f64>,
    /// Analyzable cells at this time.
    pub count: usize,
    pub entity_count: usize,
    pub non_analyzable: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerTimeline {
    pub ticker: Ticker,
    pub points: Vec<TimelinePoint>,
    pub counts: CellCounts,
    pub mean_fill_rate: Option<f64>,
    pub finding: Finding,
}

impl TickerTimeline {
    pub fn build(engine: &FillRateEngine<'_>, ticker: &Ticker) -> Self {
        let cells = engine.cells(&CellFilter::for_ticker(ticker.clone()));

        let mut by_time: BTreeMap<EventTime, Vec<&Cell>> = BTreeMap::new();
        for cell in &cells {
            by_time.entry(cell.time).or_default().push(cell);
        }
        let points = by_time
            .into_iter()
            .map(|(time, group)| {
                let counts = CellCounts::from_cells(group.iter().copied());
                TimelinePoint {
                    time,
                    label: time.label(),
                    mean_fill_rate: mean(&fill_rates(group.iter().copied())),
                    count: counts.analyzable,
                    entity_count: group.len(),
                    non_analyzable: counts.non_analyzable(),
                }
            })
            .collect();

        Self {
            ticker: ticker.clone(),
            points,
            counts: CellCounts::from_cells(&cells),
            mean_fill_rate: mean(&fill_rates(&cells)),
            finding: view_finding(VIEW, &cells),
        }
    }
}
