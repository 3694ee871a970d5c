use serde::{Deserialize, Serialize};

use alphacheck_core::domain::{EventTime, Finding};
use alphacheck_core::{Cell, CellFilter, FillRateEngine};

use super::stats::{fill_rates, mean, median, ticker_stats, CellCounts, TickerStats};
use super::view_finding;

pub const VIEW: &str = "Fill Rate Time Event";

/// Every cell originating at one time, with per-ticker means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlice {
    pub time: EventTime,
    pub label: String,
    pub counts: CellCounts,
    pub mean_fill_rate: Option<f64>,
    pub median_fill_rate: Option<f64>,
    pub tickers: Vec<TickerStats>,
    pub cells: Vec<Cell>,
    pub finding: Finding,
}

impl TimeSlice {
    pub fn build(engine: &FillRateEngine<'_>, time: EventTime) -> Self {
        let cells = engine.cells(&CellFilter::at_time(time));
        let rates = fill_rates(&cells);
        Self {
            time,
            label: time.label(),
            counts: CellCounts::from_cells(&cells),
            mean_fill_rate: mean(&rates),
            median_fill_rate: median(&rates),
            tickers: ticker_stats(&cells),
            finding: view_finding(VIEW, &cells),
            cells,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
