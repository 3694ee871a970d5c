use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use alphacheck_core::domain::{Finding, Ticker};
use alphacheck_core::{Cell, CellFilter, FillRateEngine};

use super::stats::{fill_rates, mean, median, ticker_stats, CellCounts, TickerStats};
use super::view_finding;

pub const VIEW: &str = "Fill Rate Overview";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerRank {
    pub ticker: Ticker,
    pub mean_fill_rate: f64,
}

/// Whole-run fill-rate summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub counts: CellCounts,
    pub time_events: usize,
    pub mean_fill_rate: Option<f64>,
    pub median_fill_rate: Option<f64>,
    pub best_ticker: Option<TickerRank>,
    pub worst_ticker: Option<TickerRank>,
    pub tickers: Vec<TickerStats>,
    pub finding: Finding,
}

impl Overview {
    pub fn build(engine: &FillRateEngine<'_>) -> Self {
        Self::from_cells(&engine.cells(&CellFilter::all()))
    }

    pub fn from_cells(cells: &[Cell]) -> Self {
        let rates = fill_rates(cells);
        let tickers = ticker_stats(cells);
        let ranked = tickers
            .iter()
            .filter_map(|s| s.mean_fill_rate.map(|m| (s, m)));
        let best_ticker = ranked
            .clone()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(s, m)| TickerRank {
                ticker: s.ticker.clone(),
                mean_fill_rate: m,
            });
        let worst_ticker = ranked
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(s, m)| TickerRank {
                ticker: s.ticker.clone(),
                mean_fill_rate: m,
            });
        let time_events = cells.iter().map(|c| c.time).collect::<BTreeSet<_>>().len();

        Self {
            counts: CellCounts::from_cells(cells),
            time_events,
            mean_fill_rate: mean(&rates),
            median_fill_rate: median(&rates),
            best_ticker,
            worst_ticker,
            tickers,
            finding: view_finding(VIEW, cells),
        }
    }
}
