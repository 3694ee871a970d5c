//! Cell counting and fill-rate summary statistics.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use alphacheck_core::domain::Ticker;
use alphacheck_core::{Anomaly, Cell, FillOutcome};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Fill rates of the analyzable cells, in input order.
pub fn fill_rates<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Vec<f64> {
    cells.into_iter().filter_map(|c| c.fill_rate).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCounts {
    pub total: usize,
    pub analyzable: usize,
    pub maintain: usize,
    pub unexpected_trade: usize,
    pub over_execution: usize,
    pub wrong_direction: usize,
}

impl CellCounts {
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Self {
        let mut counts = Self::default();
        for cell in cells {
            counts.total += 1;
            match cell.outcome {
                FillOutcome::Filled => counts.analyzable += 1,
                FillOutcome::Maintain => counts.maintain += 1,
                FillOutcome::UnexpectedTrade => counts.unexpected_trade += 1,
            }
            match cell.anomaly {
                Some(Anomaly::OverExecution) => counts.over_execution += 1,
                Some(Anomaly::WrongDirection) => counts.wrong_direction += 1,
                None => {}
            }
        }
        counts
    }

    pub fn non_analyzable(&self) -> usize {
        self.maintain + self.unexpected_trade
    }

    pub fn anomalies(&self) -> usize {
        self.over_execution + self.wrong_direction
    }
}

/// Aggregate for one ticker over a set of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerStats {
    pub ticker: Ticker,
    pub counts: CellCounts,
    pub mean_fill_rate: Option<f64>,
    pub median_fill_rate: Option<f64>,
    pub entity_count: usize,
}

/// Per-ticker stats, ordered by ticker.
pub fn ticker_stats(cells: &[Cell]) -> Vec<TickerStats> {
    let mut by_ticker: BTreeMap<&Ticker, Vec<&Cell>> = BTreeMap::new();
    for cell in cells {
        by_ticker.entry(&cell.ticker).or_default().push(cell);
    }
    by_ticker
        .into_iter()
        .map(|(ticker, group)| {
            let rates = fill_rates(group.iter().copied());
            let entities: BTreeSet<_> = group.iter().map(|c| &c.entity_id).collect();
            TickerStats {
                ticker: ticker.clone(),
                counts: CellCounts::from_cells(group.iter().copied()),
                mean_fill_rate: mean(&rates),
                median_fill_rate: median(&rates),
                entity_count: entities.len(),
            }
        })
        .collect()
}
