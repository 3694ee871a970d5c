//! Per-entity rows for one (time, ticker) cell.
//!
//! The net fill rate weights entities by trade size:
//! `Σ actual_trade / Σ intended_trade` over analyzable rows only.

use serde::{Deserialize, Serialize};

use alphacheck_core::domain::{EventTime, Finding, Ticker};
use alphacheck_core::{Cell, CellFilter, FillRateEngine};

use super::stats::CellCounts;
use super::view_finding;

pub const VIEW: &str = "Fill Rate Cell Breakdown";

/// Market snapshot for the cell, when the market stream has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub last_price: f64,
    pub prev_close_price: f64,
    /// Percent change from the previous close; `None` when that close is zero.
    pub change_pct: Option<f64>,
    /// `total_intended × last_price`.
    pub intended_notional: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellBreakdown {
    pub time: EventTime,
    pub ticker: Ticker,
    pub rows: Vec<Cell>,
    pub counts: CellCounts,
    pub total_intended: f64,
    pub total_actual: f64,
    pub net_fill_rate: Option<f64>,
    pub market: Option<MarketContext>,
    pub finding: Finding,
}

impl CellBreakdown {
    pub fn build(engine: &FillRateEngine<'_>, time: EventTime, ticker: &Ticker) -> Self {
        let rows = engine.cells(&CellFilter::cell(time, ticker.clone()));
        let (total_intended, total_actual) = rows
            .iter()
            .filter(|c| c.is_analyzable())
            .fold((0.0, 0.0), |(i, a), c| (i + c.intended_trade, a + c.actual_trade));
        let net_fill_rate = (total_intended.abs() > engine.config().maintain_epsilon)
            .then(|| total_actual / total_intended);

        let market = engine.store().market().and_then(|table| {
            let row = table.row(engine.index().market_row(time, ticker)?);
            Some(MarketContext {
                last_price: row.last_price,
                prev_close_price: row.prev_close_price,
                change_pct: (row.prev_close_price != 0.0)
                    .then(|| (row.last_price / row.prev_close_price - 1.0) * 100.0),
                intended_notional: total_intended * row.last_price,
            })
        });

        Self {
            time,
            ticker: ticker.clone(),
            counts: CellCounts::from_cells(&rows),
            total_intended,
            total_actual,
            net_fill_rate,
            market,
            finding: view_finding(VIEW, &rows),
            rows,
        }
    }
}
