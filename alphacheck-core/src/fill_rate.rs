//! Fill-Rate Engine: per-cell execution quality under target-position semantics.
//!
//! A split signal is an absolute position to reach, not a trade size. For one
//! (entity, ticker) series and a recorded step T → T+1:
//!
//! ```text
//! intended_trade = target(T) - pos(T)
//! actual_trade   = pos(T+1) - pos(T)
//! fill_rate      = actual_trade / intended_trade     when |intended_trade| > epsilon
//! ```
//!
//! Cells whose intended trade is zero are never divided; they are classified as
//! [`FillOutcome::Maintain`] or [`FillOutcome::UnexpectedTrade`] and excluded
//! from numeric aggregates by the query layer.
//!
//! `T+1` is the next Position time of the same series. Origins are the union
//! of the series' Split and Position times, so a signal arriving after a gap
//! still pairs with the next recorded position.
//!
//! A target stays in force until the next signal replaces it: at a step with
//! no signal of its own, `target(T)` is the latest earlier signal of the same
//! day. Day boundaries are never crossed implicitly. A carry-in signal never
//! applies to an intraday step, and the previous-day marker is an origin only
//! when it is present in the data.

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::domain::{EntityId, EventTime, StreamKind, Ticker};
use crate::index::{JoinIndex, SeriesKey};
use crate::store::EventStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FillOutcome {
    /// Non-zero intended trade; `fill_rate` is set.
    Filled,
    /// Intended and actual trade both zero. Correctly inert.
    Maintain,
    /// No trade intended but the position moved.
    UnexpectedTrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Anomaly {
    /// Fill rate above the configured threshold.
    OverExecution,
    /// Position moved against the intended direction (negative fill rate).
    WrongDirection,
}

/// One (time, entity, ticker) evaluation. Created per query, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub time: EventTime,
    pub next_time: EventTime,
    pub entity_id: EntityId,
    pub ticker: Ticker,
    pub target: f64,
    /// A split target was in force at `time` (its own or carried from earlier that day).
    pub signal_present: bool,
    pub pos_t: f64,
    pub pos_t_present: bool,
    pub pos_t1: f64,
    pub intended_trade: f64,
    pub actual_trade: f64,
    pub fill_rate: Option<f64>,
    pub outcome: FillOutcome,
    pub anomaly: Option<Anomaly>,
}

impl Cell {
    /// Evaluate a cell. Absent inputs count as zero; presence is kept on the cell.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate(
        time: EventTime,
        next_time: EventTime,
        entity_id: EntityId,
        ticker: Ticker,
        target: Option<f64>,
        pos_t: Option<f64>,
        pos_t1: f64,
        config: &AnalysisConfig,
    ) -> Self {
        let signal_present = target.is_some();
        let pos_t_present = pos_t.is_some();
        let target = target.unwrap_or(0.0);
        let pos_t = pos_t.unwrap_or(0.0);
        let intended_trade = target - pos_t;
        let actual_trade = pos_t1 - pos_t;
        let (outcome, fill_rate) = classify(intended_trade, actual_trade, config.maintain_epsilon);
        let anomaly = fill_rate.and_then(|rate| {
            if rate > config.fill_rate_anomaly_threshold {
                Some(Anomaly::OverExecution)
            } else if rate < 0.0 {
                Some(Anomaly::WrongDirection)
            } else {
                None
            }
        });

        Self {
            time,
            next_time,
            entity_id,
            ticker,
            target,
            signal_present,
            pos_t,
            pos_t_present,
            pos_t1,
            intended_trade,
            actual_trade,
            fill_rate,
            outcome,
            anomaly,
        }
    }

    /// Only analyzable cells feed means, medians and best/worst rankings.
    pub fn is_analyzable(&self) -> bool {
        self.outcome == FillOutcome::Filled
    }
}

/// Outcome and fill rate for an intended/actual trade pair.
pub fn classify(intended_trade: f64, actual_trade: f64, epsilon: f64) -> (FillOutcome, Option<f64>) {
    if intended_trade.abs() > epsilon {
        (FillOutcome::Filled, Some(actual_trade / intended_trade))
    } else if actual_trade.abs() > epsilon {
        (FillOutcome::UnexpectedTrade, None)
    } else {
        (FillOutcome::Maintain, None)
    }
}

/// Restricts which cells are built. Applied to index lookups, not to output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellFilter {
    pub time: Option<EventTime>,
    pub ticker: Option<Ticker>,
}

impl CellFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn at_time(time: EventTime) -> Self {
        Self {
            time: Some(time),
            ticker: None,
        }
    }

    pub fn for_ticker(ticker: impl Into<Ticker>) -> Self {
        Self {
            time: None,
            ticker: Some(ticker.into()),
        }
    }

    pub fn cell(time: EventTime, ticker: impl Into<Ticker>) -> Self {
        Self {
            time: Some(time),
            ticker: Some(ticker.into()),
        }
    }

    pub fn matches(&self, cell: &Cell) -> bool {
        self.time.map_or(true, |t| t == cell.time)
            && self.ticker.as_ref().map_or(true, |k| *k == cell.ticker)
    }
}

/// Builds cells from the store through the join index.
#[derive(Debug, Clone, Copy)]
pub struct FillRateEngine<'a> {
    store: &'a EventStore,
    index: &'a JoinIndex,
    config: &'a AnalysisConfig,
}

impl<'a> FillRateEngine<'a> {
    pub fn new(store: &'a EventStore, index: &'a JoinIndex, config: &'a AnalysisConfig) -> Self {
        Self {
            store,
            index,
            config,
        }
    }

    /// Cells selected by `filter`, sorted by (time, ticker, entity).
    ///
    /// A time filter touches only the series recorded at that time; a ticker
    /// filter touches only that ticker's series. Neither materializes the
    /// unfiltered set.
    pub fn cells(&self, filter: &CellFilter) -> Vec<Cell> {
        let ticker_key = match &filter.ticker {
            Some(ticker) => match self.index.ticker_key(ticker) {
                Some(k) => Some(k),
                None => return Vec::new(),
            },
            None => None,
        };

        let mut cells: Vec<Cell> = match (filter.time, ticker_key) {
            (Some(time), Some(ticker)) => self
                .index
                .origins_at_cell(time, ticker)
                .into_iter()
                .filter_map(|entity| self.cell_at((entity, ticker), time))
                .collect(),
            (Some(time), None) => self
                .index
                .origins_at(time)
                .iter()
                .filter_map(|&series| self.cell_at(series, time))
                .collect(),
            (None, Some(ticker)) => self
                .index
                .series_for_ticker(ticker)
                .iter()
                .flat_map(|&entity| self.series_cells((entity, ticker)))
                .collect(),
            (None, None) => self
                .index
                .series()
                .flat_map(|series| self.series_cells(series))
                .collect(),
        };

        cells.sort_by(|a, b| {
            a.time
                .cmp(&b.time)
                .then_with(|| a.ticker.cmp(&b.ticker))
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        cells
    }

    fn series_cells(&self, series: SeriesKey) -> Vec<Cell> {
        self.index
            .origin_times(series)
            .into_iter()
            .filter_map(|time| self.cell_at(series, time))
            .collect()
    }

    /// The cell originating at `time` for a series, if a later position exists.
    pub fn cell_at(&self, series: SeriesKey, time: EventTime) -> Option<Cell> {
        let next_time = self.index.next_position_time(series, time)?;
        let positions = self.store.positions();
        let target = self.target_at(series, time);
        let pos_t = self
            .index
            .row_by_key(StreamKind::Position, series, time)
            .map(|row| positions.pos(row));
        let pos_t1 = self
            .index
            .row_by_key(StreamKind::Position, series, next_time)
            .map(|row| positions.pos(row))?;

        Some(Cell::evaluate(
            time,
            next_time,
            self.index.entity(series.0).clone(),
            self.index.ticker(series.1).clone(),
            target,
            pos_t,
            pos_t1,
            self.config,
        ))
    }

    /// Split target in force at `time`: the latest signal at or before it on
    /// the same day.
    pub fn target_at(&self, series: SeriesKey, time: EventTime) -> Option<f64> {
        let signal_time = self.index.at_or_before(StreamKind::Split, series, time)?;
        if self.index.is_carry_in(signal_time) && !self.index.is_carry_in(time) {
            return None;
        }
        self.index
            .row_by_key(StreamKind::Split, series, signal_time)
            .map(|row| self.store.split().target(row))
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.config
    }

    pub fn index(&self) -> &JoinIndex {
        self.index
    }

    pub fn store(&self) -> &EventStore {
        self.store
    }
}
