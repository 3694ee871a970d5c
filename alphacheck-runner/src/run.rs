//! One analysis run: load → index → rules and query views.
//!
//! An [`AnalysisRun`] owns the immutable store, its join index and the
//! config for the lifetime of the run. Rule evaluation and every query view
//! borrow from it; nothing is cached between calls.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use alphacheck_core::data::load_dir;
use alphacheck_core::domain::{EventTime, Ticker};
use alphacheck_core::store::StreamSummary;
use alphacheck_core::{AnalysisConfig, ConfigError, DataError, EventStore, FillRateEngine, JoinIndex};

use crate::query::{CellBreakdown, Overview, TickerTimeline, TimeSlice};
use crate::rules::{RuleContext, RuleEngine, RuleReport};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// What was loaded, for the `summary` command and report headers.
#[derive(Debug, Clone, Serialize)]
pub struct DataSummary {
    pub fingerprint: String,
    pub total_records: usize,
    pub first_intraday: Option<String>,
    pub series: usize,
    pub streams: Vec<StreamSummary>,
}

#[derive(Debug)]
pub struct AnalysisRun {
    store: EventStore,
    index: JoinIndex,
    config: AnalysisConfig,
}

impl AnalysisRun {
    pub fn new(store: EventStore, config: AnalysisConfig) -> Self {
        let index = JoinIndex::build(&store);
        debug!(records = store.total_records(), "analysis run ready");
        Self {
            store,
            index,
            config,
        }
    }

    /// Load a run directory with the given config.
    pub fn load(dir: &Path, config: AnalysisConfig) -> Result<Self, RunError> {
        config.validate()?;
        let store = load_dir(dir)?;
        Ok(Self::new(store, config))
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn index(&self) -> &JoinIndex {
        &self.index
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn context(&self) -> RuleContext<'_> {
        RuleContext::new(&self.store, &self.index, &self.config)
    }

    pub fn fill_rate(&self) -> FillRateEngine<'_> {
        FillRateEngine::new(&self.store, &self.index, &self.config)
    }

    // ─── Rules ──────────────────────────────────────────────────────

    pub fn check_with(&self, engine: &RuleEngine) -> RuleReport {
        let report = engine.run(&self.context());
        info!(
            rules = report.counts.total,
            pass = report.counts.pass,
            warn = report.counts.warn,
            fail = report.counts.fail,
            error = report.counts.error,
            "rule evaluation complete"
        );
        report
    }

    pub fn check(&self) -> RuleReport {
        self.check_with(&RuleEngine::with_default_rules())
    }

    // ─── Query views ────────────────────────────────────────────────

    pub fn overview(&self) -> Overview {
        Overview::build(&self.fill_rate())
    }

    pub fn time_slice(&self, time: EventTime) -> TimeSlice {
        TimeSlice::build(&self.fill_rate(), time)
    }

    pub fn ticker_timeline(&self, ticker: &Ticker) -> TickerTimeline {
        TickerTimeline::build(&self.fill_rate(), ticker)
    }

    pub fn cell_breakdown(&self, time: EventTime, ticker: &Ticker) -> CellBreakdown {
        CellBreakdown::build(&self.fill_rate(), time, ticker)
    }

    pub fn summary(&self) -> DataSummary {
        DataSummary {
            fingerprint: self.store.fingerprint(),
            total_records: self.store.total_records(),
            first_intraday: self.index.first_intraday_time().map(EventTime::label),
            series: self.index.series().count(),
            streams: self.store.summary(),
        }
    }
}
