//! alphacheck runner: rules, fill-rate views and reporting.
//!
//! This crate builds on `alphacheck-core` to provide:
//! - Rule engine with eight built-in reconciliation rules, evaluated in parallel
//! - Query views at four granularities (overview, time, ticker, cell)
//! - Run orchestration from a data directory
//! - Console rendering and versioned JSON export

pub mod query;
pub mod reporting;
pub mod rules;
pub mod run;

pub use query::{CellBreakdown, Overview, TickerTimeline, TimeSlice};
pub use reporting::{CheckArtifact, ConsoleReporter};
pub use rules::{Rule, RuleContext, RuleEngine, RuleError, RuleReport, StatusCounts};
pub use run::{AnalysisRun, DataSummary, RunError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn rule_engine_is_send_sync() {
        assert_send::<RuleEngine>();
        assert_sync::<RuleEngine>();
        assert_send::<RuleContext<'static>>();
        assert_sync::<RuleContext<'static>>();
    }

    #[test]
    fn every_builtin_rule_is_send_sync() {
        assert_send::<rules::AlphaSumConsistency>();
        assert_sync::<rules::AlphaSumConsistency>();
        assert_send::<rules::NonNegativeSplitTarget>();
        assert_sync::<rules::NonNegativeSplitTarget>();
        assert_send::<rules::VolumeRounding>();
        assert_sync::<rules::VolumeRounding>();
        assert_send::<rules::T1Sellable>();
        assert_sync::<rules::T1Sellable>();
        assert_send::<rules::TradeDirectionConsistency>();
        assert_sync::<rules::TradeDirectionConsistency>();
        assert_send::<rules::MergeConservation>();
        assert_sync::<rules::MergeConservation>();
        assert_send::<rules::VirtualPositionAttribution>();
        assert_sync::<rules::VirtualPositionAttribution>();
        assert_send::<rules::PositionIntegrity>();
        assert_sync::<rules::PositionIntegrity>();
    }

    #[test]
    fn run_and_views_are_send_sync() {
        assert_send::<AnalysisRun>();
        assert_sync::<AnalysisRun>();
        assert_send::<Overview>();
        assert_sync::<Overview>();
        assert_send::<RuleReport>();
        assert_sync::<RuleReport>();
    }
}
