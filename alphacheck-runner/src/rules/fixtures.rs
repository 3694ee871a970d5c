//! Store builders shared by the rule unit tests.

use alphacheck_core::domain::{PositionEvent, SignalEvent, SignalKind};
use alphacheck_core::store::EventStoreBuilder;
use alphacheck_core::{AnalysisConfig, EventStore, JoinIndex};

use super::{Rule, RuleContext};
use alphacheck_core::domain::Finding;

pub fn sig(kind: SignalKind, entity: &str, time: i64, ticker: &str, target: f64) -> SignalEvent {
    SignalEvent::new(kind, entity, time, ticker, target)
}

pub fn split(entity: &str, time: i64, ticker: &str, target: f64) -> SignalEvent {
    sig(SignalKind::Split, entity, time, ticker, target)
}

pub fn pos(entity: &str, time: i64, ticker: &str, realtime_pos: f64) -> PositionEvent {
    PositionEvent::long_only(entity, time, ticker, realtime_pos)
}

/// Builder with empty mandatory streams already supplied.
pub fn base() -> EventStoreBuilder {
    EventStore::builder().split(Vec::new()).positions(Vec::new())
}

pub fn run(rule: &dyn Rule, builder: EventStoreBuilder) -> Finding {
    run_with(rule, builder, AnalysisConfig::default())
}

pub fn run_with(rule: &dyn Rule, builder: EventStoreBuilder, config: AnalysisConfig) -> Finding {
    let store = builder.build().unwrap();
    let index = JoinIndex::build(&store);
    rule.evaluate(&RuleContext::new(&store, &index, &config)).unwrap()
}
