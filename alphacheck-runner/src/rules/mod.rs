//! Rule engine: pluggable validators over the event store.
//!
//! Each rule sees the same immutable [`RuleContext`] and returns one
//! [`Finding`]. The engine owns the failure policy:
//!
//! - a required optional stream is absent → WARN, the rule is not evaluated
//! - the rule returns `Err` → ERROR naming the rule
//! - the rule panics → ERROR naming the rule
//!
//! None of these affect sibling rules. Rules are evaluated on the rayon pool;
//! findings come back in registration order.

pub mod alpha_sum;
pub mod direction;
pub mod merge_conservation;
pub mod non_negative;
pub mod position_integrity;
pub mod t1_sellable;
pub mod virtual_attribution;
pub mod volume_rounding;

#[cfg(test)]
mod fixtures;

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use alphacheck_core::domain::{Finding, Status, StreamKind};
use alphacheck_core::{AnalysisConfig, DataError, EventStore, FillRateEngine, JoinIndex};

pub use alpha_sum::AlphaSumConsistency;
pub use direction::TradeDirectionConsistency;
pub use merge_conservation::MergeConservation;
pub use non_negative::NonNegativeSplitTarget;
pub use position_integrity::PositionIntegrity;
pub use t1_sellable::T1Sellable;
pub use virtual_attribution::VirtualPositionAttribution;
pub use volume_rounding::VolumeRounding;

/// Detail lines kept per finding before the rest is summarized.
pub const MAX_DETAIL_LINES: usize = 50;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

/// Everything a rule may read. Shared across rule threads.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub store: &'a EventStore,
    pub index: &'a JoinIndex,
    pub config: &'a AnalysisConfig,
}

impl<'a> RuleContext<'a> {
    pub fn new(store: &'a EventStore, index: &'a JoinIndex, config: &'a AnalysisConfig) -> Self {
        Self {
            store,
            index,
            config,
        }
    }

    pub fn fill_rate(&self) -> FillRateEngine<'a> {
        FillRateEngine::new(self.store, self.index, self.config)
    }
}

/// A validator producing one finding per run.
pub trait Rule: Send + Sync {
    /// Rule name (for findings and logging).
    fn name(&self) -> &str;

    /// Optional streams this rule cannot run without.
    fn required_streams(&self) -> &[StreamKind] {
        &[]
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Finding, RuleError>;
}

/// Per-status finding counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pass: usize,
    pub warn: usize,
    pub fail: usize,
    pub error: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: Status) {
        self.total += 1;
        match status {
            Status::Pass => self.pass += 1,
            Status::Warn => self.warn += 1,
            Status::Fail => self.fail += 1,
            Status::Error => self.error += 1,
        }
    }

    pub fn critical(&self) -> usize {
        self.fail + self.error
    }
}

/// Findings of one engine run, in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleReport {
    pub findings: Vec<Finding>,
    pub counts: StatusCounts,
}

impl RuleReport {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let mut counts = StatusCounts::default();
        for f in &findings {
            counts.record(f.status);
        }
        Self { findings, counts }
    }

    /// True when any finding is FAIL or ERROR.
    pub fn has_critical(&self) -> bool {
        self.counts.critical() > 0
    }

    /// Worst status across findings; PASS for an empty report.
    pub fn overall(&self) -> Status {
        self.findings
            .iter()
            .map(|f| f.status)
            .max()
            .unwrap_or(Status::Pass)
    }

    pub fn finding(&self, rule_name: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.rule_name == rule_name)
    }
}

/// Explicit rule registry.
#[derive(Default)]
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// All eight built-in rules, in report order.
    pub fn with_default_rules() -> Self {
        let mut engine = Self::new();
        engine
            .register(AlphaSumConsistency)
            .register(NonNegativeSplitTarget)
            .register(VolumeRounding)
            .register(T1Sellable)
            .register(TradeDirectionConsistency)
            .register(MergeConservation)
            .register(VirtualPositionAttribution)
            .register(PositionIntegrity);
        engine
    }

    pub fn register(&mut self, rule: impl Rule + 'static) -> &mut Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Evaluate every registered rule in parallel.
    pub fn run(&self, ctx: &RuleContext<'_>) -> RuleReport {
        let findings: Vec<Finding> = self
            .rules
            .par_iter()
            .map(|rule| evaluate_guarded(rule.as_ref(), ctx))
            .collect();
        RuleReport::from_findings(findings)
    }
}

fn evaluate_guarded(rule: &dyn Rule, ctx: &RuleContext<'_>) -> Finding {
    let name = rule.name();
    let missing: Vec<&str> = rule
        .required_streams()
        .iter()
        .filter(|&&kind| !ctx.store.has_stream(kind))
        .map(|kind| kind.name())
        .collect();

    let finding = if !missing.is_empty() {
        Finding::warn(
            name,
            format!("constraint not checked: {} stream absent", missing.join(", ")),
        )
    } else {
        match catch_unwind(AssertUnwindSafe(|| rule.evaluate(ctx))) {
            Ok(Ok(finding)) => finding,
            Ok(Err(e)) => Finding::error(name, format!("rule failed: {e}")),
            Err(payload) => {
                Finding::error(name, format!("rule panicked: {}", panic_message(&*payload)))
            }
        }
    };

    if finding.status == Status::Error {
        warn!(rule = name, summary = %finding.summary, "rule errored");
    } else {
        info!(rule = name, status = %finding.status, "rule evaluated");
    }
    finding
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Truncate detail lines to [`MAX_DETAIL_LINES`], noting how many were dropped.
pub fn capped(mut lines: Vec<String>) -> Vec<String> {
    if lines.len() > MAX_DETAIL_LINES {
        let dropped = lines.len() - MAX_DETAIL_LINES;
        lines.truncate(MAX_DETAIL_LINES);
        lines.push(format!("... and {dropped} more"));
    }
    lines
}

/// `value` formatted without a trailing `.0` when it is integral.
pub fn qty(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value:.4}")
    }
}
