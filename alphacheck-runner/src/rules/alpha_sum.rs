//! Merged and split alpha must carry the same total target at every time.

use std::collections::BTreeMap;

use alphacheck_core::domain::{EventTime, Finding, StreamKind};
use alphacheck_core::store::SignalTable;
use alphacheck_core::JoinIndex;

use super::{capped, qty, Rule, RuleContext, RuleError};

pub const NAME: &str = "Alpha Sum Consistency";

pub struct AlphaSumConsistency;

fn sums_by_time(index: &JoinIndex, kind: StreamKind, table: &SignalTable) -> BTreeMap<EventTime, f64> {
    index
        .times(kind)
        .map(|t| (t, index.rows_at(kind, t).iter().map(|&r| table.target(r)).sum::<f64>()))
        .collect()
}

impl Rule for AlphaSumConsistency {
    fn name(&self) -> &str {
        NAME
    }

    fn required_streams(&self) -> &[StreamKind] {
        &[StreamKind::Merged]
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Finding, RuleError> {
        let merged_table = ctx
            .store
            .merged()
            .ok_or_else(|| RuleError::Evaluation("merged stream absent".into()))?;
        let merged = sums_by_time(ctx.index, StreamKind::Merged, merged_table);
        let split = sums_by_time(ctx.index, StreamKind::Split, ctx.store.split());

        let mut mismatches = Vec::new();
        let mut one_sided = Vec::new();
        let mut compared = 0usize;
        for (t, &m) in &merged {
            match split.get(t) {
                Some(&s) => {
                    compared += 1;
                    let delta = m - s;
                    if delta.abs() > ctx.config.tolerance {
                        mismatches.push(format!(
                            "time {}: merged={} split={} delta={}",
                            t.label(),
                            qty(m),
                            qty(s),
                            qty(delta)
                        ));
                    }
                }
                None => one_sided.push(format!("time {}: merged only (sum={})", t.label(), qty(m))),
            }
        }
        for (t, &s) in split.iter().filter(|(t, _)| !merged.contains_key(*t)) {
            one_sided.push(format!("time {}: split only (sum={})", t.label(), qty(s)));
        }

        if !mismatches.is_empty() {
            let summary = format!("Found {} time events with sum mismatches", mismatches.len());
            mismatches.extend(one_sided);
            return Ok(Finding::fail(NAME, summary).with_details(capped(mismatches)));
        }
        if !one_sided.is_empty() {
            return Ok(Finding::warn(
                NAME,
                format!(
                    "{compared} shared time events consistent; {} time events present in only one stream",
                    one_sided.len()
                ),
            )
            .with_details(capped(one_sided)));
        }
        Ok(Finding::pass(
            NAME,
            format!("All {compared} time events have consistent alpha sums"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use alphacheck_core::domain::{SignalKind, Status};

    const T: i64 = 93_000_000;

    #[test]
    fn test_equal_sums_pass() {
        let f = run(
            &AlphaSumConsistency,
            base()
                .merged(vec![sig(SignalKind::Merged, "m", T, "AAA", 1000.0)])
                .split(vec![split("t1", T, "AAA", 500.0), split("t2", T, "AAA", 500.0)]),
        );
        assert_eq!(f.status, Status::Pass);
    }

    #[test]
    fn test_mismatch_reports_delta() {
        let f = run(
            &AlphaSumConsistency,
            base()
                .merged(vec![sig(SignalKind::Merged, "m", T, "AAA", 1000.0)])
                .split(vec![split("t1", T, "AAA", 500.0), split("t2", T, "AAA", 400.0)]),
        );
        assert_eq!(f.status, Status::Fail);
        assert!(f.detail_lines[0].contains("delta=100"), "{:?}", f.detail_lines);
    }

    #[test]
    fn test_one_sided_time_warns() {
        let f = run(
            &AlphaSumConsistency,
            base()
                .merged(vec![
                    sig(SignalKind::Merged, "m", T, "AAA", 1000.0),
                    sig(SignalKind::Merged, "m", 94_000_000, "AAA", 800.0),
                ])
                .split(vec![split("t1", T, "AAA", 1000.0)]),
        );
        assert_eq!(f.status, Status::Warn);
        assert!(f.detail_lines[0].contains("merged only"));
    }

    #[test]
    fn test_sums_across_tickers_per_time() {
        let f = run(
            &AlphaSumConsistency,
            base()
                .merged(vec![
                    sig(SignalKind::Merged, "m", T, "AAA", 600.0),
                    sig(SignalKind::Merged, "m", T, "BBB", 400.0),
                ])
                .split(vec![split("t1", T, "AAA", 1000.0)]),
        );
        assert_eq!(f.status, Status::Pass);
    }
}
