//! The merge stage must conserve per-ticker targets, and split must
//! distribute exactly the merged target of every ticker it covers.
//!
//! No allocation counts are checked: split ratios are not assumed even.

use std::collections::{BTreeMap, BTreeSet};

use alphacheck_core::domain::{EventTime, Finding, StreamKind, Ticker};
use alphacheck_core::store::SignalTable;

use super::{capped, qty, Rule, RuleContext, RuleError};

pub const NAME: &str = "Merge Conservation";

pub struct MergeConservation;

fn sums_by_cell(table: &SignalTable) -> BTreeMap<(EventTime, &Ticker), f64> {
    let mut sums = BTreeMap::new();
    for r in table.rows() {
        *sums.entry((r.time, r.ticker)).or_insert(0.0) += r.target;
    }
    sums
}

impl Rule for MergeConservation {
    fn name(&self) -> &str {
        NAME
    }

    fn required_streams(&self) -> &[StreamKind] {
        &[StreamKind::PmTarget, StreamKind::Merged]
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Finding, RuleError> {
        let (Some(pm), Some(merged)) = (ctx.store.pm_targets(), ctx.store.merged()) else {
            return Err(RuleError::Evaluation("pm target or merged stream absent".into()));
        };
        let pm_sums = sums_by_cell(pm);
        let merged_sums = sums_by_cell(merged);

        let keys: BTreeSet<_> = pm_sums.keys().chain(merged_sums.keys()).copied().collect();
        let mut mismatches = Vec::new();
        for key in &keys {
            let p = pm_sums.get(key).copied().unwrap_or(0.0);
            let m = merged_sums.get(key).copied().unwrap_or(0.0);
            if (p - m).abs() > ctx.config.tolerance {
                mismatches.push(format!(
                    "{} at {}: pm_sum={} merged_sum={} delta={}",
                    key.1,
                    key.0.label(),
                    qty(p),
                    qty(m),
                    qty(m - p)
                ));
            }
        }

        // Per-ticker distribution, at times where split produced anything.
        let split_sums = sums_by_cell(ctx.store.split());
        let split_times: BTreeSet<EventTime> = split_sums.keys().map(|(t, _)| *t).collect();
        let mut distribution = Vec::new();
        for (key, &m) in merged_sums.iter().filter(|(k, _)| split_times.contains(&k.0)) {
            let s = split_sums.get(key).copied().unwrap_or(0.0);
            if (m - s).abs() > ctx.config.tolerance {
                distribution.push(format!(
                    "{} at {}: merged={} split={} delta={}",
                    key.1,
                    key.0.label(),
                    qty(m),
                    qty(s),
                    qty(m - s)
                ));
            }
        }

        let orphans: BTreeSet<(EventTime, &Ticker)> = split_sums
            .keys()
            .filter(|key| !merged_sums.contains_key(*key))
            .copied()
            .collect();
        let orphan_lines = orphans
            .iter()
            .map(|(t, ticker)| format!("{ticker} at {}: split without merged counterpart", t.label()));

        if mismatches.is_empty() && distribution.is_empty() && orphans.is_empty() {
            return Ok(Finding::pass(
                NAME,
                format!("All {} (time, ticker) merges conserve PM targets", keys.len()),
            ));
        }
        let summary = format!(
            "Found {} conservation mismatches, {} split distribution mismatches and {} orphan split cells",
            mismatches.len(),
            distribution.len(),
            orphans.len()
        );
        mismatches.extend(distribution);
        mismatches.extend(orphan_lines);
        Ok(Finding::fail(NAME, summary).with_details(capped(mismatches)))
    }
}
