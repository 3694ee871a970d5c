//! Trades implied by split targets must be whole lots.
//!
//! `trade = split.target - realtime_pos` at the same (entity, time, ticker),
//! with a missing position read as zero. The remainder is Euclidean, so a
//! sell of 265 against a lot of 100 reports 35, the distance to the lot below.

use std::collections::BTreeSet;

use alphacheck_core::domain::{Finding, StreamKind};

use super::{capped, qty, Rule, RuleContext, RuleError};

pub const NAME: &str = "Volume Rounding";

pub struct VolumeRounding;

/// Euclidean remainder of `trade` by `lot`, snapped to zero within `tolerance`.
pub fn lot_remainder(trade: f64, lot: f64, tolerance: f64) -> f64 {
    let r = trade.rem_euclid(lot);
    if r <= tolerance || lot - r <= tolerance {
        0.0
    } else {
        r
    }
}

impl Rule for VolumeRounding {
    fn name(&self) -> &str {
        NAME
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Finding, RuleError> {
        let lot = ctx.config.lot();
        let positions = ctx.store.positions();
        let mut times = BTreeSet::new();
        let mut bad_times = BTreeSet::new();
        let mut lines = Vec::new();

        let split = ctx.store.split();
        for r in split.rows() {
            times.insert(r.time);
            let pos = ctx
                .index
                .row(StreamKind::Position, r.entity, r.time, r.ticker)
                .map_or(0.0, |row| positions.pos(row));
            let trade = r.target - pos;
            let remainder = lot_remainder(trade, lot, ctx.config.tolerance);
            if remainder != 0.0 {
                bad_times.insert(r.time);
                lines.push(format!(
                    "{} {} at {}: target={} pos={} trade={} remainder={}",
                    r.entity,
                    r.ticker,
                    r.time.label(),
                    qty(r.target),
                    qty(pos),
                    qty(trade),
                    qty(remainder)
                ));
            }
        }

        let lot_label = ctx.config.lot_size;
        if lines.is_empty() {
            return Ok(Finding::pass(
                NAME,
                format!(
                    "All {} trade volumes are rounded to {lot_label} shares across {} time events",
                    split.len(),
                    times.len()
                ),
            ));
        }
        Ok(Finding::fail(
            NAME,
            format!(
                "Found {} trade volumes not rounded to {lot_label} shares across {} time events",
                lines.len(),
                bad_times.len()
            ),
        )
        .with_details(capped(lines)))
    }
}
