//! T+1 sellable constraint for PM targets.
//!
//! Shares bought today cannot be sold today. For each intraday PM target the
//! required trade against the PM's current virtual position is computed; a
//! required sell may not exceed what the PM carried in from the previous day.
//!
//! The current virtual position is the record at T, else the nearest earlier
//! one, else the carry-in baseline. A (pm, ticker) without a baseline is
//! reported as unresolved; it is never assumed to be flat.

use std::collections::BTreeSet;

use alphacheck_core::domain::{Finding, StreamKind};

use super::{capped, qty, Rule, RuleContext, RuleError};

pub const NAME: &str = "T+1 Sellable Constraint";

pub struct T1Sellable;

impl Rule for T1Sellable {
    fn name(&self) -> &str {
        NAME
    }

    fn required_streams(&self) -> &[StreamKind] {
        &[StreamKind::PmTarget, StreamKind::VirtualPosition]
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Finding, RuleError> {
        let (Some(targets), Some(virtual_pos)) =
            (ctx.store.pm_targets(), ctx.store.virtual_positions())
        else {
            return Err(RuleError::Evaluation(
                "pm target or virtual position stream absent".into(),
            ));
        };
        let index = ctx.index;
        let tol = ctx.config.tolerance;

        let mut checked = 0usize;
        let mut violations = Vec::new();
        let mut total_excess = 0.0;
        let mut unresolved = BTreeSet::new();

        for r in targets.rows() {
            if index.is_carry_in(r.time) {
                continue;
            }
            let series = index
                .entity_key(r.entity)
                .zip(index.ticker_key(r.ticker));
            let baseline = series.and_then(|s| index.baseline_row(StreamKind::VirtualPosition, s));
            let (Some(series), Some(baseline_row)) = (series, baseline) else {
                unresolved.insert((r.entity.clone(), r.ticker.clone()));
                continue;
            };

            let previous_day = virtual_pos.pos(baseline_row);
            let current = index
                .at_or_before(StreamKind::VirtualPosition, series, r.time)
                .and_then(|t| index.row_by_key(StreamKind::VirtualPosition, series, t))
                .map_or(previous_day, |row| virtual_pos.pos(row));

            checked += 1;
            let required = r.target - current;
            if required >= -tol {
                continue;
            }
            let sellable = previous_day.max(0.0);
            let excess = -required - sellable;
            if excess > tol {
                total_excess += excess;
                violations.push(format!(
                    "{} {} at {}: target={} current={} sell={} sellable={} excess={}",
                    r.entity,
                    r.ticker,
                    r.time.label(),
                    qty(r.target),
                    qty(current),
                    qty(-required),
                    qty(sellable),
                    qty(excess)
                ));
            }
        }

        let unresolved_lines: Vec<String> = unresolved
            .iter()
            .map(|(pm, ticker)| format!("{pm} {ticker}: no previous-day virtual position"))
            .collect();

        if !violations.is_empty() {
            let summary = format!(
                "Found {} T+1 constraint violations (total excess: {})",
                violations.len(),
                qty(total_excess)
            );
            violations.extend(unresolved_lines);
            return Ok(Finding::fail(NAME, summary).with_details(capped(violations)));
        }
        if !unresolved_lines.is_empty() {
            return Ok(Finding::warn(
                NAME,
                format!(
                    "{checked} PM targets respect T+1; {} (pm, ticker) pairs have no baseline and were not checked",
                    unresolved_lines.len()
                ),
            )
            .with_details(capped(unresolved_lines)));
        }
        Ok(Finding::pass(
            NAME,
            format!("All {checked} PM targets respect T+1 sellable constraints"),
        ))
    }
}
