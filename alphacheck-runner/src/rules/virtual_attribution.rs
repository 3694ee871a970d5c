use alphacheck_core::domain::{Finding, StreamKind};

use super::{capped, qty, Rule, RuleContext, RuleError};

pub const NAME: &str = "Virtual Position Attribution";

/// Trader positions must be fully attributed back to PMs: at every (time, ticker)
/// in the virtual stream the two sums agree.
pub struct VirtualPositionAttribution;

impl Rule for VirtualPositionAttribution {
    fn name(&self) -> &str {
        NAME
    }

    fn required_streams(&self) -> &[StreamKind] {
        &[StreamKind::VirtualPosition]
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Finding, RuleError> {
        let virtual_pos = ctx
            .store
            .virtual_positions()
            .ok_or_else(|| RuleError::Evaluation("virtual position stream absent".into()))?;
        let traders = ctx.store.positions();
        let index = ctx.index;

        let mut checked = 0usize;
        let mut lines = Vec::new();
        for (time, ticker, pms) in index.memberships(StreamKind::VirtualPosition) {
            checked += 1;
            let virtual_sum: f64 = pms
                .iter()
                .filter_map(|&pm| index.row_by_key(StreamKind::VirtualPosition, (pm, ticker), time))
                .map(|row| virtual_pos.pos(row))
                .sum();
            let trader_sum: f64 = index
                .entities_at(StreamKind::Position, time, index.ticker(ticker))
                .into_iter()
                .filter_map(|e| index.row(StreamKind::Position, e, time, index.ticker(ticker)))
                .map(|row| traders.pos(row))
                .sum();
            let delta = trader_sum - virtual_sum;
            if delta.abs() > ctx.config.tolerance {
                lines.push(format!(
                    "{} at {}: traders={} virtual={} delta={}",
                    index.ticker(ticker),
                    time.label(),
                    qty(trader_sum),
                    qty(virtual_sum),
                    qty(delta)
                ));
            }
        }

        if lines.is_empty() {
            return Ok(Finding::pass(
                NAME,
                format!("All {checked} (time, ticker) virtual positions match trader positions"),
            ));
        }
        Ok(Finding::fail(
            NAME,
            format!("Found {} (time, ticker) attribution mismatches out of {checked}", lines.len()),
        )
        .with_details(capped(lines)))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use alphacheck_core::domain::Status;

    const T: i64 = 93_000_000;

    #[test]
    fn test_full_attribution_passes() {
        let f = run(
            &VirtualPositionAttribution,
            base()
                .positions(vec![pos("t1", T, "AAA", 600.0), pos("t2", T, "AAA", 400.0)])
                .virtual_positions(vec![pos("pm1", T, "AAA", 700.0), pos("pm2", T, "AAA", 300.0)]),
        );
        assert_eq!(f.status, Status::Pass);
    }

    #[test]
    fn test_unattributed_shares_fail() {
        let f = run(
            &VirtualPositionAttribution,
            base()
                .positions(vec![pos("t1", T, "AAA", 1100.0)])
                .virtual_positions(vec![pos("pm1", T, "AAA", 1000.0)]),
        );
        assert_eq!(f.status, Status::Fail);
        assert!(f.detail_lines[0].ends_with("delta=100"));
    }

    #[test]
    fn test_virtual_without_trader_rows_counts_zero() {
        let f = run(
            &VirtualPositionAttribution,
            base().virtual_positions(vec![pos("pm1", T, "AAA", 500.0)]),
        );
        assert_eq!(f.status, Status::Fail);
    }
}
