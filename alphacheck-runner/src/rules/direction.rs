//! An intended buy must not shrink the position; an intended sell must not grow it.

use alphacheck_core::domain::Finding;
use alphacheck_core::{Cell, CellFilter};

use super::{capped, qty, Rule, RuleContext, RuleError};

pub const NAME: &str = "Trade Direction Consistency";

pub struct TradeDirectionConsistency;

fn line(cell: &Cell) -> String {
    format!(
        "  {} {} at {}: intended={} actual={} (pos {} -> {})",
        cell.entity_id,
        cell.ticker,
        cell.time.label(),
        qty(cell.intended_trade),
        qty(cell.actual_trade),
        qty(cell.pos_t),
        qty(cell.pos_t1)
    )
}

impl Rule for TradeDirectionConsistency {
    fn name(&self) -> &str {
        NAME
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Finding, RuleError> {
        let eps = ctx.config.maintain_epsilon;
        let cells = ctx.fill_rate().cells(&CellFilter::all());

        let mut trades = 0usize;
        let mut buy_decreased = Vec::new();
        let mut sell_increased = Vec::new();
        for cell in cells.iter().filter(|c| c.pos_t_present) {
            if cell.intended_trade > eps {
                trades += 1;
                if cell.actual_trade < -eps {
                    buy_decreased.push(line(cell));
                }
            } else if cell.intended_trade < -eps {
                trades += 1;
                if cell.actual_trade > eps {
                    sell_increased.push(line(cell));
                }
            }
        }

        let violations = buy_decreased.len() + sell_increased.len();
        if violations == 0 {
            return Ok(Finding::pass(
                NAME,
                format!("All {trades} trades move the position in the intended direction"),
            ));
        }

        let mut details = Vec::new();
        if !buy_decreased.is_empty() {
            details.push(format!("BUY_DECREASED ({}):", buy_decreased.len()));
            details.extend(buy_decreased);
        }
        if !sell_increased.is_empty() {
            details.push(format!("SELL_INCREASED ({}):", sell_increased.len()));
            details.extend(sell_increased);
        }
        Ok(Finding::fail(
            NAME,
            format!("Found {violations} direction consistency violations out of {trades} total trades"),
        )
        .with_details(capped(details)))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use alphacheck_core::domain::Status;

    const T0: i64 = 93_000_000;
    const T1: i64 = 94_000_000;

    #[test]
    fn test_buy_that_sells_fails() {
        let f = run(
            &TradeDirectionConsistency,
            base()
                .split(vec![split("t1", T0, "AAA", 1500.0)])
                .positions(vec![pos("t1", T0, "AAA", 1000.0), pos("t1", T1, "AAA", 800.0)]),
        );
        assert_eq!(f.status, Status::Fail);
        assert_eq!(f.detail_lines[0], "BUY_DECREASED (1):");
    }

    #[test]
    fn test_partial_fill_in_direction_passes() {
        let f = run(
            &TradeDirectionConsistency,
            base()
                .split(vec![split("t1", T0, "AAA", 1500.0)])
                .positions(vec![pos("t1", T0, "AAA", 1000.0), pos("t1", T1, "AAA", 1400.0)]),
        );
        assert_eq!(f.status, Status::Pass);
    }

    #[test]
    fn test_cells_without_position_at_t_are_skipped() {
        // signal with no position at T: intended is measured from zero, not checked
        let f = run(
            &TradeDirectionConsistency,
            base()
                .split(vec![split("t1", T0, "AAA", 0.0)])
                .positions(vec![pos("t1", T1, "AAA", 500.0)]),
        );
        assert_eq!(f.status, Status::Pass);
        assert!(f.summary.starts_with("All 0 trades"));
    }

    #[test]
    fn test_late_fill_toward_standing_target_passes() {
        // GIVEN one target of 1000, filled 600 then the remaining 400 a step later
        let f = run(
            &TradeDirectionConsistency,
            base().split(vec![split("t1", T0, "AAA", 1000.0)]).positions(vec![
                pos("t1", T0, "AAA", 0.0),
                pos("t1", T1, "AAA", 600.0),
                pos("t1", 95_000_000, "AAA", 1000.0),
            ]),
        );

        // THEN the second buy is measured against the standing target, not a sell to zero
        assert_eq!(f.status, Status::Pass, "{:?}", f);
    }
}
