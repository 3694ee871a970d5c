use std::collections::BTreeSet;

use alphacheck_core::domain::Finding;

use super::{capped, qty, Rule, RuleContext, RuleError};

pub const NAME: &str = "Non-Negative Split Target";

/// Split targets are long-only positions; zero is a legal close.
pub struct NonNegativeSplitTarget;

impl Rule for NonNegativeSplitTarget {
    fn name(&self) -> &str {
        NAME
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Finding, RuleError> {
        let split = ctx.store.split();
        let mut times = BTreeSet::new();
        let mut negative_times = BTreeSet::new();
        let mut lines = Vec::new();

        for r in split.rows() {
            times.insert(r.time);
            if r.target < 0.0 {
                negative_times.insert(r.time);
                lines.push(format!(
                    "{} {} at {}: target={}",
                    r.entity,
                    r.ticker,
                    r.time.label(),
                    qty(r.target)
                ));
            }
        }

        if lines.is_empty() {
            return Ok(Finding::pass(
                NAME,
                format!(
                    "All {} split targets are non-negative across {} time events",
                    split.len(),
                    times.len()
                ),
            ));
        }
        Ok(Finding::fail(
            NAME,
            format!(
                "Found {} negative split targets across {} time events",
                lines.len(),
                negative_times.len()
            ),
        )
        .with_details(capped(lines)))
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use alphacheck_core::domain::Status;

    #[test]
    fn test_negative_target_fails() {
        let f = run(
            &NonNegativeSplitTarget,
            base().split(vec![split("t1", 93_000_000, "AAA", -100.0)]),
        );
        assert_eq!(f.status, Status::Fail);
        assert_eq!(f.detail_lines, vec!["t1 AAA at 09:30:00.000: target=-100"]);
    }

    #[test]
    fn test_zero_target_passes() {
        let f = run(
            &NonNegativeSplitTarget,
            base().split(vec![split("t1", 93_000_000, "AAA", 0.0)]),
        );
        assert_eq!(f.status, Status::Pass);
    }
}
