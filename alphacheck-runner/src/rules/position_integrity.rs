use alphacheck_core::domain::Finding;

use super::{capped, qty, Rule, RuleContext, RuleError};

pub const NAME: &str = "Position Integrity";

/// `realtime_pos == long - short` on every trader row, and no net short
/// position when the market forbids it.
pub struct PositionIntegrity;

impl Rule for PositionIntegrity {
    fn name(&self) -> &str {
        NAME
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Finding, RuleError> {
        let tol = ctx.config.tolerance;
        let positions = ctx.store.positions();

        let mut identity = Vec::new();
        let mut short = Vec::new();
        for r in positions.rows() {
            let net = r.long - r.short;
            if (r.pos - net).abs() > tol {
                identity.push(format!(
                    "{} {} at {}: pos={} long={} short={}",
                    r.entity,
                    r.ticker,
                    r.time.label(),
                    qty(r.pos),
                    qty(r.long),
                    qty(r.short)
                ));
            }
            if ctx.config.forbid_short_positions && r.pos < -tol {
                short.push(format!(
                    "{} {} at {}: pos={}",
                    r.entity,
                    r.ticker,
                    r.time.label(),
                    qty(r.pos)
                ));
            }
        }

        if identity.is_empty() && short.is_empty() {
            return Ok(Finding::pass(
                NAME,
                format!("All {} position records are internally consistent", positions.len()),
            ));
        }
        let summary = format!(
            "Found {} long/short identity breaks and {} negative positions",
            identity.len(),
            short.len()
        );
        let mut details = Vec::with_capacity(identity.len() + short.len() + 2);
        if !identity.is_empty() {
            details.push("pos != long - short:".to_string());
            details.extend(identity);
        }
        if !short.is_empty() {
            details.push("negative position:".to_string());
            details.extend(short);
        }
        Ok(Finding::fail(NAME, summary).with_details(capped(details)))
    }
}
