//! Plain-text console rendering with optional ANSI status colors.

use alphacheck_core::domain::{Finding, Status};

use crate::query::{CellBreakdown, Overview, TickerStats, TickerTimeline, TimeSlice};
use crate::rules::{qty, RuleReport};
use crate::run::DataSummary;

const RULE: &str = "============================================================";

pub struct ConsoleReporter {
    color: bool,
}

fn rate(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}

impl ConsoleReporter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, status: Status, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        let code = match status {
            Status::Pass => "\x1b[92m",
            Status::Warn => "\x1b[93m",
            Status::Fail | Status::Error => "\x1b[91m",
        };
        format!("{code}{text}\x1b[0m")
    }

    fn finding(&self, out: &mut String, finding: &Finding) {
        out.push_str(&format!(
            "[{}] {}\n    {}\n",
            self.paint(finding.status, finding.status.as_str()),
            finding.rule_name,
            finding.summary
        ));
        if !finding.detail_lines.is_empty() {
            out.push_str("    Details:\n");
            for line in finding.detail_lines.iter().filter(|l| !l.trim().is_empty()) {
                out.push_str(&format!("      {line}\n"));
            }
        }
        out.push('\n');
    }

    fn ticker_table(&self, out: &mut String, tickers: &[TickerStats]) {
        out.push_str("  ticker      mean    median  cells  analyzable  entities\n");
        for s in tickers {
            out.push_str(&format!(
                "  {:<10}  {:>6}  {:>6}  {:>5}  {:>10}  {:>8}\n",
                s.ticker.as_str(),
                rate(s.mean_fill_rate),
                rate(s.median_fill_rate),
                s.counts.total,
                s.counts.analyzable,
                s.entity_count
            ));
        }
    }

    pub fn render_report(&self, report: &RuleReport) -> String {
        let c = &report.counts;
        let mut out = format!("\n{RULE}\nALPHACHECK RESULTS\n{RULE}\n");
        out.push_str(&format!("Total Checks: {}\n", c.total));
        out.push_str(&format!("Passed: {}\n", self.paint(Status::Pass, &c.pass.to_string())));
        out.push_str(&format!("Failed: {}\n", self.paint(Status::Fail, &c.fail.to_string())));
        out.push_str(&format!("Warnings: {}\n", self.paint(Status::Warn, &c.warn.to_string())));
        out.push_str(&format!("Errors: {}\n\n", self.paint(Status::Error, &c.error.to_string())));

        for finding in &report.findings {
            self.finding(&mut out, finding);
        }

        let verdict = if report.has_critical() {
            self.paint(
                Status::Fail,
                &format!("ANALYSIS FAILED - {} critical issues", c.critical()),
            )
        } else if c.warn > 0 {
            self.paint(
                Status::Warn,
                &format!("ANALYSIS COMPLETED WITH WARNINGS - {} warnings", c.warn),
            )
        } else {
            self.paint(Status::Pass, "ALL CHECKS PASSED")
        };
        out.push_str(&verdict);
        out.push('\n');
        out
    }

    pub fn render_summary(&self, summary: &DataSummary) -> String {
        let mut out = format!(
            "Data Summary\n  fingerprint: {}\n  records: {}\n  first intraday time: {}\n  fill-rate series: {}\n",
            summary.fingerprint,
            summary.total_records,
            summary.first_intraday.as_deref().unwrap_or("n/a"),
            summary.series
        );
        out.push_str("  stream            present  records  times  tickers\n");
        for s in &summary.streams {
            out.push_str(&format!(
                "  {:<16}  {:<7}  {:>7}  {:>5}  {:>7}\n",
                s.stream.name(),
                if s.present { "yes" } else { "no" },
                s.records,
                s.distinct_times,
                s.distinct_tickers
            ));
        }
        out
    }

    pub fn render_overview(&self, overview: &Overview) -> String {
        let c = &overview.counts;
        let mut out = format!(
            "Fill Rate Overview\n  cells: {} over {} time events\n  analyzable: {}  maintain: {}  unexpected: {}\n  over-execution: {}  wrong direction: {}\n  mean fill rate: {}\n  median fill rate: {}\n",
            c.total,
            overview.time_events,
            c.analyzable,
            c.maintain,
            c.unexpected_trade,
            c.over_execution,
            c.wrong_direction,
            rate(overview.mean_fill_rate),
            rate(overview.median_fill_rate),
        );
        if let Some(best) = &overview.best_ticker {
            out.push_str(&format!("  best performer: {} ({:.3})\n", best.ticker, best.mean_fill_rate));
        }
        if let Some(worst) = &overview.worst_ticker {
            out.push_str(&format!("  worst performer: {} ({:.3})\n", worst.ticker, worst.mean_fill_rate));
        }
        out.push('\n');
        self.ticker_table(&mut out, &overview.tickers);
        out.push('\n');
        self.finding(&mut out, &overview.finding);
        out
    }

    pub fn render_time_slice(&self, slice: &TimeSlice) -> String {
        let mut out = format!(
            "Time Event {}\n  cells: {}  analyzable: {}\n  mean fill rate: {}\n  median fill rate: {}\n\n",
            slice.label,
            slice.counts.total,
            slice.counts.analyzable,
            rate(slice.mean_fill_rate),
            rate(slice.median_fill_rate),
        );
        self.ticker_table(&mut out, &slice.tickers);
        out.push('\n');
        self.finding(&mut out, &slice.finding);
        out
    }

    pub fn render_timeline(&self, timeline: &TickerTimeline) -> String {
        let mut out = format!(
            "Ticker Timeline {}\n  cells: {}  mean fill rate: {}\n\n",
            timeline.ticker,
            timeline.counts.total,
            rate(timeline.mean_fill_rate)
        );
        out.push_str("  time            mean    count  entities  non-analyzable\n");
        for p in &timeline.points {
            out.push_str(&format!(
                "  {:<14}  {:>6}  {:>5}  {:>8}  {:>14}\n",
                p.label,
                rate(p.mean_fill_rate),
                p.count,
                p.entity_count,
                p.non_analyzable
            ));
        }
        out.push('\n');
        self.finding(&mut out, &timeline.finding);
        out
    }

    pub fn render_breakdown(&self, cell: &CellBreakdown) -> String {
        let mut out = format!(
            "Cell {} {}\n  net fill rate: {} (actual {} / intended {})\n",
            cell.time.label(),
            cell.ticker,
            rate(cell.net_fill_rate),
            qty(cell.total_actual),
            qty(cell.total_intended)
        );
        if let Some(m) = &cell.market {
            out.push_str(&format!(
                "  last {:.2}  prev close {:.2}  change {}  intended notional {:.2}\n",
                m.last_price,
                m.prev_close_price,
                m.change_pct.map_or_else(|| "n/a".to_string(), |p| format!("{p:+.2}%")),
                m.intended_notional
            ));
        }
        out.push_str("\n  entity      target    pos_t   pos_t1  intended   actual  fill_rate  outcome\n");
        for r in &cell.rows {
            out.push_str(&format!(
                "  {:<10}  {:>6}  {:>7}  {:>7}  {:>8}  {:>7}  {:>9}  {:?}{}\n",
                r.entity_id.as_str(),
                if r.signal_present { qty(r.target) } else { "-".to_string() },
                if r.pos_t_present { qty(r.pos_t) } else { "-".to_string() },
                qty(r.pos_t1),
                qty(r.intended_trade),
                qty(r.actual_trade),
                rate(r.fill_rate),
                r.outcome,
                r.anomaly.map_or_else(String::new, |a| format!(" {a:?}"))
            ));
        }
        out.push('\n');
        self.finding(&mut out, &cell.finding);
        out
    }
}
