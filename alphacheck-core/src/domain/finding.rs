//! Result model shared by rules and query views.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a rule or analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Pass,
    Warn,
    Fail,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
            Status::Error => "ERROR",
        }
    }

    /// FAIL and ERROR make a run unsuccessful; WARN does not.
    pub fn is_critical(self) -> bool {
        matches!(self, Status::Fail | Status::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A terminal, behaviour-free result record. Safe to serialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_name: String,
    pub status: Status,
    pub summary: String,
    pub detail_lines: Vec<String>,
}

impl Finding {
    pub fn new(rule_name: impl Into<String>, status: Status, summary: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            status,
            summary: summary.into(),
            detail_lines: Vec::new(),
        }
    }

    pub fn pass(rule_name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self::new(rule_name, Status::Pass, summary)
    }

    pub fn warn(rule_name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self::new(rule_name, Status::Warn, summary)
    }

    pub fn fail(rule_name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self::new(rule_name, Status::Fail, summary)
    }

    pub fn error(rule_name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self::new(rule_name, Status::Error, summary)
    }

    pub fn with_details(mut self, lines: Vec<String>) -> Self {
        self.detail_lines = lines;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_severity_ordering() {
        assert!(Status::Pass < Status::Warn);
        assert!(Status::Warn < Status::Fail);
        assert!(Status::Fail < Status::Error);
    }

    #[test]
    fn test_only_fail_and_error_are_critical() {
        assert!(!Status::Pass.is_critical());
        assert!(!Status::Warn.is_critical());
        assert!(Status::Fail.is_critical());
        assert!(Status::Error.is_critical());
    }

    #[test]
    fn test_finding_serializes_status_uppercase() {
        let f = Finding::fail("Non-Negative Split Target", "1 negative")
            .with_details(vec!["t1 AAA 93000000".into()]);
        let json = serde_json::to_string(&f).unwrap();
        assert!(json.contains("\"status\":\"FAIL\""));
        assert!(json.contains("t1 AAA 93000000"));
    }
}
