//! Analysis configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! tolerance = 1e-6
//! lot_size = 100
//! maintain_epsilon = 1e-6
//! fill_rate_anomaly_threshold = 1.0
//! forbid_short_positions = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("parse config TOML: {0}")]
    Parse(String),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Absolute tolerance for sum-consistency checks.
    pub tolerance: f64,
    /// Trade volumes must be whole multiples of this lot.
    pub lot_size: u64,
    /// `|intended_trade|` at or below this is treated as zero (maintain).
    pub maintain_epsilon: f64,
    /// Fill rates above this are flagged as over-execution.
    pub fill_rate_anomaly_threshold: f64,
    /// Enforce `realtime_pos >= 0` (no-short-selling markets).
    pub forbid_short_positions: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            lot_size: 100,
            maintain_epsilon: 1e-6,
            fill_rate_anomaly_threshold: 1.0,
            forbid_short_positions: true,
        }
    }
}

impl AnalysisConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lot_size == 0 {
            return Err(ConfigError::Invalid {
                field: "lot_size",
                reason: "must be at least 1".into(),
            });
        }
        for (field, value) in [
            ("tolerance", self.tolerance),
            ("maintain_epsilon", self.maintain_epsilon),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a finite non-negative number, got {value}"),
                });
            }
        }
        if !self.fill_rate_anomaly_threshold.is_finite() || self.fill_rate_anomaly_threshold <= 0.0
        {
            return Err(ConfigError::Invalid {
                field: "fill_rate_anomaly_threshold",
                reason: format!(
                    "must be a finite positive number, got {}",
                    self.fill_rate_anomaly_threshold
                ),
            });
        }
        Ok(())
    }

    pub fn lot(&self) -> f64 {
        self.lot_size as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = AnalysisConfig::from_toml("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.lot_size, 100);
        assert_eq!(config.tolerance, 1e-6);
    }

    #[test]
    fn test_partial_override() {
        let config = AnalysisConfig::from_toml("lot_size = 50\nfill_rate_anomaly_threshold = 1.2").unwrap();
        assert_eq!(config.lot_size, 50);
        assert_eq!(config.fill_rate_anomaly_threshold, 1.2);
        assert_eq!(config.maintain_epsilon, 1e-6);
    }

    #[test]
    fn test_zero_lot_rejected() {
        let err = AnalysisConfig::from_toml("lot_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "lot_size", .. }));
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let err = AnalysisConfig::from_toml("tolerance = -0.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "tolerance", .. }));
    }

    #[test]
    fn test_unknown_key_rejected() {
        // Generator knobs (pm_count, tvr factors) have no business here.
        assert!(AnalysisConfig::from_toml("pm_count = 3").is_err());
    }

    #[test]
    fn test_from_file_missing_path() {
        let err = AnalysisConfig::from_file(Path::new("/nonexistent/alphacheck.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
