//! JSON export for check reports and query views.
//!
//! The check artifact carries a `schema_version`; unknown future versions are
//! rejected on load.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use alphacheck_core::AnalysisConfig;

use crate::rules::RuleReport;

/// Current schema version for persisted check artifacts.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// A rule report bound to the data and config it was produced from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckArtifact {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub fingerprint: String,
    pub config: AnalysisConfig,
    pub report: RuleReport,
}

impl CheckArtifact {
    pub fn new(fingerprint: String, config: AnalysisConfig, report: RuleReport) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            fingerprint,
            config,
            report,
        }
    }
}

/// Pretty JSON for any report or view.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize report to JSON")
}

/// Deserialize a check artifact, rejecting unknown schema versions.
pub fn import_artifact(json: &str) -> Result<CheckArtifact> {
    let artifact: CheckArtifact =
        serde_json::from_str(json).context("failed to deserialize check artifact")?;
    if artifact.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            artifact.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(artifact)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = to_json(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
