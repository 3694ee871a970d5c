//! Console rendering and JSON export.

pub mod console;
pub mod export;

pub use console::ConsoleReporter;
pub use export::{import_artifact, to_json, write_json, CheckArtifact, SCHEMA_VERSION};
