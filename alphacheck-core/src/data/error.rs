//! Structured data errors.
//!
//! Displayable as-is by the CLI. A `DataError` raised while loading a mandatory
//! stream aborts the run before any rule executes; raised inside a rule it only
//! turns that rule's finding into ERROR.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{SignalKind, StreamKind};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("required stream '{0}' is missing")]
    MissingStream(StreamKind),

    #[error("{stream} data missing required column '{column}'")]
    MissingColumn { stream: StreamKind, column: String },

    #[error("{path}: line {line}: cannot parse {column} value '{value}'")]
    Parse {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },

    #[error("{stream} table cannot hold a {found:?} signal")]
    StreamMismatch { stream: StreamKind, found: SignalKind },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed delimited file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_message_names_stream_and_column() {
        let err = DataError::MissingColumn {
            stream: StreamKind::Position,
            column: "realtime_pos".into(),
        };
        assert_eq!(
            err.to_string(),
            "position data missing required column 'realtime_pos'"
        );
    }

    #[test]
    fn test_missing_stream_message() {
        let err = DataError::MissingStream(StreamKind::Split);
        assert_eq!(err.to_string(), "required stream 'split' is missing");
    }
}
