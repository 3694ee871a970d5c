//! alphacheck core: event streams, join index and fill-rate engine.
//!
//! This crate holds the pure, I/O-free heart of the reconciliation engine plus
//! the loader that feeds it:
//! - Domain types (signals, positions, market context, findings)
//! - Columnar event store with a load-time precondition check
//! - Join index: point lookups and per-(entity, ticker) timelines
//! - Fill-rate engine under target-position semantics
//! - Analysis configuration (TOML)
//! - Pipe-delimited file loader

pub mod config;
pub mod data;
pub mod domain;
pub mod fill_rate;
pub mod index;
pub mod store;

pub use config::{AnalysisConfig, ConfigError};
pub use data::DataError;
pub use fill_rate::{Anomaly, Cell, CellFilter, FillOutcome, FillRateEngine};
pub use index::JoinIndex;
pub use store::EventStore;
