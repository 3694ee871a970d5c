//! Event file loading.

pub mod error;
pub mod ingest;

pub use error::DataError;
pub use ingest::load_dir;
