//! Error types for rustcal-core.

use thiserror::Error;

/// Result type alias for rustcal operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for rustcal operations.
///
/// Configuration errors are fatal at startup and surface to the caller.
/// Data errors describe recoverable input problems: the offending hit or
/// record is skipped and counted, the event continues.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration parameter.
    #[error("invalid configuration: {parameter} = {value} ({reason})")]
    Config {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Value that failed validation.
        value: f64,
        /// Why the value was rejected.
        reason: &'static str,
    },

    /// Malformed or inconsistent input data.
    #[error("data error: {0}")]
    Data(String),

    /// Truth cluster references a hit id absent from the store.
    #[error("truth cluster {cluster} references unknown hit id {hit}")]
    MissingHit {
        /// Truth cluster id.
        cluster: u64,
        /// Referenced hit id not present in the store.
        hit: u64,
    },
}
