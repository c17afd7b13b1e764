//! Domain errors raised by the parse → aggregate → series pipeline.
//!
//! Everything except `UnrecognizedIdentity` is fatal: the binary prints the
//! cause and exits without writing a chart.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A line sequence that cannot describe a benchmark run.
    #[error("malformed log at {path}:{line}: {reason}")]
    MalformedLog {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("no samples observed for key {key}")]
    EmptyBucket { key: String },

    #[error("geometric mean of bucket {key} is undefined for non-positive sample {value}")]
    NonPositiveSample { key: String, value: f64 },

    #[error("{source_id}:{line}: record has no {dimension} to key on")]
    MissingDimension {
        source_id: String,
        line: usize,
        dimension: &'static str,
    },

    /// Runs averaged into one line were taken under different parameters.
    #[error(
        "{identity}: runs at {first} and {second} differ in workload mix or max_key and cannot be averaged"
    )]
    MixedConfigurations {
        identity: String,
        first: String,
        second: String,
    },

    #[error("series {identity} has {actual} values but the x axis declares {expected}")]
    MisalignedSeries {
        identity: String,
        expected: usize,
        actual: usize,
    },

    #[error("{number} is not an exact multiple of {base} at every magnitude")]
    NonExactMagnitude { number: u64, base: u64 },

    #[error("no classification rule matches {identity:?}")]
    UnrecognizedIdentity { identity: String },

    #[error("missing configuration: {field} is empty")]
    MissingConfiguration { field: &'static str },

    #[error("configuration mismatch: {0}")]
    InconsistentConfiguration(String),
}
