//! Error taxonomy for the batch pipeline
//!
//! Configuration errors are fatal to the whole run: nothing partial is
//! produced. Engine faults are contained per job by the runner and only
//! surface in the report's error section. Plot and segdb errors are fatal
//! because the summary page is useless without them.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or cross-checking configuration tables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file contained no data lines at all (only blanks and comments).
    #[error("configuration file is empty: {0}")]
    EmptyConfiguration(PathBuf),

    /// A data line had fewer fields than its schema requires.
    #[error("malformed row {row} in {path}: expected {expected} fields, found {found}")]
    MalformedRow {
        path: PathBuf,
        /// Zero-based index among data rows (blanks and comments not counted).
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A field could not be parsed into the type the engine request needs.
    #[error("row {row}, channel {channel}: invalid {field} value {value:?}")]
    InvalidField {
        row: usize,
        channel: String,
        field: &'static str,
        value: String,
    },

    /// Time- and frequency-domain tables must pair up row by row.
    #[error("time/frequency configurations misaligned: {0}")]
    DomainMisalignment(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Faults from one invocation of the external analysis engine.
///
/// These never abort the batch; the runner converts them into a
/// `PROCESSINGERROR` outcome and an error-log entry.
#[derive(Debug, Error)]
pub enum EngineFault {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// The per-job timeout budget elapsed and the engine was killed.
    #[error("engine exceeded the {0}s job timeout")]
    TimedOut(u64),

    /// The engine succeeded but printed no result location.
    #[error("engine produced no result location")]
    NoLocation,

    #[error("i/o while talking to the engine: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the segment-database query service or segment list files.
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("segment database query failed: {0}")]
    Query(#[from] reqwest::Error),

    #[error("cannot read segment list {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("bad segment entry on line {line} of {path}")]
    BadEntry { path: PathBuf, line: usize },
}

/// Errors from the timeline renderer.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("plot backend error: {0}")]
    Backend(String),
}
