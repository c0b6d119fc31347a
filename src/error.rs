//! Error types for the trial-processing pipeline.
//!
//! Trial-level failures (bad files, signals below the noise floor) are
//! caught at the batch boundary, logged and skipped; configuration-class
//! failures surface immediately.

use thiserror::Error;

/// Main error type for trial processing.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// No input filename has been specified.
    #[error("no filename has been specified")]
    MissingFilename,

    /// A trial file could not be parsed.
    #[error("failed to parse {path} (line {line}): {detail}")]
    Parse {
        path: String,
        line: usize,
        detail: String,
    },

    /// An underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Signal amplitude is too close to the configured noise floor.
    #[error("signal too small: max amplitude {max} is within the noise floor {threshold}")]
    SignalTooSmall { max: f64, threshold: f64 },

    /// An unrecognized smoothing or rotation mode was requested.
    #[error("unknown mode: {0}")]
    UnknownMode(String),

    /// Companion arrays have incompatible lengths during frame correction.
    #[error("shape mismatch: {left} samples vs {right} companion entries")]
    ShapeMismatch { left: usize, right: usize },

    /// Timestamps and samples have mismatched lengths.
    #[error("length mismatch: {times} timestamps vs {samples} samples")]
    LengthMismatch { times: usize, samples: usize },

    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Interactive input could not be interpreted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No processable trial files were found.
    #[error("no processable trials were found")]
    NoTrials,
}

/// Result type alias for trial processing.
pub type Result<T> = std::result::Result<T, ProcessingError>;

impl ProcessingError {
    /// Create a parse error for a file location.
    #[must_use]
    pub fn parse(path: impl Into<String>, line: usize, detail: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            detail: detail.into(),
        }
    }

    /// Create a signal-too-small error.
    #[must_use]
    pub const fn signal_too_small(max: f64, threshold: f64) -> Self {
        Self::SignalTooSmall { max, threshold }
    }

    /// Create an unknown-mode error.
    #[must_use]
    pub fn unknown_mode(mode: impl Into<String>) -> Self {
        Self::UnknownMode(mode.into())
    }

    /// Create a shape mismatch error.
    #[must_use]
    pub const fn shape_mismatch(left: usize, right: usize) -> Self {
        Self::ShapeMismatch { left, right }
    }

    /// Create a length mismatch error.
    #[must_use]
    pub const fn length_mismatch(times: usize, samples: usize) -> Self {
        Self::LengthMismatch { times, samples }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
