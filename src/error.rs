//! Error taxonomy for the evaluation pipeline.
//!
//! Every failure class is fatal: the pipeline favors fail-fast over partial,
//! possibly-misleading benchmark output. Nothing here is downgraded to a
//! warning.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = EvalError> = std::result::Result<T, E>;

/// Errors produced by corpus assembly, benchmark runs, and report parsing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EvalError {
    /// No font file matched the documented probe patterns
    /// (`<prefix>-Regular.<ext>` + `<prefix>-Bold.<ext>`, or `<prefix>.<ext>`).
    #[error("font {family} not found")]
    FontNotFound {
        /// Family prefix the probes were derived from.
        family: String,
    },

    /// The optimizer child process exited with a non-zero code. Aborts the
    /// whole sweep; the code is surfaced to the caller unchanged.
    #[error("optimizer exited with code {code}")]
    OptimizerExit {
        /// Raw exit code (-1 if the process was terminated by a signal).
        code: i32,
    },

    /// The optimizer report did not match its documented line shapes.
    #[error("malformed optimizer report: {0}")]
    MalformedReport(String),

    /// A `unicode-range` declaration could not be parsed.
    #[error("malformed stylesheet: {0}")]
    MalformedStylesheet(String),

    /// Sweep results did not line up with the configured partition counts.
    #[error("aggregation error: {0}")]
    Aggregation(String),

    /// Rendered HTML could not be tokenized.
    #[error("markup error: {0}")]
    Markup(String),

    /// A piped child stream was not captured at spawn time.
    #[error("child process {0} stream was not captured")]
    StreamMissing(&'static str),

    /// A concurrent pipeline task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Archive or stylesheet fetch failed.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Documentation archive could not be read.
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    /// Manifest or chart serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Filesystem or child-process I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
