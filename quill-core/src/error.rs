//! Error types for quill-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while estimating a file's creation time.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The estimator process could not be started or awaited.
    #[error("failed to run creation-time estimator `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The estimator printed something that is not an integer on stdout.
    #[error("creation-time estimator returned {output:?} for {path}, expected epoch seconds")]
    Malformed { path: PathBuf, output: String },

    /// Filesystem stat failed.
    #[error("cannot stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// All errors that can arise from metadata sidecar operations.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Underlying I/O failure, with the path that caused it.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The sidecar exists but is not a JSON object. Never reset silently.
    #[error("failed to parse metadata sidecar at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An entry for the rendered file exists but has the wrong shape.
    #[error("invalid metadata entry '{name}' in {path}: {source}")]
    Entry {
        path: PathBuf,
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error (write path).
    #[error("metadata JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The creation-time estimator failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A cached epoch value cannot be represented as a local datetime.
    #[error("timestamp {0} is out of range")]
    Timestamp(i64),
}

/// Convenience constructor for [`MetadataError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> MetadataError {
    MetadataError::Io {
        path: path.into(),
        source,
    }
}
