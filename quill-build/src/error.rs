//! Error types for quill-build.

use std::path::PathBuf;

use thiserror::Error;

use quill_core::MetadataError;
use quill_renderer::RenderError;

/// All errors that can arise from a render run.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Template parse or render failure, reported as the engine describes it.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Sidecar or creation-time failure.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`BuildError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> BuildError {
    BuildError::Io {
        path: path.into(),
        source,
    }
}
