//! Error types for quill-renderer.

use std::error::Error as StdError;
use std::path::PathBuf;

use tera::ErrorKind;
use thiserror::Error;

/// All errors that can arise from template loading and rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A template could not be parsed.
    #[error(
        "There was an error while parsing {}@{}:\n\n\t{source_text}\n{message}",
        .path.display(),
        .line.map_or_else(|| "?".to_string(), |l| l.to_string())
    )]
    Syntax {
        path: PathBuf,
        line: Option<usize>,
        /// Raw text of the offending file.
        source_text: String,
        message: String,
    },

    /// Any other failure raised by the engine while rendering.
    #[error("{kind}: {message}")]
    Template { kind: String, message: String },

    /// The top-level template is not present in any search directory.
    #[error("template '{name}' not found in {}", display_dirs(.searched))]
    TemplateNotFound { name: String, searched: Vec<PathBuf> },

    /// Filesystem error while reading a template.
    #[error("template io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.into(),
        source,
    }
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// tera::Error conversion
// ---------------------------------------------------------------------------

impl RenderError {
    /// Flatten a render-time engine error into [`RenderError::Template`].
    pub(crate) fn from_tera(err: &tera::Error) -> Self {
        let mut kind = None;
        let mut messages = vec![err.to_string()];
        if !matches!(err.kind, ErrorKind::Msg(_)) {
            kind = Some(kind_name(&err.kind));
        }

        let mut current: Option<&(dyn StdError + 'static)> = err.source();
        while let Some(cause) = current {
            if let Some(tera_err) = cause.downcast_ref::<tera::Error>() {
                if kind.is_none() && !matches!(tera_err.kind, ErrorKind::Msg(_)) {
                    kind = Some(kind_name(&tera_err.kind));
                }
            }
            messages.push(cause.to_string());
            current = cause.source();
        }

        RenderError::Template {
            kind: kind.unwrap_or("TemplateError").to_string(),
            message: messages.join(": "),
        }
    }
}

fn kind_name(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Msg(_) => "TemplateError",
        ErrorKind::CircularExtend { .. } => "CircularExtend",
        ErrorKind::MissingParent { .. } => "MissingParent",
        ErrorKind::TemplateNotFound(_) => "TemplateNotFound",
        ErrorKind::FilterNotFound(_) => "FilterNotFound",
        ErrorKind::TestNotFound(_) => "TestNotFound",
        ErrorKind::FunctionNotFound(_) => "FunctionNotFound",
        ErrorKind::InvalidMacroDefinition(_) => "InvalidMacroDefinition",
        ErrorKind::Json(_) => "Json",
        ErrorKind::CallFunction(_) => "CallFunction",
        ErrorKind::CallFilter(_) => "CallFilter",
        ErrorKind::CallTest(_) => "CallTest",
        _ => "TemplateError",
    }
}

/// Line number from a parser message (` --> 3:7`).
pub(crate) fn parse_error_line(message: &str) -> Option<usize> {
    let (_, rest) = message.split_once("--> ")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Full message of a parse error, including its causes.
pub(crate) fn chain_message(err: &tera::Error) -> String {
    let mut messages = vec![err.to_string()];
    let mut current = err.source();
    while let Some(cause) = current {
        messages.push(cause.to_string());
        current = cause.source();
    }
    messages.join("\n")
}
