//! Creation-time estimation.
//!
//! The metadata store only needs `resolve(path) -> epoch seconds`. Two stock
//! implementations exist:
//!
//! - [`CommandResolver`] runs an external estimator (typically a script that
//!   consults version-control history) with the file path as last argument.
//! - [`FileTimeResolver`] stats the file: birth time where the platform
//!   reports one, modification time otherwise.
//!
//! Closures `Fn(&Path) -> Result<i64, ResolveError>` also implement the trait.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ResolveError;

/// Estimates when a file was first created.
pub trait CreationTimeResolver {
    /// Epoch seconds for `path`.
    fn resolve(&self, path: &Path) -> Result<i64, ResolveError>;
}

impl<F> CreationTimeResolver for F
where
    F: Fn(&Path) -> Result<i64, ResolveError>,
{
    fn resolve(&self, path: &Path) -> Result<i64, ResolveError> {
        self(path)
    }
}

// ---------------------------------------------------------------------------
// CommandResolver
// ---------------------------------------------------------------------------

/// Runs `<program> [args...] <path>` and parses stdout as epoch seconds.
///
/// Anything on stderr is logged as a warning and otherwise ignored; only a
/// non-integer stdout fails the call. The exit status is not consulted.
#[derive(Debug, Clone)]
pub struct CommandResolver {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandResolver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before the file path.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl CreationTimeResolver for CommandResolver {
    fn resolve(&self, path: &Path) -> Result<i64, ResolveError> {
        tracing::debug!(
            program = %self.program.display(),
            path = %path.display(),
            "running creation-time estimator"
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| ResolveError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let diagnostics = String::from_utf8_lossy(&output.stderr);
        if !diagnostics.trim().is_empty() {
            tracing::warn!(path = %path.display(), "{}", diagnostics.trim_end());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .trim()
            .parse::<i64>()
            .map_err(|_| ResolveError::Malformed {
                path: path.to_path_buf(),
                output: stdout.trim().to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// FileTimeResolver
// ---------------------------------------------------------------------------

/// Filesystem-stat estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTimeResolver;

impl CreationTimeResolver for FileTimeResolver {
    fn resolve(&self, path: &Path) -> Result<i64, ResolveError> {
        let stat_err = |source| ResolveError::Stat {
            path: path.to_path_buf(),
            source,
        };
        let meta = std::fs::metadata(path).map_err(stat_err)?;
        let time = meta
            .created()
            .or_else(|_| meta.modified())
            .map_err(stat_err)?;
        Ok(epoch_seconds(time))
    }
}

fn epoch_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}
