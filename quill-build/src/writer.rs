//! Output writer and dependency manifest.
//!
//! ## `write_output`
//!
//! 1. Skip everything in dry-run mode.
//! 2. Ensure the parent directory exists.
//! 3. Write to `<path>.quill.tmp`.
//! 4. Rename to the final path, replacing any existing file.
//!
//! ## Manifest shape
//!
//! ```text
//! <target>: \
//!   <dep1> \
//!   <dep2>
//! ```

use std::path::{Path, PathBuf};

use quill_renderer::DependencySet;

use crate::error::{io_err, BuildError};

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of writing a rendered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written.
    Written { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path } | WriteResult::WouldWrite { path } => path,
        }
    }
}

// ---------------------------------------------------------------------------
// write_output
// ---------------------------------------------------------------------------

/// Write `content` to `path`, fully replacing any previous render.
pub fn write_output(path: &Path, content: &str, dry_run: bool) -> Result<WriteResult, BuildError> {
    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    create_parent(path)?;
    let tmp = tmp_path(path);
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;

    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

/// `<path>.quill.tmp`, next to the output so the rename stays on one filesystem.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".quill.tmp");
    PathBuf::from(name)
}

fn create_parent(path: &Path) -> Result<(), BuildError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Dependency manifest
// ---------------------------------------------------------------------------

/// Makefile rule text for `target` depending on `deps`, in set order.
pub fn format_manifest(target: &str, deps: &DependencySet) -> String {
    let lines: Vec<String> = deps
        .iter()
        .map(|dep| format!("  {}", dep.display()))
        .collect();
    format!("{target}: \\\n{}\n", lines.join(" \\\n"))
}

/// Write the manifest for `target` to `manifest_path`, creating its directory.
pub fn write_manifest(
    manifest_path: &Path,
    target: &str,
    deps: &DependencySet,
) -> Result<(), BuildError> {
    create_parent(manifest_path)?;
    std::fs::write(manifest_path, format_manifest(target, deps))
        .map_err(|e| io_err(manifest_path, e))?;
    tracing::info!(
        "wrote dependency manifest: {} ({} entries)",
        manifest_path.display(),
        deps.len()
    );
    Ok(())
}
