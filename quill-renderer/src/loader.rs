//! Template source resolution with dependency recording.
//!
//! A [`DependencyLoader`] searches an ordered list of directories for a
//! template name and records the absolute path of every file it hands out.
//! Clones share one [`DependencySet`], so capability functions registered
//! with the engine can add the files they read to the same set.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{io_err, RenderError};

/// Absolute paths consulted during one render. Ordered for stable output.
pub type DependencySet = BTreeSet<PathBuf>;

/// A resolved template source.
#[derive(Debug, Clone)]
pub struct LoadedTemplate {
    /// Name the template was requested by.
    pub name: String,
    /// Absolute path of the file it was read from.
    pub path: PathBuf,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct DependencyLoader {
    search_dirs: Vec<PathBuf>,
    deps: Arc<Mutex<DependencySet>>,
}

impl DependencyLoader {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            deps: Arc::new(Mutex::new(DependencySet::new())),
        }
    }

    /// Loader for rendering `infile`: its directory, `<dir>/templates`, then
    /// `templates` relative to the working directory.
    pub fn for_input(infile: &Path) -> Self {
        let indir = input_dir(infile);
        Self::new(vec![
            indir.clone(),
            indir.join("templates"),
            PathBuf::from("templates"),
        ])
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// First existing file for `name`, without recording it.
    ///
    /// Names that climb out of a search directory (`..`) never resolve.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        let relative = split_template_name(name)?;
        self.search_dirs
            .iter()
            .map(|dir| dir.join(&relative))
            .find(|candidate| candidate.is_file())
    }

    /// Resolve and read `name`, recording its absolute path.
    ///
    /// `Ok(None)` when no search directory contains it.
    pub fn load(&self, name: &str) -> Result<Option<LoadedTemplate>, RenderError> {
        let Some(found) = self.find(name) else {
            tracing::debug!(template = name, "not found in search path");
            return Ok(None);
        };
        let source = std::fs::read_to_string(&found).map_err(|e| io_err(&found, e))?;
        let path = absolutize(&found);
        tracing::debug!(template = name, path = %path.display(), "loaded template");
        self.add_dependency(&path);
        Ok(Some(LoadedTemplate {
            name: name.to_string(),
            path,
            source,
        }))
    }

    /// Record a non-template file consulted during rendering.
    pub fn add_dependency(&self, path: impl AsRef<Path>) {
        let path = absolutize(path.as_ref());
        self.deps
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path);
    }

    /// Snapshot of everything recorded so far.
    pub fn dependencies(&self) -> DependencySet {
        self.deps
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Directory containing `infile`; `.` for a bare file name.
pub fn input_dir(infile: &Path) -> PathBuf {
    match infile.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Canonical path when the file exists, otherwise made absolute lexically.
pub fn absolutize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// `a/./b` → `a/b`; leading separators dropped; `None` on `..`.
fn split_template_name(name: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => return None,
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}
