//! Metadata sidecar: per-directory cache of estimated creation times.
//!
//! # Storage layout
//!
//! ```text
//! <dir>/
//!   page.html
//!   .metadata.json   { "page.html": { "created": 1700000000 }, ... }
//! ```
//!
//! The document is read-modify-written without locking; concurrent renders
//! against one directory may lose an update (last writer wins). Writes go
//! through `<path>.tmp` + rename so readers never see a torn document.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::{Map, Value};

use crate::error::{io_err, MetadataError};
use crate::resolver::CreationTimeResolver;
use crate::types::{MetadataEntry, RenderContext};

/// Default sidecar file name.
pub const DEFAULT_METADATA_FILE: &str = ".metadata.json";

/// Parsed sidecar: base name → raw entry. Entries other than the one being
/// rendered are never interpreted, so they round-trip as-is.
pub type SidecarDocument = Map<String, Value>;

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `dirname(infile)/<metadata_name>`, without touching the filesystem.
pub fn sidecar_path(infile: &Path, metadata_name: &str) -> PathBuf {
    infile
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(metadata_name)
}

fn base_name(infile: &Path) -> Result<String, MetadataError> {
    infile
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            io_err(
                infile,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })
}

/// `page.html` → `page`.
pub fn stem_name(infile: &Path) -> String {
    infile
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// 2. Load / save
// ---------------------------------------------------------------------------

/// Load the sidecar at `path`; an absent file is an empty document.
///
/// Malformed JSON is [`MetadataError::Parse`]. There is no silent reset:
/// discarding the document would lose historical creation times.
pub fn load(path: &Path) -> Result<SidecarDocument, MetadataError> {
    if !path.exists() {
        return Ok(SidecarDocument::new());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&contents).map_err(|source| MetadataError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Save the sidecar atomically, creating parent directories as needed.
pub fn save(path: &Path, doc: &SidecarDocument) -> Result<(), MetadataError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let json = serde_json::to_string_pretty(doc)?;
    let tmp = tmp_path(path);
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

// ---------------------------------------------------------------------------
// 3. MetadataStore
// ---------------------------------------------------------------------------

/// Reads and backfills sidecar entries.
pub struct MetadataStore<'a> {
    resolver: &'a dyn CreationTimeResolver,
}

impl<'a> MetadataStore<'a> {
    pub fn new(resolver: &'a dyn CreationTimeResolver) -> Self {
        Self { resolver }
    }

    /// Cached entry for `infile`, backfilling `created` if needed.
    ///
    /// The sidecar is rewritten only when `created` had to be resolved; an
    /// entry with a truthy `created` never reaches the resolver.
    pub fn entry(&self, infile: &Path, metadata_name: &str) -> Result<MetadataEntry, MetadataError> {
        let name = base_name(infile)?;
        let path = sidecar_path(infile, metadata_name);
        let mut doc = load(&path)?;

        let loaded = doc.get(&name).cloned();
        let mut entry: MetadataEntry = match &loaded {
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|source| MetadataError::Entry {
                    path: path.clone(),
                    name: name.clone(),
                    source,
                })?
            }
            None => MetadataEntry::default(),
        };

        if entry.has_created() {
            tracing::debug!("metadata for '{}' is up to date", infile.display());
            return Ok(entry);
        }

        tracing::debug!("getting creation date of {}", infile.display());
        let created = self.resolver.resolve(infile)?;
        tracing::debug!(
            "creation date of {} is estimated to be {}",
            infile.display(),
            crate::types::local_from_epoch(created)
                .map(|dt| crate::types::format_datetime(&dt))
                .unwrap_or_else(|| created.to_string())
        );
        entry.created = Some(created);

        // Only `created` is replaced; the rest of the stored entry is kept as written.
        let mut stored = match loaded {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        stored.insert("created".to_string(), Value::from(created));
        doc.insert(name, Value::Object(stored));

        tracing::info!(
            "updating metadata '{}' for '{}'",
            path.display(),
            infile.display()
        );
        save(&path, &doc)?;

        Ok(entry)
    }

    /// Render context for `infile`: cached entry plus live timestamps.
    pub fn get(&self, infile: &Path, metadata_name: &str) -> Result<RenderContext, MetadataError> {
        let entry = self.entry(infile, metadata_name)?;
        let modified = std::fs::metadata(infile)
            .and_then(|m| m.modified())
            .map_err(|e| io_err(infile, e))?;
        RenderContext::build(stem_name(infile), &entry, modified, Local::now())
    }
}
