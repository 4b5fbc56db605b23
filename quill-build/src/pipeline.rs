//! Render pipeline: the single entrypoint used by the CLI.
//!
//! 1. Metadata: load / backfill the sidecar entry (written even in dry-run).
//! 2. Renderer: search path rooted at the input, capabilities registered.
//! 3. Render against metadata + bindings; append one `\n`.
//! 4. Write the output unless dry-run.
//! 5. Hand back the dependency set.

use std::path::{Path, PathBuf};

use quill_core::{CreationTimeResolver, MetadataStore, DEFAULT_METADATA_FILE};
use quill_renderer::{Bindings, DependencySet, Renderer};

use crate::error::BuildError;
use crate::writer::{write_output, WriteResult};

/// Inputs for one render.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub infile: PathBuf,
    pub outfile: PathBuf,
    /// Sidecar file name, resolved in the input's directory.
    pub metadata_name: String,
    pub bindings: Bindings,
    pub dry_run: bool,
}

impl RenderRequest {
    /// Request with default output path and sidecar name, no bindings.
    pub fn new(infile: impl Into<PathBuf>) -> Self {
        let infile = infile.into();
        RenderRequest {
            outfile: default_output_path(&infile),
            infile,
            metadata_name: DEFAULT_METADATA_FILE.to_string(),
            bindings: Bindings::new(),
            dry_run: false,
        }
    }
}

/// Outcome of a render.
#[derive(Debug)]
pub struct RenderOutcome {
    /// Final text, including the appended newline.
    pub rendered: String,
    pub write: WriteResult,
    pub dependencies: DependencySet,
}

/// `dir/page.html` → `dir/page-render.html`.
pub fn default_output_path(infile: &Path) -> PathBuf {
    let stem = infile
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match infile.extension() {
        Some(ext) => format!("{stem}-render.{}", ext.to_string_lossy()),
        None => format!("{stem}-render"),
    };
    infile.with_file_name(name)
}

/// Render `request.infile` into `request.outfile`.
///
/// Any failure aborts the run. A sidecar update made before a template
/// failure is kept; nothing else is written.
pub fn render(
    request: &RenderRequest,
    resolver: &dyn CreationTimeResolver,
) -> Result<RenderOutcome, BuildError> {
    let data = MetadataStore::new(resolver).get(&request.infile, &request.metadata_name)?;

    let renderer = Renderer::for_input(&request.infile)?;
    let mut rendered = renderer.render(&data, &request.bindings)?;
    rendered.push('\n');

    let write = write_output(&request.outfile, &rendered, request.dry_run)?;
    let dependencies = renderer.dependencies();
    tracing::debug!(count = dependencies.len(), "collected dependencies");

    Ok(RenderOutcome {
        rendered,
        write,
        dependencies,
    })
}
