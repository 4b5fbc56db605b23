//! # quill-build
//!
//! Render pipeline and on-disk artifacts.
//!
//! Call [`pipeline::render`] to render one input file (metadata sidecar,
//! template, output write) and [`writer::write_manifest`] to turn the returned
//! dependency set into a Makefile prerequisite rule.

pub mod error;
pub mod pipeline;
pub mod writer;

pub use error::BuildError;
pub use pipeline::{default_output_path, render, RenderOutcome, RenderRequest};
pub use writer::{format_manifest, write_manifest, write_output, WriteResult};
