//! # quill-renderer
//!
//! Tera-based rendering of a single input file with dependency tracking.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use quill_core::{FileTimeResolver, MetadataStore, DEFAULT_METADATA_FILE};
//! use quill_renderer::{Bindings, Renderer};
//!
//! fn render(infile: &Path) -> Result<String, Box<dyn std::error::Error>> {
//!     let data = MetadataStore::new(&FileTimeResolver).get(infile, DEFAULT_METADATA_FILE)?;
//!     let renderer = Renderer::for_input(infile)?;
//!     let text = renderer.render(&data, &Bindings::new())?;
//!     for dep in renderer.dependencies() {
//!         println!("depends on {}", dep.display());
//!     }
//!     Ok(text)
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod functions;
pub mod loader;

pub use context::{build_context, parse_literal, Bindings};
pub use engine::{Renderer, TemplateEngine};
pub use error::RenderError;
pub use loader::{DependencyLoader, DependencySet};
