//! Quill core library: sidecar metadata, creation-time estimation, errors.
//!
//! - [`types`]: [`MetadataEntry`] and the per-render [`RenderContext`]
//! - [`resolver`]: [`CreationTimeResolver`] and its stock implementations
//! - [`metadata`]: sidecar load / save and [`MetadataStore`]
//! - [`error`]: [`MetadataError`], [`ResolveError`]

pub mod error;
pub mod metadata;
pub mod resolver;
pub mod types;

pub use error::{MetadataError, ResolveError};
pub use metadata::{MetadataStore, SidecarDocument, DEFAULT_METADATA_FILE};
pub use resolver::{CommandResolver, CreationTimeResolver, FileTimeResolver};
pub use types::{MetadataEntry, RenderContext};
