//! Storage for rendered documents.
//!
//! [`ArtifactManager`] keeps every artifact in one output directory and drives
//! the `temp_<id>.pdf` → `<schema>_<tags>_<timestamp>.pdf` lifecycle.

pub mod artifact;
pub mod error;
pub mod filename;

pub use artifact::{ArtifactManager, ArtifactRef, ArtifactState, TransientArtifact, TransientId};
pub use error::{ArtifactError, Result};
pub use filename::{PDF_EXTENSION, is_safe_stem, permanent_stem, sanitize_component};
