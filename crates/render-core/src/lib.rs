//! Core rendering abstractions for form documents.
//!
//! This crate provides the backend-independent half of rendering:
//! - [`DocumentPlan`]: the ordered blocks of one document, images decoded
//! - [`DocumentRenderer`]: the trait PDF backends implement
//! - [`TemplateStore`] / [`PageTemplate`]: page formatting referenced by schemas
//! - inline image payload decoding

mod error;
pub mod payload;
pub mod template;
mod traits;
mod types;

pub use error::RenderError;
pub use payload::{DecodedImage, decode_payload};
pub use template::{DEFAULT_TEMPLATE, Margins, PageSize, PageTemplate, TemplateStore};
pub use traits::{DocumentRenderer, write_atomically};
pub use types::{Block, DocumentPlan};
