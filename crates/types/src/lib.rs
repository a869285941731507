//! Shared data model for the formpress crates.
//!
//! - [`FormSchema`] / [`FieldSpec`]: declarative form definitions
//! - [`SubmittedValues`] / [`NormalizedValues`]: raw and collected field values
//! - [`StyleConfig`]: global presentation parameters

pub mod color;
pub mod schema;
pub mod style;
pub mod values;

pub use color::Color;
pub use schema::{
    FALLBACK_TITLE, FieldKind, FieldSpec, FormSchema, FormSummary, PdfFieldOverride, PdfOverrides,
    RenderField,
};
pub use style::StyleConfig;
pub use values::{NormalizedValues, SubmittedValues};
