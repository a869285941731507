//! Form-definition-driven PDF generation.
//!
//! A submission flows through four stages:
//!
//! 1. the [`SchemaStore`] resolves the form definition,
//! 2. [`collect`] normalizes the submitted values against it,
//! 3. a [`DocumentRenderer`] draws the document (with the global [`StyleConfig`]),
//! 4. the [`ArtifactManager`] keeps the result as a transient artifact until it
//!    is confirmed under its permanent name or discarded.
//!
//! [`FormService`] wires the stages together behind the operations a transport
//! layer needs.

pub mod collector;
pub mod config;
pub mod error;
pub mod service;

pub use collector::{MULTI_VALUE_SEPARATOR, collect};
pub use config::ServiceConfig;
pub use error::{FormError, Result};
pub use service::{FormService, Submission};

pub use formpress_render_core::{DocumentPlan, DocumentRenderer, PageTemplate, RenderError, TemplateStore};
pub use formpress_render_printpdf::PrintpdfRenderer;
pub use formpress_schema::{SchemaCatalog, SchemaError, SchemaStore, load_style};
pub use formpress_storage::{
    ArtifactError, ArtifactManager, ArtifactRef, ArtifactState, TransientArtifact, TransientId,
    sanitize_component,
};
pub use formpress_types::{
    FieldKind, FieldSpec, FormSchema, FormSummary, NormalizedValues, StyleConfig, SubmittedValues,
};
