//! Loading of form definitions and the global style configuration.
//!
//! Both loaders recover locally: a broken schema file is skipped and
//! reported, a broken or missing style file falls back to an empty mapping.

mod error;
mod store;
mod style;

pub use error::{ConfigLoadError, SchemaError};
pub use store::{SCHEMA_EXTENSIONS, SchemaCatalog, SchemaStore, load_catalog, load_schema_file};
pub use style::{load_style, try_load_style};
