use std::path::PathBuf;
use thiserror::Error;

/// A problem with one schema file. Loading continues past every variant.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to read schema '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse schema '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid schema '{}': {message}", path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("Schema id '{id}' in '{}' is already defined by '{}'", path.display(), first.display())]
    DuplicateId {
        id: String,
        path: PathBuf,
        first: PathBuf,
    },

    #[error("Schema directory '{}' could not be read: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SchemaError {
    /// The file (or directory) the error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            SchemaError::Read { path, .. }
            | SchemaError::Parse { path, .. }
            | SchemaError::Invalid { path, .. }
            | SchemaError::DuplicateId { path, .. }
            | SchemaError::Directory { path, .. } => path,
        }
    }
}

/// Why the style configuration fell back to an empty mapping.
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Failed to read style config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse style config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
