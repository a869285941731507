use formpress_render_core::RenderError;
use formpress_storage::ArtifactError;
use thiserror::Error;

/// Errors surfaced by [`FormService`](crate::FormService) operations.
#[derive(Error, Debug)]
pub enum FormError {
    #[error("Form '{0}' not found")]
    SchemaNotFound(String),

    /// The transient artifact was already confirmed or discarded, or never existed.
    #[error("Transient artifact '{0}' not found")]
    TransientNotFound(String),

    #[error("Artifact '{0}' not found")]
    ArtifactNotFound(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Storage error: {0}")]
    Storage(#[source] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl FormError {
    /// Whether the error is a client-visible "not found" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FormError::SchemaNotFound(_)
                | FormError::TransientNotFound(_)
                | FormError::ArtifactNotFound(_)
        )
    }
}

impl From<ArtifactError> for FormError {
    fn from(e: ArtifactError) -> Self {
        match e {
            ArtifactError::TransientNotFound(id) => FormError::TransientNotFound(id),
            ArtifactError::NotFound(name) => FormError::ArtifactNotFound(name),
            ArtifactError::InvalidIdentifier(id) => FormError::InvalidIdentifier(id),
            ArtifactError::Io(e) => FormError::Storage(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, FormError>;
