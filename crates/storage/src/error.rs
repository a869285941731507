use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    /// The transient artifact was already confirmed or discarded, or never existed.
    #[error("Transient artifact '{0}' not found")]
    TransientNotFound(String),

    #[error("Artifact '{0}' not found")]
    NotFound(String),

    #[error("Invalid artifact identifier: {0}")]
    InvalidIdentifier(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ArtifactError>;
