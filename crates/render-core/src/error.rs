use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed image payload for field '{field}': {reason}")]
    MalformedPayload { field: String, reason: String },
    #[error("Failed to decode image for field '{field}': {reason}")]
    Image { field: String, reason: String },
    #[error("Template error: {0}")]
    Template(String),
    #[error("PDF generation error: {0}")]
    Pdf(String),
    #[error("Other rendering error: {0}")]
    Other(String),
}

impl RenderError {
    pub fn malformed(field: &str, reason: impl Into<String>) -> Self {
        RenderError::MalformedPayload {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&str> for RenderError {
    fn from(s: &str) -> Self {
        RenderError::Other(s.to_string())
    }
}
