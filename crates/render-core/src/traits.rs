use crate::error::RenderError;
use crate::template::PageTemplate;
use crate::types::DocumentPlan;
use std::io::Write;
use std::path::Path;

/// A PDF backend that turns a [`DocumentPlan`] into a finished document.
pub trait DocumentRenderer: Send + Sync {
    /// Renders the whole document into memory.
    fn render(&self, plan: &DocumentPlan, template: &PageTemplate) -> Result<Vec<u8>, RenderError>;

    /// Renders straight to `path`.
    ///
    /// The bytes go to a temporary file next to `path` that is renamed into
    /// place only after a complete write, so a failed render leaves nothing
    /// behind at `path`.
    fn render_to_path(
        &self,
        plan: &DocumentPlan,
        template: &PageTemplate,
        path: &Path,
    ) -> Result<(), RenderError> {
        let bytes = self.render(plan, template)?;
        write_atomically(path, &bytes)
    }

    /// Returns a human-readable name for this backend (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// Writes `bytes` to `path` through a sibling temporary file.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staging = tempfile::Builder::new()
        .prefix(".staging_")
        .suffix(".part")
        .tempfile_in(dir)?;
    staging.write_all(bytes)?;
    staging.as_file().sync_all()?;
    staging.persist(path).map_err(|e| RenderError::Io(e.error))?;
    Ok(())
}
