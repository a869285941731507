//! The operations a transport layer exposes, over one set of directories.

use crate::collector::collect;
use crate::config::ServiceConfig;
use crate::error::{FormError, Result};
use chrono::{Local, NaiveDate};
use formpress_render_core::{DocumentPlan, DocumentRenderer, TemplateStore};
use formpress_render_printpdf::PrintpdfRenderer;
use formpress_schema::{SchemaCatalog, SchemaStore, load_style};
use formpress_storage::{ArtifactManager, ArtifactRef, ArtifactState, TransientArtifact, TransientId};
use formpress_types::{FormSchema, FormSummary, NormalizedValues, StyleConfig, SubmittedValues};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub transient_id: String,
    /// The collected values, for display next to the preview.
    pub values: NormalizedValues,
}

/// Schema catalog, style, templates, renderer and artifact storage wired
/// together.
pub struct FormService {
    schemas: SchemaStore,
    style: StyleConfig,
    templates: TemplateStore,
    renderer: Box<dyn DocumentRenderer>,
    artifacts: ArtifactManager,
}

impl FormService {
    /// Loads the catalog and the style config, and creates the output
    /// directory if needed.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let schemas = SchemaStore::open(&config.schemas_dir);
        let style = load_style(&config.style_path);
        let artifacts = ArtifactManager::new(&config.output_dir)?;
        log::info!(
            "Form service ready: {} forms, output in {}",
            schemas.snapshot().len(),
            artifacts.dir().display()
        );
        Ok(Self {
            schemas,
            style,
            templates: TemplateStore::new(&config.templates_dir),
            renderer: Box::new(PrintpdfRenderer::new()),
            artifacts,
        })
    }

    /// Builds a service from [`ServiceConfig::load`].
    pub fn from_env() -> Result<Self> {
        Self::new(&ServiceConfig::load()?)
    }

    /// Replaces the PDF backend.
    pub fn with_renderer(mut self, renderer: Box<dyn DocumentRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn output_dir(&self) -> &Path {
        self.artifacts.dir()
    }

    /// The current catalog, without reloading.
    pub fn catalog(&self) -> Arc<SchemaCatalog> {
        self.schemas.snapshot()
    }

    /// Reloads the schema directory and lists every form.
    pub fn list_forms(&self) -> Vec<FormSummary> {
        let catalog = self.schemas.reload();
        log::info!("Reloaded {} forms from {}", catalog.len(), self.schemas.dir().display());
        catalog.summaries()
    }

    pub fn form(&self, id: &str) -> Result<Arc<FormSchema>> {
        self.schemas
            .get(id)
            .ok_or_else(|| FormError::SchemaNotFound(id.to_string()))
    }

    /// Initial values for an empty form: resolved defaults, blank elsewhere.
    pub fn prefill(&self, id: &str) -> Result<NormalizedValues> {
        let schema = self.form(id)?;
        let today = Local::now().date_naive();
        Ok(schema
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.resolve_default(today).unwrap_or_default()))
            .collect())
    }

    /// Collects and renders a submission and stores it as a transient artifact.
    ///
    /// Nothing is written unless rendering succeeds.
    pub fn submit(&self, id: &str, submitted: &SubmittedValues) -> Result<Submission> {
        self.submit_on(id, submitted, Local::now().date_naive())
    }

    /// [`FormService::submit`] with an explicit generation date.
    pub fn submit_on(&self, id: &str, submitted: &SubmittedValues, today: NaiveDate) -> Result<Submission> {
        let schema = self.form(id)?;
        let values = collect(&schema, submitted);
        let template = self.templates.resolve(schema.template.as_deref())?;
        let plan = DocumentPlan::build(&schema, &values, &self.style, &template, today)?;
        let bytes = self.renderer.render(&plan, &template)?;
        drop(plan);

        let transient = self.artifacts.store_transient(&bytes)?;
        log::info!(
            "Rendered '{}' with {} as transient {}",
            schema.id,
            self.renderer.name(),
            transient
        );
        Ok(Submission {
            transient_id: transient.to_string(),
            values,
        })
    }

    /// Bytes of a transient or permanent artifact.
    pub fn fetch(&self, reference: &str) -> Result<Vec<u8>> {
        let reference = ArtifactRef::parse(reference)?;
        Ok(self.artifacts.fetch(&reference)?)
    }

    /// Confirms a transient artifact under its permanent name, built from
    /// `submitted` and the current time.
    pub fn confirm(&self, id: &str, transient: &str, submitted: &SubmittedValues) -> Result<PathBuf> {
        self.confirm_at(id, transient, submitted, chrono::Utc::now().timestamp())
    }

    /// [`FormService::confirm`] with an explicit unix timestamp.
    pub fn confirm_at(
        &self,
        id: &str,
        transient: &str,
        submitted: &SubmittedValues,
        timestamp: i64,
    ) -> Result<PathBuf> {
        let schema = self.form(id)?;
        let transient = parse_transient(transient)?;
        let values = collect(&schema, submitted);
        Ok(self.artifacts.confirm_at(&schema, &transient, &values, timestamp)?)
    }

    /// Drops a transient artifact. Returns whether one was removed.
    pub fn discard(&self, transient: &str) -> Result<bool> {
        let transient = parse_transient(transient)?;
        Ok(self.artifacts.discard(&transient)?)
    }

    pub fn state(&self, transient: &str) -> Result<ArtifactState> {
        Ok(self.artifacts.state(&parse_transient(transient)?))
    }

    /// Transient artifacts never confirmed or discarded.
    pub fn orphans(&self) -> Result<Vec<TransientArtifact>> {
        Ok(self.artifacts.list_transient()?)
    }
}

/// Accepts a bare id or a `temp_<id>[.pdf]` file name.
fn parse_transient(reference: &str) -> Result<TransientId> {
    match ArtifactRef::parse(reference)? {
        ArtifactRef::Transient(id) => Ok(id),
        ArtifactRef::Permanent(_) => Err(FormError::InvalidIdentifier(reference.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn service() -> (TempDir, FormService) {
        let dir = tempdir().unwrap();
        let config = ServiceConfig::rooted_at(dir.path());
        fs::create_dir_all(&config.schemas_dir).unwrap();
        fs::write(
            config.schemas_dir.join("loan.yaml"),
            "form_id: loan\ntitle: Loan\nfields:\n  - name: user\n    in_filename: true\n  - name: from\n    type: date\n    default: today\n  - name: note\n    default: none\n",
        )
        .unwrap();
        let service = FormService::new(&config).unwrap();
        (dir, service)
    }

    #[test]
    fn unknown_form_is_not_found() {
        let (_dir, service) = service();
        let err = service.submit("nope", &SubmittedValues::new()).unwrap_err();
        assert!(matches!(err, FormError::SchemaNotFound(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn prefill_resolves_defaults() {
        let (_dir, service) = service();
        let values = service.prefill("loan").unwrap();
        assert_eq!(values.get("user"), Some(""));
        assert_eq!(values.get("note"), Some("none"));
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(values.get("from"), Some(today.as_str()));
    }

    #[test]
    fn transient_references_must_be_transient() {
        let (_dir, service) = service();
        assert!(matches!(
            service.discard("loan_Max_1"),
            Err(FormError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            service.discard("../../etc/passwd"),
            Err(FormError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn submit_discard_cycle() {
        let (_dir, service) = service();
        let submission = service
            .submit("loan", &SubmittedValues::new().with("user", "Max"))
            .unwrap();
        assert_eq!(submission.values.get("from"), Some(""));
        assert_eq!(service.orphans().unwrap().len(), 1);
        assert_eq!(service.state(&submission.transient_id).unwrap(), ArtifactState::Transient);

        assert!(service.discard(&submission.transient_id).unwrap());
        assert!(!service.discard(&submission.transient_id).unwrap());
        assert!(service.orphans().unwrap().is_empty());
    }
}
