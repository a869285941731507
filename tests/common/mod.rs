pub mod fixtures;
pub mod pdf_assertions;

use formpress::{FormService, ServiceConfig};
use lopdf::Document as LopdfDocument;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Wrapper around a generated PDF with helper methods
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub doc: LopdfDocument,
}

impl GeneratedPdf {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Box<dyn std::error::Error>> {
        let doc = LopdfDocument::load_mem(&bytes)?;
        Ok(Self { bytes, doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// All drawn text, one line per text-showing operation.
    pub fn text(&self) -> String {
        pdf_assertions::extract_text(&self.doc)
    }

    pub fn image_count(&self) -> usize {
        pdf_assertions::count_images(&self.doc)
    }

    /// Save PDF to a file for manual debugging
    #[allow(dead_code)]
    pub fn save_for_debug(&self, name: &str) -> std::io::Result<()> {
        fs::write(format!("test_output_{}.pdf", name), &self.bytes)
    }
}

/// A service over a fresh directory tree.
pub struct TestEnv {
    pub root: TempDir,
    pub config: ServiceConfig,
    pub service: FormService,
}

impl TestEnv {
    /// Writes `schemas` (file name, YAML) and opens a service on them.
    pub fn with_schemas(schemas: &[(&str, &str)]) -> Result<Self, Box<dyn std::error::Error>> {
        Self::build(schemas, |_| Ok(()))
    }

    /// Like [`TestEnv::with_schemas`], running `setup` on the root first.
    pub fn build(
        schemas: &[(&str, &str)],
        setup: impl FnOnce(&Path) -> std::io::Result<()>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        init_logger();
        let root = tempfile::tempdir()?;
        let config = ServiceConfig::rooted_at(root.path());
        fs::create_dir_all(&config.schemas_dir)?;
        for (name, yaml) in schemas {
            fs::write(config.schemas_dir.join(name), yaml)?;
        }
        setup(root.path())?;
        let service = FormService::new(&config)?;
        Ok(Self {
            root,
            config,
            service,
        })
    }

    pub fn write_schema(&self, name: &str, yaml: &str) -> std::io::Result<()> {
        fs::write(self.config.schemas_dir.join(name), yaml)
    }

    pub fn remove_schema(&self, name: &str) -> std::io::Result<()> {
        fs::remove_file(self.config.schemas_dir.join(name))
    }

    /// File names in the output directory, sorted.
    pub fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.config.output_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}
