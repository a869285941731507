use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file read when `FORMPRESS_CONFIG` is not set. Optional.
pub const DEFAULT_CONFIG_FILE: &str = "formpress.toml";
pub const CONFIG_PATH_VAR: &str = "FORMPRESS_CONFIG";
const ENV_PREFIX: &str = "FORMPRESS";

/// Filesystem layout of a form service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory of YAML form definitions.
    pub schemas_dir: PathBuf,
    /// Global style config, read once at startup.
    pub style_path: PathBuf,
    /// Directory of JSON page templates.
    pub templates_dir: PathBuf,
    /// Where transient and permanent PDFs are written.
    pub output_dir: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            schemas_dir: PathBuf::from("forms"),
            style_path: PathBuf::from("config/style.yaml"),
            templates_dir: PathBuf::from("pdf_templates"),
            output_dir: PathBuf::from("pdfs"),
        }
    }
}

impl ServiceConfig {
    /// All paths relative to `root`.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let defaults = Self::default();
        Self {
            schemas_dir: root.join(defaults.schemas_dir),
            style_path: root.join(defaults.style_path),
            templates_dir: root.join(defaults.templates_dir),
            output_dir: root.join(defaults.output_dir),
        }
    }

    /// Loads defaults, then the config file (`FORMPRESS_CONFIG` or
    /// `formpress.toml`, if present), then `FORMPRESS__*` environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// Like [`ServiceConfig::load`] with an explicit config file.
    ///
    /// An explicitly named file must exist; the default file is optional.
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: ServiceConfig = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        log::debug!("Service configuration: {:?}", config);
        Ok(config)
    }
}
