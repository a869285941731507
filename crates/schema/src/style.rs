use crate::error::ConfigLoadError;
use formpress_types::StyleConfig;
use std::path::Path;

/// Reads and parses the style configuration, reporting every failure.
pub fn try_load_style(path: &Path) -> Result<Option<StyleConfig>, ConfigLoadError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(Some(StyleConfig::default()));
    }
    serde_yaml::from_str(&content)
        .map(Some)
        .map_err(|source| ConfigLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Loads the global style configuration.
///
/// Never fails: a missing file or a broken one yields an empty configuration.
pub fn load_style(path: &Path) -> StyleConfig {
    match try_load_style(path) {
        Ok(Some(style)) => {
            log::info!("Loaded style config with {} entries from {}", style.len(), path.display());
            style
        }
        Ok(None) => {
            log::info!("No style config at {}, using defaults", path.display());
            StyleConfig::default()
        }
        Err(e) => {
            log::warn!("{}; using defaults", e);
            StyleConfig::default()
        }
    }
}
