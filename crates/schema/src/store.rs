//! The schema catalog.
//!
//! A load scans one directory, parses every `.yaml`/`.yml` file and builds an
//! immutable [`SchemaCatalog`]. [`SchemaStore`] publishes catalogs by swapping
//! a single `Arc`, so readers always see one complete catalog.

use crate::error::SchemaError;
use formpress_types::{FormSchema, FormSummary};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// File extensions recognised as schema definitions.
pub const SCHEMA_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// One complete, immutable load of the schema directory.
#[derive(Debug, Default)]
pub struct SchemaCatalog {
    schemas: BTreeMap<String, Arc<FormSchema>>,
    sources: BTreeMap<String, PathBuf>,
    errors: Vec<SchemaError>,
}

impl SchemaCatalog {
    pub fn get(&self, id: &str) -> Option<Arc<FormSchema>> {
        self.schemas.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.schemas.contains_key(id)
    }

    /// Schemas ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<FormSchema>> {
        self.schemas.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn summaries(&self) -> Vec<FormSummary> {
        self.schemas.values().map(|s| FormSummary::from(s.as_ref())).collect()
    }

    /// The file a schema was loaded from.
    pub fn source(&self, id: &str) -> Option<&Path> {
        self.sources.get(id).map(PathBuf::as_path)
    }

    /// Files that were skipped during this load.
    pub fn errors(&self) -> &[SchemaError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn is_schema_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SCHEMA_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// Parses one schema file, taking the id from the file stem when absent.
pub fn load_schema_file(path: &Path) -> Result<FormSchema, SchemaError> {
    let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut schema: FormSchema =
        serde_yaml::from_str(&content).map_err(|source| SchemaError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if schema.id.trim().is_empty() {
        schema.id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
    }
    schema.validate().map_err(|message| SchemaError::Invalid {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(schema)
}

/// Loads every schema in `dir` into a fresh catalog.
///
/// Bad files are logged, recorded in [`SchemaCatalog::errors`] and skipped.
/// Files are visited in file-name order and the first definition of an id
/// wins; later files declaring the same id are reported as duplicates.
pub fn load_catalog(dir: &Path) -> SchemaCatalog {
    let mut catalog = SchemaCatalog::default();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) => {
            log::warn!("Schema directory {} is not readable: {}", dir.display(), source);
            catalog.errors.push(SchemaError::Directory {
                path: dir.to_path_buf(),
                source,
            });
            return catalog;
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_schema_file(path))
        .collect();
    paths.sort();

    log::debug!("Found {} schema files in {}", paths.len(), dir.display());

    for path in paths {
        let schema = match load_schema_file(&path) {
            Ok(schema) => schema,
            Err(e) => {
                log::error!("{}", e);
                catalog.errors.push(e);
                continue;
            }
        };

        if let Some(first) = catalog.sources.get(&schema.id) {
            let e = SchemaError::DuplicateId {
                id: schema.id.clone(),
                path: path.clone(),
                first: first.clone(),
            };
            log::error!("{}", e);
            catalog.errors.push(e);
            continue;
        }

        log::info!("Loaded form '{}' from {}", schema.id, path.display());
        catalog.sources.insert(schema.id.clone(), path);
        catalog.schemas.insert(schema.id.clone(), Arc::new(schema));
    }

    log::info!(
        "Loaded {} forms from {} ({} skipped)",
        catalog.schemas.len(),
        dir.display(),
        catalog.errors.len()
    );
    catalog
}

/// Shared owner of the current catalog snapshot.
#[derive(Debug)]
pub struct SchemaStore {
    dir: PathBuf,
    current: RwLock<Arc<SchemaCatalog>>,
}

impl SchemaStore {
    /// Creates a store and performs the initial load.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let catalog = load_catalog(&dir);
        Self {
            dir,
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The catalog as of the last load. Callers keep it for a whole request.
    pub fn snapshot(&self) -> Arc<SchemaCatalog> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reloads the directory and replaces the catalog in one swap.
    pub fn reload(&self) -> Arc<SchemaCatalog> {
        let fresh = Arc::new(load_catalog(&self.dir));
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = fresh.clone();
        fresh
    }

    pub fn get(&self, id: &str) -> Option<Arc<FormSchema>> {
        self.snapshot().get(id)
    }
}
