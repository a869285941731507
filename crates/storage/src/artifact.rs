//! The transient → permanent artifact lifecycle.
//!
//! A rendered document is first stored as `temp_<id>.pdf`. Confirming it
//! moves the very same file to its permanent name; discarding it deletes it.
//! Both are terminal: afterwards the id no longer resolves to an artifact.
//!
//! File presence is the source of truth. A confirm first claims the transient
//! file with one atomic rename, so of two racing confirm/discard calls for the
//! same id exactly one observes the artifact. A claim left behind by an
//! interrupted confirm is still reported by [`ArtifactManager::list_transient`].

use crate::error::{ArtifactError, Result};
use crate::filename::{PDF_EXTENSION, is_safe_stem, permanent_stem};
use formpress_types::{FormSchema, NormalizedValues};
use std::collections::HashMap;
use std::fmt;
use std::fs::Metadata;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

pub const TRANSIENT_PREFIX: &str = "temp_";
const CLAIM_PREFIX: &str = ".claim_";
const ID_LEN: usize = 32;
/// Upper bound on `_<n>` suffixes tried for one permanent name.
const MAX_NAME_SUFFIX: u32 = 1000;

/// Opaque identifier of a transient artifact: 128 random bits as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransientId(String);

impl TransientId {
    pub fn generate() -> Self {
        TransientId(format!("{:032x}", rand::random::<u128>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `temp_<id>.pdf`
    pub fn file_name(&self) -> String {
        format!("{}{}.{}", TRANSIENT_PREFIX, self.0, PDF_EXTENSION)
    }

    fn from_file_name(name: &str) -> Option<Self> {
        Self::strip(name, TRANSIENT_PREFIX)
    }

    /// `.claim_<id>.pdf`
    fn from_claim_name(name: &str) -> Option<Self> {
        Self::strip(name, CLAIM_PREFIX)
    }

    fn strip(name: &str, prefix: &str) -> Option<Self> {
        let id = name
            .strip_prefix(prefix)?
            .strip_suffix(PDF_EXTENSION)?
            .strip_suffix('.')?;
        id.parse().ok()
    }
}

impl FromStr for TransientId {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self> {
        let valid = s.len() == ID_LEN && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
        if valid {
            Ok(TransientId(s.to_string()))
        } else {
            Err(ArtifactError::InvalidIdentifier(s.to_string()))
        }
    }
}

impl fmt::Display for TransientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A name that resolves to a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactRef {
    Transient(TransientId),
    /// A permanent file stem.
    Permanent(String),
}

impl ArtifactRef {
    /// Accepts `temp_<id>`, a bare `<id>`, or a permanent stem, each with or
    /// without the `.pdf` extension. Anything that could leave the output
    /// directory is rejected.
    pub fn parse(reference: &str) -> Result<Self> {
        let stem = reference
            .strip_suffix(PDF_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .unwrap_or(reference);

        if let Some(id) = stem.strip_prefix(TRANSIENT_PREFIX)
            && let Ok(id) = id.parse::<TransientId>()
        {
            return Ok(ArtifactRef::Transient(id));
        }
        if let Ok(id) = stem.parse::<TransientId>() {
            return Ok(ArtifactRef::Transient(id));
        }
        if is_safe_stem(stem) {
            return Ok(ArtifactRef::Permanent(stem.to_string()));
        }
        Err(ArtifactError::InvalidIdentifier(reference.to_string()))
    }

    pub fn file_name(&self) -> String {
        match self {
            ArtifactRef::Transient(id) => id.file_name(),
            ArtifactRef::Permanent(stem) => format!("{}.{}", stem, PDF_EXTENSION),
        }
    }
}

/// Where an artifact stands in its lifecycle, as far as this process knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactState {
    /// Stored under its transient name, awaiting confirm or discard.
    Transient,
    Confirmed { path: PathBuf },
    Discarded,
    /// Not present and not seen by this process.
    Unknown,
}

/// A transient artifact found on disk, e.g. for a retention sweep.
#[derive(Debug, Clone)]
pub struct TransientArtifact {
    pub id: TransientId,
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub size: u64,
    /// Still under its claim name: a confirm is running, or was interrupted
    /// before the permanent file appeared.
    pub claimed: bool,
}

/// Owns the output directory and every artifact in it.
#[derive(Debug)]
pub struct ArtifactManager {
    dir: PathBuf,
    /// Terminal states observed by this process.
    outcomes: Mutex<HashMap<TransientId, ArtifactState>>,
}

impl ArtifactManager {
    /// Opens `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            outcomes: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn transient_path(&self, id: &TransientId) -> PathBuf {
        self.dir.join(id.file_name())
    }

    fn claim_path(&self, id: &TransientId) -> PathBuf {
        self.dir.join(format!("{}{}.{}", CLAIM_PREFIX, id, PDF_EXTENSION))
    }

    fn record(&self, id: &TransientId, state: ArtifactState) {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), state);
    }

    /// Stores a rendered document under a fresh transient id.
    ///
    /// The bytes are staged in a temporary file and moved into place without
    /// overwriting, so the id is unique among live artifacts and a failed write
    /// leaves nothing behind.
    pub fn store_transient(&self, bytes: &[u8]) -> Result<TransientId> {
        let mut staging = tempfile::Builder::new()
            .prefix(".staging_")
            .suffix(".part")
            .tempfile_in(&self.dir)?;
        staging.write_all(bytes)?;
        staging.as_file().sync_all()?;

        loop {
            let id = TransientId::generate();
            match staging.persist_noclobber(self.transient_path(&id)) {
                Ok(_) => {
                    log::info!("Stored transient artifact {} ({} bytes)", id, bytes.len());
                    return Ok(id);
                }
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    log::warn!("Transient id {} already in use, generating another", id);
                    staging = e.file;
                }
                Err(e) => return Err(e.error.into()),
            }
        }
    }

    /// Confirms `id` using the current time for the permanent name.
    pub fn confirm(&self, schema: &FormSchema, id: &TransientId, values: &NormalizedValues) -> Result<PathBuf> {
        self.confirm_at(schema, id, values, chrono::Utc::now().timestamp())
    }

    /// Moves the transient artifact to
    /// `<schema>_<in_filename values>_<timestamp>.pdf`.
    ///
    /// An existing permanent file is never overwritten; a `_<n>` suffix is
    /// appended instead. Fails with [`ArtifactError::TransientNotFound`] when
    /// the artifact was already confirmed or discarded, or never existed.
    pub fn confirm_at(
        &self,
        schema: &FormSchema,
        id: &TransientId,
        values: &NormalizedValues,
        timestamp: i64,
    ) -> Result<PathBuf> {
        let claim = self.claim_path(id);
        match std::fs::rename(self.transient_path(id), &claim) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ArtifactError::TransientNotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let tags = schema.filename_fields().map(|f| values.get_or_empty(&f.name));
        let stem = permanent_stem(&schema.id, tags, timestamp);

        match self.publish(&claim, &stem) {
            Ok(path) => {
                log::info!("Confirmed artifact {} as {}", id, path.display());
                self.record(id, ArtifactState::Confirmed { path: path.clone() });
                Ok(path)
            }
            Err(e) => {
                // hand the artifact back so the caller can retry
                if let Err(restore) = std::fs::rename(&claim, self.transient_path(id)) {
                    log::error!("Could not restore transient artifact {}: {}", id, restore);
                }
                Err(e)
            }
        }
    }

    /// Moves `source` to the first free `<stem>[_n].pdf`.
    fn publish(&self, source: &Path, stem: &str) -> Result<PathBuf> {
        for n in 0..=MAX_NAME_SUFFIX {
            let name = match n {
                0 => format!("{}.{}", stem, PDF_EXTENSION),
                n => format!("{}_{}.{}", stem, n, PDF_EXTENSION),
            };
            let target = self.dir.join(name);
            match std::fs::hard_link(source, &target) {
                Ok(()) => {
                    // the permanent file exists now; a leftover claim shows up as an orphan
                    if let Err(e) = std::fs::remove_file(source) {
                        log::warn!(
                            "Published {} but could not remove {}: {}",
                            target.display(),
                            source.display(),
                            e
                        );
                    }
                    return Ok(target);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    // filesystems without hard links
                    log::debug!("hard link to {} failed ({}), renaming", target.display(), e);
                    if target.exists() {
                        continue;
                    }
                    std::fs::rename(source, &target)?;
                    return Ok(target);
                }
            }
        }
        Err(ArtifactError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free file name for '{}'", stem),
        )))
    }

    /// Removes the transient artifact. Returns whether anything was removed;
    /// discarding a missing or already terminal id is a no-op.
    pub fn discard(&self, id: &TransientId) -> Result<bool> {
        match std::fs::remove_file(self.transient_path(id)) {
            Ok(()) => {
                log::info!("Discarded transient artifact {}", id);
                self.record(id, ArtifactState::Discarded);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("Discard of {} ignored, artifact already gone", id);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn state(&self, id: &TransientId) -> ArtifactState {
        if self.transient_path(id).is_file() {
            return ArtifactState::Transient;
        }
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .unwrap_or(ArtifactState::Unknown)
    }

    /// Path of a stored artifact, transient or permanent.
    pub fn path_of(&self, reference: &ArtifactRef) -> Result<PathBuf> {
        let path = self.dir.join(reference.file_name());
        if path.is_file() {
            Ok(path)
        } else {
            Err(ArtifactError::NotFound(reference.file_name()))
        }
    }

    /// Reads a stored artifact, transient or permanent.
    pub fn fetch(&self, reference: &ArtifactRef) -> Result<Vec<u8>> {
        let path = self.dir.join(reference.file_name());
        std::fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ArtifactError::NotFound(reference.file_name()),
            _ => ArtifactError::Io(e),
        })
    }

    /// Every transient artifact currently on disk, oldest first, including
    /// claims that never reached their permanent name.
    ///
    /// Entries removed by a concurrent confirm or discard while the directory
    /// is scanned are skipped.
    pub fn list_transient(&self) -> Result<Vec<TransientArtifact>> {
        let mut found = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(artifact) = transient_entry(name, entry.path(), entry.metadata())? {
                found.push(artifact);
            }
        }
        found.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }
}

fn transient_entry(
    name: &str,
    path: PathBuf,
    metadata: std::io::Result<Metadata>,
) -> Result<Option<TransientArtifact>> {
    let (id, claimed) = match TransientId::from_file_name(name) {
        Some(id) => (id, false),
        None => match TransientId::from_claim_name(name) {
            Some(id) => (id, true),
            None => return Ok(None),
        },
    };
    let metadata = match metadata {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("{} vanished while listing transient artifacts", name);
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_file() {
        return Ok(None);
    }
    Ok(Some(TransientArtifact {
        id,
        path,
        modified: metadata.modified().ok(),
        size: metadata.len(),
        claimed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formpress_types::FieldSpec;
    use std::fs;
    use tempfile::tempdir;

    fn schema() -> FormSchema {
        FormSchema::new(
            "handover",
            "Handover",
            vec![
                FieldSpec::new("user", "text").in_filename(),
                FieldSpec::new("notebook", "text"),
                FieldSpec::new("tag", "text").in_filename(),
            ],
        )
    }

    fn values(user: &str) -> NormalizedValues {
        [("user", user), ("notebook", "X1"), ("tag", "")].into_iter().collect()
    }

    #[test]
    fn transient_id_format() {
        let id = TransientId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert_eq!(id.as_str().parse::<TransientId>().unwrap(), id);
        assert!("../../etc/passwd".parse::<TransientId>().is_err());
        assert!("ABCDEF0123456789ABCDEF0123456789".parse::<TransientId>().is_err());
        assert_ne!(TransientId::generate(), TransientId::generate());
    }

    #[test]
    fn artifact_ref_parsing() {
        let id = TransientId::generate();
        let expected = ArtifactRef::Transient(id.clone());
        assert_eq!(ArtifactRef::parse(&id.file_name()).unwrap(), expected);
        assert_eq!(ArtifactRef::parse(&format!("temp_{}", id)).unwrap(), expected);
        assert_eq!(ArtifactRef::parse(id.as_str()).unwrap(), expected);
        assert_eq!(
            ArtifactRef::parse("handover_Max_1.pdf").unwrap(),
            ArtifactRef::Permanent("handover_Max_1".to_string())
        );
        assert!(ArtifactRef::parse("../secret.pdf").is_err());
        assert!(ArtifactRef::parse("a/b").is_err());
    }

    #[test]
    fn store_then_confirm_moves_the_same_bytes() {
        let dir = tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path().join("pdfs")).unwrap();
        let id = manager.store_transient(b"%PDF-fake").unwrap();
        assert_eq!(manager.state(&id), ArtifactState::Transient);

        let path = manager.confirm_at(&schema(), &id, &values("Max Muster"), 1_700_000_000).unwrap();
        assert_eq!(path.file_name().unwrap(), "handover_Max_Muster_1700000000.pdf");
        assert_eq!(fs::read(&path).unwrap(), b"%PDF-fake");
        assert!(!manager.transient_path(&id).exists());
        assert_eq!(manager.state(&id), ArtifactState::Confirmed { path });
        // only the permanent file is left
        assert_eq!(fs::read_dir(manager.dir()).unwrap().count(), 1);
    }

    #[test]
    fn confirm_twice_is_not_found() {
        let dir = tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path()).unwrap();
        let id = manager.store_transient(b"x").unwrap();
        manager.confirm_at(&schema(), &id, &values("a"), 1).unwrap();
        let err = manager.confirm_at(&schema(), &id, &values("a"), 2).unwrap_err();
        assert!(matches!(err, ArtifactError::TransientNotFound(_)));
    }

    #[test]
    fn confirm_after_discard_fails_and_discard_after_confirm_is_noop() {
        let dir = tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path()).unwrap();

        let discarded = manager.store_transient(b"x").unwrap();
        assert!(manager.discard(&discarded).unwrap());
        assert!(!manager.discard(&discarded).unwrap());
        assert_eq!(manager.state(&discarded), ArtifactState::Discarded);
        assert!(matches!(
            manager.confirm_at(&schema(), &discarded, &values("a"), 1),
            Err(ArtifactError::TransientNotFound(_))
        ));

        let confirmed = manager.store_transient(b"y").unwrap();
        let path = manager.confirm_at(&schema(), &confirmed, &values("a"), 1).unwrap();
        assert!(!manager.discard(&confirmed).unwrap());
        assert!(path.exists());
        assert!(matches!(manager.state(&confirmed), ArtifactState::Confirmed { .. }));
    }

    #[test]
    fn same_second_confirms_get_distinct_names() {
        let dir = tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path()).unwrap();
        let first = manager.store_transient(b"1").unwrap();
        let second = manager.store_transient(b"2").unwrap();

        let a = manager.confirm_at(&schema(), &first, &values("Max"), 42).unwrap();
        let b = manager.confirm_at(&schema(), &second, &values("Max"), 42).unwrap();
        assert_eq!(a.file_name().unwrap(), "handover_Max_42.pdf");
        assert_eq!(b.file_name().unwrap(), "handover_Max_42_1.pdf");
        assert_eq!(fs::read(&a).unwrap(), b"1");
        assert_eq!(fs::read(&b).unwrap(), b"2");
    }

    #[test]
    fn unknown_id_state_and_fetch() {
        let dir = tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path()).unwrap();
        let id = TransientId::generate();
        assert_eq!(manager.state(&id), ArtifactState::Unknown);
        assert!(matches!(
            manager.fetch(&ArtifactRef::Transient(id)),
            Err(ArtifactError::NotFound(_))
        ));

        let stored = manager.store_transient(b"data").unwrap();
        assert_eq!(manager.fetch(&ArtifactRef::Transient(stored.clone())).unwrap(), b"data");
        let path = manager.confirm_at(&schema(), &stored, &values("Max"), 7).unwrap();
        let stem = path.file_stem().unwrap().to_str().unwrap();
        let reference = ArtifactRef::parse(stem).unwrap();
        assert_eq!(manager.fetch(&reference).unwrap(), b"data");
        assert_eq!(manager.path_of(&reference).unwrap(), path);
    }

    #[test]
    fn lists_only_transient_artifacts() {
        let dir = tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path()).unwrap();
        let a = manager.store_transient(b"a").unwrap();
        let b = manager.store_transient(b"b").unwrap();
        let c = manager.store_transient(b"c").unwrap();
        manager.confirm_at(&schema(), &c, &values("x"), 1).unwrap();
        fs::write(dir.path().join("temp_notanid.pdf"), b"").unwrap();

        let mut ids: Vec<_> = manager.list_transient().unwrap().into_iter().map(|t| t.id).collect();
        ids.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn stale_claims_stay_discoverable() {
        let dir = tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path()).unwrap();
        let pending = manager.store_transient(b"pending").unwrap();
        let interrupted = TransientId::generate();
        fs::write(manager.claim_path(&interrupted), b"claimed bytes").unwrap();

        let listed = manager.list_transient().unwrap();
        assert_eq!(listed.len(), 2);
        let claim = listed.iter().find(|t| t.id == interrupted).unwrap();
        assert!(claim.claimed);
        assert_eq!(fs::read(&claim.path).unwrap(), b"claimed bytes");
        let transient = listed.iter().find(|t| t.id == pending).unwrap();
        assert!(!transient.claimed);
        assert_eq!(transient.path, manager.transient_path(&pending));
    }

    #[test]
    fn vanished_entries_are_skipped() {
        let dir = tempdir().unwrap();
        let id = TransientId::generate();
        let path = dir.path().join(id.file_name());
        let gone = fs::metadata(&path);
        assert!(transient_entry(&id.file_name(), path, gone).unwrap().is_none());

        let denied = Err(std::io::Error::from(ErrorKind::PermissionDenied));
        assert!(transient_entry(&id.file_name(), dir.path().join("x"), denied).is_err());
    }

    #[test]
    fn listing_survives_concurrent_discards() {
        let dir = tempdir().unwrap();
        let manager = ArtifactManager::new(dir.path()).unwrap();
        let ids: Vec<_> = (0..200).map(|_| manager.store_transient(b"x").unwrap()).collect();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for id in &ids {
                    manager.discard(id).unwrap();
                }
            });
            for _ in 0..20 {
                assert!(manager.list_transient().unwrap().len() <= ids.len());
            }
        });
        assert!(manager.list_transient().unwrap().is_empty());
    }
}
