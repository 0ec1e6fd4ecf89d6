use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::{
    core::utils::{ensure_dir, PathResolver},
    errors::{Result, StockError},
};

use super::{Collection, Document, MemoryStore};

const TMP_SUFFIX: &str = "tmp";

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Serializable copy of every document held by a store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub collections: BTreeMap<Collection, Vec<Document>>,
}

impl StoreSnapshot {
    pub fn empty() -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            saved_at: Utc::now(),
            collections: BTreeMap::new(),
        }
    }

    pub fn document_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }
}

/// Persists [`MemoryStore`] contents as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Uses the default snapshot location under `base` (or the resolved app directory).
    pub fn in_dir(base: Option<PathBuf>) -> Result<Self> {
        let root = PathResolver::resolve_base(base);
        ensure_dir(&root)?;
        Ok(Self::new(PathResolver::snapshot_file_in(&root)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, store: &MemoryStore) -> Result<()> {
        let mut snapshot = store.export()?;
        snapshot.saved_at = Utc::now();
        let json = serde_json::to_string_pretty(&snapshot)?;
        write_atomic(&self.path, &json)?;
        info!(
            path = %self.path.display(),
            documents = snapshot.document_count(),
            "store snapshot saved"
        );
        Ok(())
    }

    pub fn load_snapshot(&self) -> Result<StoreSnapshot> {
        if !self.path.exists() {
            return Ok(StoreSnapshot::empty());
        }
        let data = fs::read_to_string(&self.path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&data)?;
        if snapshot.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(StockError::StoreUnavailable(format!(
                "snapshot `{}` is from a newer schema version",
                self.path.display()
            )));
        }
        Ok(snapshot)
    }

    /// Loads the snapshot into `store`, replacing its contents.
    pub fn load_into(&self, store: &MemoryStore) -> Result<usize> {
        let snapshot = self.load_snapshot()?;
        let count = snapshot.document_count();
        store.restore(snapshot)?;
        info!(path = %self.path.display(), documents = count, "store snapshot loaded");
        Ok(count)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Stages `data` next to `path` and renames it into place.
pub(crate) fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    fs::rename(&tmp, path)?;
    Ok(())
}
