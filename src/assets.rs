//! Asset index lookups
//!
//! The editor owns the asset database. The converter only needs to map a uuid
//! to the asset's file, the mount root it lives under, its imported (sidecar)
//! JSON document and the sub-asset table of its `.meta` file. [`AssetIndex`]
//! captures exactly that surface.
//!
//! Two implementations ship with the crate:
//! - [`AssetDatabase`]: file backed, loaded from a prebuilt index JSON or
//!   scanned from a Creator project's `.meta` files
//! - [`MemoryAssetIndex`]: in-memory, for embedding hosts and tests

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Lookup capability the converter needs from the host's asset database.
pub trait AssetIndex {
    /// On-disk path of the asset's source file.
    fn asset_path(&self, uuid: &str) -> Option<PathBuf>;

    /// Root directory of the mount that owns the asset.
    fn asset_mount(&self, uuid: &str) -> Option<PathBuf>;

    /// Path of the imported JSON document describing the asset.
    fn import_path(&self, uuid: &str) -> Option<PathBuf>;

    /// Sub-asset table (`subMetas`) of the asset's `.meta` file.
    fn sub_metas(&self, uuid: &str) -> Option<Map<String, Value>>;

    /// Read a file's raw bytes.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    /// Files stored directly inside a directory, sorted by path.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Everything the index records about one uuid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetEntry {
    /// Source file of the asset
    pub path: PathBuf,
    /// Mount root the asset path is relative to
    pub mount: PathBuf,
    /// Imported JSON document, when the asset has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<PathBuf>,
    /// Sub-assets declared by the `.meta` file
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub sub_metas: Map<String, Value>,
}

impl AssetEntry {
    pub fn new(path: impl Into<PathBuf>, mount: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), mount: mount.into(), ..Default::default() }
    }

    pub fn with_import(mut self, import: impl Into<PathBuf>) -> Self {
        self.import = Some(import.into());
        self
    }

    pub fn with_sub_metas(mut self, sub_metas: Map<String, Value>) -> Self {
        self.sub_metas = sub_metas;
        self
    }
}

/// Error building an [`AssetDatabase`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IndexError {
    /// Reading the index file failed
    #[error("Failed to read asset index {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The index file is not valid JSON of the expected shape
    #[error("Failed to parse asset index {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Invalid glob pattern built from a mount path
    #[error("Invalid mount pattern '{0}': {1}")]
    Pattern(String, glob::PatternError),
}

/// File-backed asset index.
#[derive(Debug, Clone, Default)]
pub struct AssetDatabase {
    entries: HashMap<String, AssetEntry>,
}

impl AssetDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a prebuilt index: a JSON object mapping uuid to [`AssetEntry`].
    ///
    /// Relative paths in the file are resolved against the file's directory.
    pub fn from_index_file(path: &Path) -> Result<Self, IndexError> {
        let contents = fs::read(path)
            .map_err(|source| IndexError::Io { path: path.to_path_buf(), source })?;
        let entries: HashMap<String, AssetEntry> = serde_json::from_slice(&contents)
            .map_err(|source| IndexError::Parse { path: path.to_path_buf(), source })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let entries = entries
            .into_iter()
            .map(|(uuid, mut entry)| {
                entry.path = base.join(&entry.path);
                entry.mount = base.join(&entry.mount);
                entry.import = entry.import.map(|p| base.join(p));
                (uuid, entry)
            })
            .collect();

        Ok(Self { entries })
    }

    /// Scan a Creator project: every `<mount>/**/*.meta` file registers its
    /// uuid and the uuids of its sub-assets. Imported documents are looked up
    /// under `<library>/imports/<first two uuid chars>/<uuid>.json`.
    pub fn scan(project_root: &Path, mounts: &[PathBuf], library: &Path) -> Result<Self, IndexError> {
        let mut db = Self::new();
        let library = project_root.join(library);

        for mount in mounts {
            let mount_dir = project_root.join(mount);
            let pattern = format!("{}/**/*.meta", mount_dir.display());
            let paths = glob::glob(&pattern).map_err(|e| IndexError::Pattern(pattern.clone(), e))?;

            for meta_path in paths.filter_map(|entry| entry.ok()) {
                db.register_meta(&meta_path, &mount_dir, &library);
            }
        }

        log::info!("asset index scan found {} uuids", db.len());
        Ok(db)
    }

    fn register_meta(&mut self, meta_path: &Path, mount: &Path, library: &Path) {
        let meta: Value = match fs::read(meta_path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| serde_json::from_slice(&bytes).map_err(|e| e.to_string()))
        {
            Ok(meta) => meta,
            Err(e) => {
                log::warn!("skipping unreadable meta file {}: {}", meta_path.display(), e);
                return;
            }
        };

        let Some(uuid) = meta.get("uuid").and_then(Value::as_str) else {
            log::debug!("meta file {} has no uuid", meta_path.display());
            return;
        };
        let asset_path = meta_path.with_extension("");
        let sub_metas = meta.get("subMetas").and_then(Value::as_object).cloned().unwrap_or_default();

        for sub in sub_metas.values() {
            if let Some(sub_uuid) = sub.get("uuid").and_then(Value::as_str) {
                let entry = AssetEntry::new(&asset_path, mount)
                    .with_import(imported_document(library, sub_uuid, &asset_path));
                self.entries.insert(sub_uuid.to_string(), entry);
            }
        }

        let entry = AssetEntry::new(&asset_path, mount)
            .with_import(imported_document(library, uuid, &asset_path))
            .with_sub_metas(sub_metas);
        self.entries.insert(uuid.to_string(), entry);
    }

    pub fn insert(&mut self, uuid: impl Into<String>, entry: AssetEntry) {
        self.entries.insert(uuid.into(), entry);
    }

    pub fn get(&self, uuid: &str) -> Option<&AssetEntry> {
        self.entries.get(uuid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Imported JSON document for a uuid, falling back to the raw asset file for
/// assets the editor does not import (plain textures, plists).
fn imported_document(library: &Path, uuid: &str, asset_path: &Path) -> PathBuf {
    let bucket: String = uuid.chars().take(2).collect();
    let imported = library.join("imports").join(bucket).join(format!("{}.json", uuid));
    if imported.exists() {
        imported
    } else {
        asset_path.to_path_buf()
    }
}

impl AssetIndex for AssetDatabase {
    fn asset_path(&self, uuid: &str) -> Option<PathBuf> {
        self.entries.get(uuid).map(|e| e.path.clone())
    }

    fn asset_mount(&self, uuid: &str) -> Option<PathBuf> {
        self.entries.get(uuid).map(|e| e.mount.clone())
    }

    fn import_path(&self, uuid: &str) -> Option<PathBuf> {
        self.entries.get(uuid).and_then(|e| e.import.clone())
    }

    fn sub_metas(&self, uuid: &str) -> Option<Map<String, Value>> {
        self.entries.get(uuid).map(|e| e.sub_metas.clone())
    }
}

/// In-memory asset index with an in-memory file system.
///
/// Counts file reads so callers can check how often sidecars are touched.
#[derive(Debug, Default)]
pub struct MemoryAssetIndex {
    entries: HashMap<String, AssetEntry>,
    files: HashMap<PathBuf, Vec<u8>>,
    reads: Cell<usize>,
}

impl MemoryAssetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_asset(&mut self, uuid: impl Into<String>, entry: AssetEntry) {
        self.entries.insert(uuid.into(), entry);
    }

    pub fn insert_file(&mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), contents.into());
    }

    /// Store a JSON document as a file.
    pub fn insert_json(&mut self, path: impl Into<PathBuf>, document: &Value) {
        self.insert_file(path, document.to_string());
    }

    /// Number of successful and failed `read_file` calls so far.
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }
}

impl AssetIndex for MemoryAssetIndex {
    fn asset_path(&self, uuid: &str) -> Option<PathBuf> {
        self.entries.get(uuid).map(|e| e.path.clone())
    }

    fn asset_mount(&self, uuid: &str) -> Option<PathBuf> {
        self.entries.get(uuid).map(|e| e.mount.clone())
    }

    fn import_path(&self, uuid: &str) -> Option<PathBuf> {
        self.entries.get(uuid).and_then(|e| e.import.clone())
    }

    fn sub_metas(&self, uuid: &str) -> Option<Map<String, Value>> {
        self.entries.get(uuid).map(|e| e.sub_metas.clone())
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.reads.set(self.reads.get() + 1);
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
        })
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> =
            self.files.keys().filter(|p| p.parent() == Some(path)).cloned().collect();
        if files.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ));
        }
        files.sort();
        Ok(files)
    }
}
