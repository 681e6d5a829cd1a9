//! JSON file backed record store.
//!
//! # Responsibility
//! - Keep the composite-key index in memory.
//! - Rewrite the whole backing file on every flush.
//! - Rebuild records of the right kind on load.
//!
//! # Invariants
//! - Flush writes a sibling temp file and renames it over the target, so a
//!   crash mid-write never leaves a truncated store.
//! - Load never silently drops entries: any invalid entry fails the load.
//!
//! # See also
//! - `Record::to_export` / `Record::from_export` for the per-record shape.

use super::{RecordStore, StoreError, StoreResult};
use crate::model::record::Record;
use crate::model::registry::EntityRegistry;
use log::{error, info, warn};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Record index mirrored to one JSON file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    objects: HashMap<String, Record>,
}

impl FileStorage {
    /// Creates an empty index bound to `path`. Nothing is read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            objects: HashMap::new(),
        }
    }

    /// Creates a store bound to `path` and loads it.
    ///
    /// # Errors
    /// - Any load failure other than a missing file.
    pub fn open(path: impl Into<PathBuf>, registry: &EntityRegistry) -> StoreResult<Self> {
        let mut storage = Self::new(path);
        storage.load(registry)?;
        Ok(storage)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Reads the backing file and registers every stored record.
    ///
    /// Returns the number of records loaded. A missing file loads nothing;
    /// a blank file is treated the same way.
    ///
    /// # Errors
    /// - `Io` when the file exists but cannot be read.
    /// - `Json` when it is not JSON, `Corrupt` when it is not an object of
    ///   objects, `InvalidRecord` when one entry cannot be rebuilt.
    pub fn load(&mut self, registry: &EntityRegistry) -> StoreResult<usize> {
        let started_at = Instant::now();
        info!("event=store_load module=storage status=start");

        let result = self.load_inner(registry);
        match &result {
            Ok(count) => info!(
                "event=store_load module=storage status=ok records={} duration_ms={}",
                count,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=store_load module=storage status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn load_inner(&mut self, registry: &EntityRegistry) -> StoreResult<usize> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("event=store_load module=storage status=absent");
                return Ok(0);
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            warn!("event=store_load module=storage status=blank");
            return Ok(0);
        }

        let root: Value = serde_json::from_str(&content)?;
        let Value::Object(entries) = root else {
            return Err(StoreError::Corrupt(
                "top-level value must be an object keyed by `Kind.id`".to_string(),
            ));
        };

        let mut loaded = Vec::with_capacity(entries.len());
        for (key, value) in &entries {
            let Value::Object(exported) = value else {
                return Err(StoreError::Corrupt(format!("entry `{key}` is not an object")));
            };
            let record = Record::from_export(registry, exported).map_err(|source| {
                StoreError::InvalidRecord {
                    key: key.clone(),
                    source,
                }
            })?;
            loaded.push(record);
        }

        // Register only after every entry decoded, so a bad file leaves the
        // index untouched.
        let count = loaded.len();
        for record in loaded {
            self.register(record);
        }
        Ok(count)
    }

    fn serialize(&self) -> StoreResult<String> {
        let mut root = Map::new();
        for record in self.list(None) {
            root.insert(record.key(), Value::Object(record.to_export()));
        }
        Ok(serde_json::to_string(&Value::Object(root))?)
    }

    fn write_atomically(&self, content: &str) -> StoreResult<()> {
        let temp_path = temp_path_for(&self.path);
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StoreError::Io { path, source }
        };

        {
            let mut file = fs::File::create(&temp_path).map_err(io_error(&temp_path))?;
            file.write_all(content.as_bytes())
                .map_err(io_error(&temp_path))?;
            file.sync_all().map_err(io_error(&temp_path))?;
        }

        if let Err(err) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(StoreError::Io {
                path: self.path.clone(),
                source: err,
            });
        }
        Ok(())
    }
}

impl RecordStore for FileStorage {
    fn all(&self) -> &HashMap<String, Record> {
        &self.objects
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Record> {
        self.objects.get_mut(key)
    }

    fn register(&mut self, record: Record) {
        self.objects.insert(record.key(), record);
    }

    fn remove(&mut self, key: &str) -> Option<Record> {
        self.objects.remove(key)
    }

    fn flush(&self) -> StoreResult<()> {
        let started_at = Instant::now();
        let result = self
            .serialize()
            .and_then(|content| self.write_atomically(&content));

        match &result {
            Ok(()) => info!(
                "event=store_flush module=storage status=ok records={} duration_ms={}",
                self.objects.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=store_flush module=storage status=error records={} duration_ms={} error={}",
                self.objects.len(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    path.with_file_name(format!(".{file_name}.tmp"))
}
