//! JSON file directory store built on capability-based filesystem access.
//!
//! All directories live in one record inside a single directory handle:
//! a JSON object mapping page instance id to `{tools, resources, prompts}`.
//! Every mutation rewrites the record through a temporary file and a rename.
//! File access runs on the blocking thread pool.

use crate::capability::domain::{CapabilityDirectory, PageInstanceId};
use crate::config::BridgeConfig;
use crate::router::ports::{DirectoryStore, DirectoryStoreError, DirectoryStoreResult};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::sync::{Arc, Mutex};

type Record = BTreeMap<PageInstanceId, CapabilityDirectory>;

/// Directory store persisting a single JSON record on disk.
#[derive(Debug, Clone)]
pub struct JsonFileDirectoryStore {
    dir: Arc<Mutex<Dir>>,
    record: Utf8PathBuf,
}

impl JsonFileDirectoryStore {
    /// Opens a store writing `record` inside the directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryStoreError::Persistence`] when the directory
    /// cannot be opened.
    pub fn open(path: &Utf8Path, record: impl Into<Utf8PathBuf>) -> DirectoryStoreResult<Self> {
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .map_err(DirectoryStoreError::persistence)?;
        Ok(Self {
            dir: Arc::new(Mutex::new(dir)),
            record: record.into(),
        })
    }

    /// Opens a store using the record name from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryStoreError::Persistence`] when the directory
    /// cannot be opened.
    pub fn from_config(path: &Utf8Path, config: &BridgeConfig) -> DirectoryStoreResult<Self> {
        Self::open(path, config.store_record.as_str())
    }

    /// Returns the record file name.
    #[must_use]
    pub fn record(&self) -> &Utf8Path {
        &self.record
    }

    async fn run_blocking<F, T>(&self, operation: F) -> DirectoryStoreResult<T>
    where
        F: FnOnce(&Dir, &Utf8Path) -> DirectoryStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        let record = self.record.clone();
        tokio::task::spawn_blocking(move || {
            let handle = dir.lock().map_err(|err| {
                DirectoryStoreError::persistence(std::io::Error::other(err.to_string()))
            })?;
            operation(&handle, &record)
        })
        .await
        .map_err(DirectoryStoreError::persistence)?
    }
}

fn read_record(dir: &Dir, record: &Utf8Path) -> DirectoryStoreResult<Record> {
    let contents = match dir.read_to_string(record) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Record::new()),
        Err(err) => return Err(DirectoryStoreError::persistence(err)),
    };
    if contents.trim().is_empty() {
        return Ok(Record::new());
    }
    serde_json::from_str(&contents).map_err(DirectoryStoreError::invalid_persisted_data)
}

fn write_record(dir: &Dir, record: &Utf8Path, directories: &Record) -> DirectoryStoreResult<()> {
    let contents =
        serde_json::to_vec_pretty(directories).map_err(DirectoryStoreError::persistence)?;
    let staging = Utf8PathBuf::from(format!("{record}.tmp"));
    dir.write(&staging, contents)
        .map_err(DirectoryStoreError::persistence)?;
    dir.rename(&staging, dir, record)
        .map_err(DirectoryStoreError::persistence)
}

#[async_trait]
impl DirectoryStore for JsonFileDirectoryStore {
    async fn load_all(&self) -> DirectoryStoreResult<Record> {
        self.run_blocking(read_record).await
    }

    async fn load(
        &self,
        page: &PageInstanceId,
    ) -> DirectoryStoreResult<Option<CapabilityDirectory>> {
        let key = page.clone();
        self.run_blocking(move |dir, record| Ok(read_record(dir, record)?.remove(&key)))
            .await
    }

    async fn save(
        &self,
        page: &PageInstanceId,
        directory: &CapabilityDirectory,
    ) -> DirectoryStoreResult<()> {
        let key = page.clone();
        let entry = directory.clone();
        self.run_blocking(move |dir, record| {
            let mut directories = read_record(dir, record)?;
            directories.insert(key, entry);
            write_record(dir, record, &directories)
        })
        .await
    }

    async fn remove(&self, page: &PageInstanceId) -> DirectoryStoreResult<bool> {
        let key = page.clone();
        self.run_blocking(move |dir, record| {
            let mut directories = read_record(dir, record)?;
            if directories.remove(&key).is_none() {
                return Ok(false);
            }
            write_record(dir, record, &directories)?;
            Ok(true)
        })
        .await
    }
}
