// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::SystemTime,
};

use fetchlon_tier::{Cache, DynamicCacheExt, Error};
use xxhash_rust::xxh3::xxh3_64;

use crate::registry::{BackendBuilder, CacheSettings, RawCache};

/// Smallest byte bound a disk cache accepts.
pub const MIN_DISK_SIZE: u64 = 1024;

/// Byte bound used when the settings declare none.
pub const DEFAULT_DISK_SIZE: u64 = 10 * 1024 * 1024;

const MAX_FILE_NAME_LEN: usize = 64;
const HASH_SUFFIX_LEN: usize = 17;

/// Builds [`DiskCache`] backends under a root directory.
///
/// The cache named `NAME` lives in `<root>/NAME.lru`. The built caches do their I/O on
/// Tokio's blocking pool; see [`DiskCache`].
#[derive(Clone, Debug)]
pub struct DiskBackendBuilder {
    root: PathBuf,
}

impl DiskBackendBuilder {
    /// Creates a builder that places cache directories under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory used for the cache named `name`.
    #[must_use]
    pub fn directory_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.lru"))
    }
}

impl BackendBuilder for DiskBackendBuilder {
    fn build(&self, settings: &CacheSettings) -> Result<RawCache, Error> {
        let size = settings.size().unwrap_or(DEFAULT_DISK_SIZE);
        DiskCache::open(self.directory_for(settings.name()), size).map(DynamicCacheExt::into_dynamic)
    }
}

/// Persistent store keeping one file per key.
///
/// File names are restricted to `[a-z0-9_-]` and at most 64 characters: a readable prefix of
/// the key followed by its 64-bit hash. When the directory grows beyond the byte bound, the
/// oldest files are removed until it fits again.
///
/// Operations run on Tokio's blocking pool. Outside a Tokio runtime every operation fails
/// with a storage error, which the decorators and the coordinator treat as a miss.
#[derive(Clone, Debug)]
pub struct DiskCache {
    directory: PathBuf,
    max_size: u64,
    // Approximate byte total of the directory. Trimming rescans and resets it.
    usage: Arc<AtomicU64>,
}

impl DiskCache {
    /// Opens or creates a disk cache in `directory` bounded to `max_size` bytes.
    ///
    /// Bounds below [`MIN_DISK_SIZE`] are raised to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(directory: impl Into<PathBuf>, max_size: u64) -> Result<Self, Error> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory).map_err(Error::from_message)?;
        let usage = existing_usage(&directory).map_err(Error::from_message)?;

        Ok(Self {
            directory,
            max_size: max_size.max(MIN_DISK_SIZE),
            usage: Arc::new(AtomicU64::new(usage)),
        })
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the byte bound.
    #[must_use]
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Returns the tracked byte total of the directory.
    #[must_use]
    pub fn usage(&self) -> u64 {
        self.usage.load(Ordering::Relaxed)
    }

    /// Maps a key to the file name that stores it.
    #[must_use]
    pub fn file_name(key: &str) -> String {
        let readable: String = key
            .chars()
            .flat_map(char::to_lowercase)
            .map(|c| {
                if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .take(MAX_FILE_NAME_LEN - HASH_SUFFIX_LEN)
            .collect();

        format!("{readable}-{:016x}", xxh3_64(key.as_bytes()))
    }

    fn path(&self, key: &str) -> PathBuf {
        self.directory.join(Self::file_name(key))
    }

    async fn files(&self) -> Result<Vec<(PathBuf, u64, SystemTime)>, Error> {
        let mut entries = tokio::fs::read_dir(&self.directory).await.map_err(Error::from_message)?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(Error::from_message)? {
            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(error) if error.kind() == ErrorKind::NotFound => continue,
                Err(error) => return Err(Error::from_message(error)),
            };
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((entry.path(), metadata.len(), modified));
        }

        Ok(files)
    }

    async fn trim(&self) -> Result<(), Error> {
        let mut files = self.files().await?;
        let mut total: u64 = files.iter().map(|(_, len, _)| len).sum();

        if total > self.max_size {
            files.sort_by_key(|(_, _, modified)| *modified);
            for (path, len, _) in files {
                if total <= self.max_size {
                    break;
                }
                remove_if_present(&path).await?;
                total = total.saturating_sub(len);
            }
        }

        self.usage.store(total, Ordering::Relaxed);
        Ok(())
    }

    fn shrink_usage(&self, len: u64) {
        // The closure always returns `Some`, so the update cannot fail.
        let _ = self
            .usage
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |usage| Some(usage.saturating_sub(len)));
    }
}

fn require_runtime() -> Result<(), Error> {
    match tokio::runtime::Handle::try_current() {
        Ok(_) => Ok(()),
        Err(error) => Err(Error::from_message(error)),
    }
}

fn existing_usage(directory: &Path) -> std::io::Result<u64> {
    let mut total = 0;
    for entry in std::fs::read_dir(directory)? {
        let metadata = entry?.metadata()?;
        if metadata.is_file() {
            total += metadata.len();
        }
    }
    Ok(total)
}

async fn file_len(path: &Path) -> Result<u64, Error> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.len()),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(0),
        Err(error) => Err(Error::from_message(error)),
    }
}

async fn remove_if_present(path: &Path) -> Result<(), Error> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        Err(error) => Err(Error::from_message(error)),
    }
}

impl Cache<String, String> for DiskCache {
    async fn get(&self, key: &String) -> Result<Option<String>, Error> {
        require_runtime()?;
        match tokio::fs::read_to_string(self.path(key)).await {
            Ok(text) => Ok(Some(text)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(Error::from_message(error)),
        }
    }

    async fn set(&self, key: &String, value: String) -> Result<(), Error> {
        require_runtime()?;
        let path = self.path(key);
        let replaced = file_len(&path).await?;
        let written = value.len() as u64;
        tokio::fs::write(&path, value).await.map_err(Error::from_message)?;

        self.shrink_usage(replaced);
        if self.usage.fetch_add(written, Ordering::Relaxed).saturating_add(written) > self.max_size {
            self.trim().await?;
        }
        Ok(())
    }

    async fn evict(&self, key: &String) -> Result<(), Error> {
        require_runtime()?;
        let path = self.path(key);
        let len = file_len(&path).await?;
        remove_if_present(&path).await?;
        self.shrink_usage(len);
        Ok(())
    }

    async fn evict_all(&self) -> Result<(), Error> {
        require_runtime()?;
        for (path, _, _) in self.files().await? {
            remove_if_present(&path).await?;
        }
        self.usage.store(0, Ordering::Relaxed);
        Ok(())
    }
}
