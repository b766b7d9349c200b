// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A cache storing one file per entry.

use std::fmt;
use std::fs::{self, FileTimes, Metadata, OpenOptions};
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use diskette_tier::{CacheStore, Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tick::Clock;

use crate::address::Address;
use crate::builder::FileCacheBuilder;
use crate::codec::{Codec, Postcard};
use crate::eviction::{Eviction, LeastRecentlyUsed, OldestWritten, Timestamps};

pub(crate) type MissingHandler<K, V> = Arc<dyn Fn(&K) -> V + Send + Sync>;

/// Prefix and suffix of the temporary files a write goes through.
const TEMP_PREFIX: &str = ".";
const TEMP_SUFFIX: &str = ".tmp";

/// A persistent cache storing each entry as a file in its own directory.
///
/// Entries live at `<base_dir>/<name>/<digest>`, where the digest is derived
/// from the key (see [`Address::file_name`]). Each file holds the whole value
/// encoded with the codec `C`. Writes replace the file atomically. Expiry and
/// eviction use the file timestamps, which are stamped from the cache's
/// [`Clock`]: writes set both access and modification time, fresh reads set
/// the access time.
///
/// The cache operations themselves come from
/// [`CachePolicy`](diskette_tier::CachePolicy), which is implemented for every
/// [`CacheStore`].
///
/// By default the entry written longest ago is evicted first. Use
/// [`LruFileCache`] to evict the entry used longest ago instead.
///
/// # Examples
///
/// ```
/// use diskette_fs::FileCache;
/// use diskette_tier::CachePolicy;
///
/// # let dir = tempfile::tempdir()?;
/// let cache = FileCache::<String, Vec<u8>>::builder("thumbnails")
///     .max_size(2)
///     .base_dir(dir.path())
///     .build()?;
///
/// cache.insert(&"a.png".to_string(), &vec![1, 2, 3])?;
/// assert_eq!(cache.get(&"a.png".to_string())?, vec![1, 2, 3]);
/// assert!(cache.get(&"b.png".to_string()).unwrap_err().is_not_found());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct FileCache<K, V, C = Postcard, E = OldestWritten> {
    name: String,
    directory: PathBuf,
    max_size: u64,
    ttl: Option<Duration>,
    clock: Clock,
    codec: C,
    on_missing: Option<MissingHandler<K, V>>,
    _eviction: PhantomData<fn() -> E>,
}

/// A [`FileCache`] that evicts the least recently used entry first.
///
/// Reads of fresh entries count as uses, so an entry that is read regularly
/// survives entries written after it.
pub type LruFileCache<K, V, C = Postcard> = FileCache<K, V, C, LeastRecentlyUsed>;

impl<K, V, E> FileCache<K, V, Postcard, E> {
    /// Creates a builder for a cache stored in the subdirectory `name`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use diskette_fs::LruFileCache;
    ///
    /// # let dir = tempfile::tempdir()?;
    /// let cache = LruFileCache::<u64, String>::builder("lookups")
    ///     .max_size(1_000)
    ///     .ttl(Duration::from_secs(3600))
    ///     .base_dir(dir.path())
    ///     .build()?;
    /// assert_eq!(cache.name(), "lookups");
    /// # Ok::<(), diskette_tier::Error>(())
    /// ```
    #[must_use]
    pub fn builder(name: impl Into<String>) -> FileCacheBuilder<K, V, Postcard, E> {
        FileCacheBuilder::new(name)
    }
}

impl<K, V, C, E> FileCache<K, V, C, E> {
    pub(crate) fn from_parts(
        name: String,
        directory: PathBuf,
        max_size: u64,
        ttl: Option<Duration>,
        clock: Clock,
        codec: C,
        on_missing: Option<MissingHandler<K, V>>,
    ) -> Self {
        Self {
            name,
            directory,
            max_size,
            ttl,
            clock,
            codec,
            on_missing,
            _eviction: PhantomData,
        }
    }

    /// Returns the name of the cache, which is also its directory name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the directory holding the entry files.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the clock that stamps entry times and decides expiry.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }
}

impl<K, V, C, E> FileCache<K, V, C, E>
where
    K: Serialize + Clone,
{
    /// Returns the last time the entry was read or written.
    ///
    /// The later of the file's access and modification times is used, so
    /// filesystems mounted without access-time updates still order writes
    /// correctly. Inspecting an entry never changes this time.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the key is absent.
    pub fn access_time(&self, key: &K) -> Result<SystemTime> {
        Ok(self.timestamps(&Address::key(key.clone()))?.accessed)
    }

    /// Returns the last time the entry was written. Reads never change it.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the key is absent.
    pub fn modification_time(&self, key: &K) -> Result<SystemTime> {
        Ok(self.metadata(&Address::key(key.clone()))?.modified()?)
    }

    /// Returns the size the entry contributes towards the capacity: always 1.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the key is absent.
    pub fn entry_size(&self, key: &K) -> Result<u64> {
        self.metadata(&Address::key(key.clone())).map(|_| 1)
    }

    fn path(&self, address: &Address<K>) -> Result<PathBuf> {
        Ok(self.directory.join(address.file_name()?))
    }

    fn metadata(&self, address: &Address<K>) -> Result<Metadata> {
        let metadata = fs::metadata(self.path(address)?)?;
        if metadata.is_file() {
            Ok(metadata)
        } else {
            Err(Error::not_found())
        }
    }

    /// Lists the cache directory. A directory that vanished lists as empty.
    fn entries(&self) -> Result<Vec<io::Result<fs::DirEntry>>> {
        match fs::read_dir(&self.directory) {
            Ok(entries) => Ok(entries.collect()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(error) => Err(Error::io(error)),
        }
    }

    fn timestamps(&self, address: &Address<K>) -> Result<Timestamps> {
        let metadata = self.metadata(address)?;
        let modified = metadata.modified()?;
        let accessed = metadata.accessed()?.max(modified);
        Ok(Timestamps { accessed, modified })
    }
}

impl<K, V, C, E> CacheStore<K, V> for FileCache<K, V, C, E>
where
    K: Serialize + Clone,
    V: Serialize + DeserializeOwned,
    C: Codec,
    E: Eviction,
{
    type Handle = Address<K>;
    type Weight = SystemTime;

    fn locate(&self, key: &K) -> Address<K> {
        Address::key(key.clone())
    }

    fn handles(&self) -> Result<Vec<Address<K>>> {
        let mut handles = Vec::new();
        for entry in self.entries()? {
            let entry = entry.map_err(Error::io)?;
            // Names that are not UTF-8 were not written by this cache.
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if file_name.starts_with(TEMP_PREFIX) {
                continue;
            }
            if entry.file_type().is_ok_and(|file_type| file_type.is_file()) {
                handles.push(Address::stored(file_name));
            }
        }
        Ok(handles)
    }

    fn exists(&self, handle: &Address<K>) -> bool {
        self.metadata(handle).is_ok()
    }

    fn load(&self, handle: &Address<K>) -> Result<V> {
        let bytes = fs::read(self.path(handle)?)?;
        self.codec.decode(&bytes)
    }

    fn store(&self, handle: &Address<K>, value: &V) -> Result<()> {
        let path = self.path(handle)?;
        let bytes = self.codec.encode(value)?;

        let mut file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.directory)
            .map_err(Error::io)?;
        file.write_all(&bytes).map_err(Error::io)?;

        let now = self.now();
        file.as_file()
            .set_times(FileTimes::new().set_accessed(now).set_modified(now))
            .map_err(Error::io)?;
        match file.persist(&path) {
            Ok(_) => Ok(()),
            // A concurrent clear discarded the pending write.
            Err(error) if error.error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(Error::io(error.error)),
        }
    }

    fn unlink(&self, handle: &Address<K>) -> Result<()> {
        Ok(fs::remove_file(self.path(handle)?)?)
    }

    fn modified_at(&self, handle: &Address<K>) -> Result<SystemTime> {
        Ok(self.metadata(handle)?.modified()?)
    }

    fn weight_of(&self, handle: &Address<K>) -> Result<SystemTime> {
        Ok(E::weight(&self.timestamps(handle)?))
    }

    fn size_of(&self, handle: &Address<K>) -> Result<u64> {
        self.metadata(handle).map(|_| 1)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn max_size(&self) -> u64 {
        self.max_size
    }

    fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn now(&self) -> SystemTime {
        self.clock.system_time()
    }

    fn touch(&self, handle: &Address<K>) -> Result<()> {
        let file = OpenOptions::new().write(true).open(self.path(handle)?)?;
        file.set_times(FileTimes::new().set_accessed(self.now()))?;
        Ok(())
    }

    fn discard_partial(&self) -> Result<()> {
        for entry in self.entries()? {
            let entry = entry.map_err(Error::io)?;
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if !file_name.starts_with(TEMP_PREFIX) || !file_name.ends_with(TEMP_SUFFIX) {
                continue;
            }
            if !entry.file_type().is_ok_and(|file_type| file_type.is_file()) {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => {}
                Err(error) if error.kind() == io::ErrorKind::NotFound => {}
                Err(error) => return Err(Error::io(error)),
            }
        }
        Ok(())
    }

    fn on_missing(&self, key: &K) -> Option<V> {
        self.on_missing.as_ref().map(|handler| handler(key))
    }
}

impl<K, V, C: Clone, E> Clone for FileCache<K, V, C, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            directory: self.directory.clone(),
            max_size: self.max_size,
            ttl: self.ttl,
            clock: self.clock.clone(),
            codec: self.codec.clone(),
            on_missing: self.on_missing.clone(),
            _eviction: PhantomData,
        }
    }
}

impl<K, V, C: fmt::Debug, E> fmt::Debug for FileCache<K, V, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileCache")
            .field("name", &self.name)
            .field("directory", &self.directory)
            .field("max_size", &self.max_size)
            .field("ttl", &self.ttl)
            .field("codec", &self.codec)
            .field("on_missing", &self.on_missing.is_some())
            .finish_non_exhaustive()
    }
}
