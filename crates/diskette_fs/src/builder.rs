// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring file caches.

use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use diskette_tier::{Error, Result};
use tick::Clock;
use tick::runtime::InactiveClock;

use crate::cache::{FileCache, MissingHandler};
use crate::codec::Postcard;
use crate::eviction::{LeastRecentlyUsed, OldestWritten};

/// Capacity of a cache whose size was not configured.
pub const DEFAULT_MAX_SIZE: u64 = 128;

/// Builder for configuring a [`FileCache`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use diskette_fs::{FileCache, Json};
///
/// # let dir = tempfile::tempdir()?;
/// let cache: FileCache<String, f64, Json> = FileCache::builder("rates")
///     .max_size(500)
///     .ttl(Duration::from_secs(600))
///     .codec(Json)
///     .base_dir(dir.path())
///     .build()?;
/// # Ok::<(), diskette_tier::Error>(())
/// ```
pub struct FileCacheBuilder<K, V, C = Postcard, E = OldestWritten> {
    name: String,
    max_size: u64,
    ttl: Option<Duration>,
    base_dir: Option<PathBuf>,
    clock: Option<Clock>,
    codec: C,
    on_missing: Option<MissingHandler<K, V>>,
    _eviction: PhantomData<fn() -> E>,
}

impl<K, V, E> FileCacheBuilder<K, V, Postcard, E> {
    /// Creates a builder with default settings.
    ///
    /// The default configuration holds up to [`DEFAULT_MAX_SIZE`] entries
    /// that never expire, encoded with [`Postcard`] in the per-user cache
    /// directory, timed by the system clock.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_size: DEFAULT_MAX_SIZE,
            ttl: None,
            base_dir: None,
            clock: None,
            codec: Postcard,
            on_missing: None,
            _eviction: PhantomData,
        }
    }
}

impl<K, V, C, E> FileCacheBuilder<K, V, C, E> {
    /// Sets the capacity ceiling in entries.
    ///
    /// Every write evicts the lowest-weight entries until at most this many
    /// remain. Zero makes every write evict itself.
    #[must_use]
    pub fn max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets the time-to-live of entries, measured from their last write.
    ///
    /// Stale entries are deleted when read and swept on every write.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets the directory the cache directory is created in.
    ///
    /// Defaults to the per-user cache directory of the platform, such as
    /// `~/.cache` on Linux.
    #[must_use]
    pub fn base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Sets the clock that stamps entry times and decides expiry.
    ///
    /// Defaults to the system clock. Tests can pass a clock obtained from
    /// `tick::ClockControl` to control time.
    #[must_use]
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Installs a handler that synthesizes values for missing keys, used by
    /// [`resolve_missing`](diskette_tier::CachePolicy::resolve_missing).
    #[must_use]
    pub fn on_missing<F>(mut self, handler: F) -> Self
    where
        F: Fn(&K) -> V + Send + Sync + 'static,
    {
        self.on_missing = Some(Arc::new(handler));
        self
    }

    /// Sets the format values are stored in.
    #[must_use]
    pub fn codec<C2>(self, codec: C2) -> FileCacheBuilder<K, V, C2, E> {
        FileCacheBuilder {
            name: self.name,
            max_size: self.max_size,
            ttl: self.ttl,
            base_dir: self.base_dir,
            clock: self.clock,
            codec,
            on_missing: self.on_missing,
            _eviction: PhantomData,
        }
    }

    /// Evicts the least recently used entry first instead of the oldest written.
    #[must_use]
    pub fn lru(self) -> FileCacheBuilder<K, V, C, LeastRecentlyUsed> {
        FileCacheBuilder {
            name: self.name,
            max_size: self.max_size,
            ttl: self.ttl,
            base_dir: self.base_dir,
            clock: self.clock,
            codec: self.codec,
            on_missing: self.on_missing,
            _eviction: PhantomData,
        }
    }

    /// Creates the cache directory if needed and returns the cache.
    ///
    /// An existing directory, including its entries, is reused.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the name does not denote a subdirectory, no
    /// base directory was given and the platform has no per-user cache
    /// directory, or the directory cannot be created.
    pub fn build(self) -> Result<FileCache<K, V, C, E>> {
        if self.name.is_empty() || self.name == "." || self.name == ".." {
            return Err(Error::io(format!("cache name {:?} does not denote a subdirectory", self.name)));
        }

        let base_dir = match self.base_dir {
            Some(base_dir) => base_dir,
            None => dirs::cache_dir().ok_or_else(|| Error::io("no per-user cache directory on this platform"))?,
        };
        let directory = base_dir.join(&self.name);
        fs::create_dir_all(&directory).map_err(Error::io)?;

        let clock = self.clock.unwrap_or_else(|| InactiveClock::default().activate().0);

        Ok(FileCache::from_parts(
            self.name,
            directory,
            self.max_size,
            self.ttl,
            clock,
            self.codec,
            self.on_missing,
        ))
    }
}

impl<K, V, C: fmt::Debug, E> fmt::Debug for FileCacheBuilder<K, V, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileCacheBuilder")
            .field("name", &self.name)
            .field("max_size", &self.max_size)
            .field("ttl", &self.ttl)
            .field("base_dir", &self.base_dir)
            .field("codec", &self.codec)
            .field("on_missing", &self.on_missing.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use diskette_tier::ErrorKind;

    use super::*;

    #[test]
    fn defaults() {
        let builder = FileCacheBuilder::<String, i32, Postcard, OldestWritten>::new("defaults");
        assert_eq!(builder.max_size, DEFAULT_MAX_SIZE);
        assert!(builder.ttl.is_none());
        assert!(builder.base_dir.is_none());
        assert!(builder.clock.is_none());
    }

    #[test]
    fn build_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("does").join("not").join("exist");
        let cache: FileCache<String, i32> = FileCache::builder("nested").base_dir(&base).build().unwrap();

        assert_eq!(cache.directory(), base.join("nested"));
        assert!(cache.directory().is_dir());
    }

    #[test]
    fn build_reuses_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("existing")).unwrap();
        fs::write(dir.path().join("existing").join("entry"), b"kept").unwrap();

        let cache: FileCache<String, i32> = FileCache::builder("existing").base_dir(dir.path()).build().unwrap();

        assert!(cache.directory().join("entry").exists());
    }

    #[test]
    fn build_fails_when_directory_cannot_be_created() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"a file, not a directory").unwrap();

        let error = FileCache::<String, i32>::builder("cache")
            .base_dir(&blocker)
            .build()
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Io);
    }

    #[test]
    fn build_rejects_names_outside_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["", ".", ".."] {
            let error = FileCache::<String, i32>::builder(name)
                .base_dir(dir.path())
                .build()
                .unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Io, "name: {name:?}");
        }
    }

    #[test]
    fn debug_lists_settings() {
        let builder = FileCache::<String, i32>::builder("debug").max_size(3);
        let debug = format!("{builder:?}");
        assert!(debug.contains("max_size: 3"), "got: {debug}");
    }
}
