// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Memoization of functions through a cache.

use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Duration;

use diskette_fs::{DEFAULT_MAX_SIZE, Eviction, FileCache, FileCacheBuilder, LeastRecentlyUsed, OldestWritten, Postcard};
use diskette_tier::{CachePolicy, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tick::Clock;

/// Time-to-live used by [`ttl_cache`] when none is given.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// A function whose results are kept in a cache.
///
/// Calling it with arguments it has seen before returns the cached result
/// instead of running the function again. Results are keyed by the
/// arguments themselves or, with [`cached_with_key`], by a key derived from
/// them.
///
/// A miss runs the function and stores its result. Any other cache failure
/// is returned to the caller rather than hidden by recomputing.
///
/// # Examples
///
/// ```
/// use std::cell::Cell;
///
/// use diskette::{FileCache, cached};
///
/// # let dir = tempfile::tempdir()?;
/// let cache: FileCache<(u64, u64), u64> = FileCache::builder("gcd").base_dir(dir.path()).build()?;
/// let calls = Cell::new(0);
/// let gcd = cached(cache, |&(a, b): &(u64, u64)| {
///     calls.set(calls.get() + 1);
///     let (mut a, mut b) = (a, b);
///     while b != 0 {
///         (a, b) = (b, a % b);
///     }
///     a
/// });
///
/// assert_eq!(gcd.call(&(48, 18))?, 6);
/// assert_eq!(gcd.call(&(48, 18))?, 6);
/// assert_eq!(calls.get(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Memoized<S, F, KF> {
    cache: S,
    function: F,
    key: KF,
}

/// Memoizes `function` in `cache`, keyed by its arguments.
pub fn cached<S, F, A, V>(cache: S, function: F) -> Memoized<S, F, fn(&A) -> A>
where
    A: Clone,
    F: Fn(&A) -> V,
{
    Memoized {
        cache,
        function,
        key: A::clone,
    }
}

/// Memoizes `function` in `cache`, keyed by `key(args)`.
///
/// Useful when only part of the arguments identify the result, such as a
/// method whose receiver is irrelevant to the outcome.
///
/// # Examples
///
/// ```
/// use diskette::{FileCache, cached_with_key};
///
/// struct Request {
///     path: String,
///     trace_id: u64,
/// }
///
/// # let dir = tempfile::tempdir()?;
/// let cache: FileCache<String, usize> = FileCache::builder("lengths").base_dir(dir.path()).build()?;
/// let length = cached_with_key(cache, |r: &Request| r.path.clone(), |r: &Request| r.path.len());
///
/// let first = Request { path: "/index".into(), trace_id: 1 };
/// let second = Request { path: "/index".into(), trace_id: 2 };
/// assert_eq!(length.call(&first)?, 6);
/// assert_eq!(length.call(&second)?, 6);
/// # let _ = (first.trace_id, second.trace_id);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn cached_with_key<S, F, KF, A, K, V>(cache: S, key: KF, function: F) -> Memoized<S, F, KF>
where
    A: ?Sized,
    F: Fn(&A) -> V,
    KF: Fn(&A) -> K,
{
    Memoized { cache, function, key }
}

impl<S, F, KF> Memoized<S, F, KF> {
    /// Returns the cached result for the arguments, computing and storing it on a miss.
    ///
    /// # Errors
    ///
    /// Returns a corrupt or I/O error if the cached result cannot be read or
    /// the computed result cannot be stored. A miss is not an error.
    pub fn call<A, K, V>(&self, args: &A) -> Result<V>
    where
        A: ?Sized,
        F: Fn(&A) -> V,
        KF: Fn(&A) -> K,
        S: CachePolicy<K, V>,
    {
        let key = (self.key)(args);
        match self.cache.get(&key) {
            Ok(value) => return Ok(value),
            Err(error) if error.is_not_found() => {}
            Err(error) => return Err(error),
        }

        let value = (self.function)(args);
        self.cache.insert(&key, &value)?;
        Ok(value)
    }

    /// Returns the cache holding the results.
    #[must_use]
    pub fn cache(&self) -> &S {
        &self.cache
    }

    /// Consumes the memoized function and returns its cache.
    #[must_use]
    pub fn into_cache(self) -> S {
        self.cache
    }
}

impl<S: fmt::Debug, F, KF> fmt::Debug for Memoized<S, F, KF> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized").field("cache", &self.cache).finish_non_exhaustive()
    }
}

/// Settings for a file cache that is created when a function is wrapped.
///
/// Obtained from [`lru_cache`] or [`ttl_cache`]. The cache's key and value
/// types are only known once [`wrap`](Self::wrap) sees the function.
pub struct Memoizer<E> {
    name: String,
    max_size: u64,
    ttl: Option<Duration>,
    base_dir: Option<PathBuf>,
    clock: Option<Clock>,
    _eviction: PhantomData<fn() -> E>,
}

/// Memoizes functions in an [`LruFileCache`](diskette_fs::LruFileCache)
/// holding up to `max_size` results, evicting the least recently used first.
///
/// # Examples
///
/// ```
/// use diskette::{DEFAULT_MAX_SIZE, lru_cache};
///
/// # let dir = tempfile::tempdir()?;
/// let square = lru_cache("squares", DEFAULT_MAX_SIZE, None)
///     # .base_dir(dir.path())
///     .wrap(|n: &u64| n * n)?;
///
/// assert_eq!(square.call(&12)?, 144);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[must_use]
pub fn lru_cache(name: impl Into<String>, max_size: u64, ttl: Option<Duration>) -> Memoizer<LeastRecentlyUsed> {
    Memoizer::new(name.into(), max_size, ttl)
}

/// Memoizes functions in a [`FileCache`] holding up to `max_size` results for
/// `ttl` each, evicting the oldest result first.
///
/// # Examples
///
/// ```
/// use diskette::{DEFAULT_MAX_SIZE, DEFAULT_TTL, ttl_cache};
///
/// # let dir = tempfile::tempdir()?;
/// let shout = ttl_cache("shouts", DEFAULT_MAX_SIZE, DEFAULT_TTL)
///     # .base_dir(dir.path())
///     .wrap(|s: &String| s.to_uppercase())?;
///
/// assert_eq!(shout.call(&"hello".to_string())?, "HELLO");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[must_use]
pub fn ttl_cache(name: impl Into<String>, max_size: u64, ttl: Duration) -> Memoizer<OldestWritten> {
    Memoizer::new(name.into(), max_size, Some(ttl))
}

impl<E> Memoizer<E> {
    fn new(name: String, max_size: u64, ttl: Option<Duration>) -> Self {
        Self {
            name,
            max_size,
            ttl,
            base_dir: None,
            clock: None,
            _eviction: PhantomData,
        }
    }

    /// Sets the directory the cache directory is created in.
    #[must_use]
    pub fn base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Sets the clock that stamps entry times and decides expiry.
    #[must_use]
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Creates the cache and memoizes `function` in it, keyed by its arguments.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the cache directory cannot be created.
    pub fn wrap<A, V, F>(self, function: F) -> Result<Memoized<FileCache<A, V, Postcard, E>, F, fn(&A) -> A>>
    where
        A: Serialize + Clone,
        V: Serialize + DeserializeOwned,
        F: Fn(&A) -> V,
        E: Eviction,
    {
        Ok(cached(self.builder().build()?, function))
    }

    /// Creates the cache and memoizes `function` in it, keyed by `key(args)`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the cache directory cannot be created.
    pub fn wrap_with_key<A, K, V, F, KF>(self, key: KF, function: F) -> Result<Memoized<FileCache<K, V, Postcard, E>, F, KF>>
    where
        A: ?Sized,
        K: Serialize + Clone,
        V: Serialize + DeserializeOwned,
        F: Fn(&A) -> V,
        KF: Fn(&A) -> K,
        E: Eviction,
    {
        Ok(cached_with_key(self.builder().build()?, key, function))
    }

    fn builder<K, V>(self) -> FileCacheBuilder<K, V, Postcard, E> {
        let mut builder = FileCacheBuilder::new(self.name).max_size(self.max_size);
        if let Some(ttl) = self.ttl {
            builder = builder.ttl(ttl);
        }
        if let Some(base_dir) = self.base_dir {
            builder = builder.base_dir(base_dir);
        }
        if let Some(clock) = self.clock {
            builder = builder.clock(clock);
        }
        builder
    }
}

impl<E> Default for Memoizer<E> {
    /// A cache named `"memoized"` with default capacity and no expiry.
    fn default() -> Self {
        Self::new("memoized".to_string(), DEFAULT_MAX_SIZE, None)
    }
}

impl<E> fmt::Debug for Memoizer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoizer")
            .field("name", &self.name)
            .field("max_size", &self.max_size)
            .field("ttl", &self.ttl)
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use diskette_tier::testing::{MockStore, StoreOp};
    use diskette_tier::{CacheStore, ErrorKind};

    use super::*;

    #[test]
    fn hit_skips_the_function() {
        let calls = Cell::new(0);
        let double = cached(MockStore::<u32, u32>::new(), |n: &u32| {
            calls.set(calls.get() + 1);
            n * 2
        });

        assert_eq!(double.call(&4).unwrap(), 8);
        assert_eq!(double.call(&4).unwrap(), 8);
        assert_eq!(double.call(&5).unwrap(), 10);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn corrupt_entry_is_not_recomputed() {
        let store = MockStore::<u32, u32>::new();
        store.store(&4, &8).unwrap();
        store.fail_with(ErrorKind::Corrupt, |op| matches!(op, StoreOp::Load(_)));

        let calls = Cell::new(0);
        let double = cached(store, |n: &u32| {
            calls.set(calls.get() + 1);
            n * 2
        });

        assert_eq!(double.call(&4).unwrap_err().kind(), ErrorKind::Corrupt);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn store_failure_is_returned() {
        let store = MockStore::<u32, u32>::new();
        store.fail_when(|op| matches!(op, StoreOp::Store(_)));

        let double = cached(store, |n: &u32| n * 2);

        assert_eq!(double.call(&4).unwrap_err().kind(), ErrorKind::Io);
    }

    #[test]
    fn key_function_selects_cache_key() {
        let calls = Cell::new(0);
        let first_word = cached_with_key(
            MockStore::<String, usize>::new(),
            |s: &str| s.split_whitespace().next().unwrap_or_default().to_string(),
            |s: &str| {
                calls.set(calls.get() + 1);
                s.len()
            },
        );

        assert_eq!(first_word.call("hello world").unwrap(), 11);
        assert_eq!(first_word.call("hello there, friend").unwrap(), 11);
        assert_eq!(calls.get(), 1);
        assert!(first_word.cache().contains_key(&"hello".to_string()));
    }

    #[test]
    fn memoizer_defaults() {
        let memoizer = Memoizer::<OldestWritten>::default();
        assert_eq!(memoizer.name, "memoized");
        assert_eq!(memoizer.max_size, DEFAULT_MAX_SIZE);
        assert!(memoizer.ttl.is_none());
    }

    #[test]
    fn ttl_cache_sets_ttl() {
        let memoizer = ttl_cache("t", 3, DEFAULT_TTL);
        assert_eq!(memoizer.ttl, Some(Duration::from_secs(600)));
        assert_eq!(memoizer.max_size, 3);
    }
}
