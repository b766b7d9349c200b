// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Persistent, file-backed caches and memoization.
//!
//! This crate provides:
//! - [`FileCache`], a cache whose entries live as files and survive restarts
//! - Lazy time-to-live expiry and capacity-bounded eviction, oldest written or
//!   least recently used first
//! - Memoization of functions through any cache with [`cached`], or through a
//!   fresh file cache with [`lru_cache`] and [`ttl_cache`]
//!
//! # Examples
//!
//! ## Using a Cache Directly
//!
//! ```
//! use std::time::Duration;
//!
//! use diskette::{CachePolicy, FileCache};
//!
//! # let dir = tempfile::tempdir()?;
//! let cache: FileCache<String, Vec<u32>> = FileCache::builder("primes")
//!     .max_size(10)
//!     .ttl(Duration::from_secs(3600))
//!     .base_dir(dir.path())
//!     .build()?;
//!
//! cache.insert(&"small".to_string(), &vec![2, 3, 5, 7])?;
//! assert_eq!(cache.get(&"small".to_string())?, vec![2, 3, 5, 7]);
//! assert_eq!(cache.get_or(&"large".to_string(), Vec::new())?, Vec::<u32>::new());
//! # Ok::<(), diskette::Error>(())
//! ```
//!
//! ## Memoizing a Function
//!
//! ```
//! use diskette::{CachePolicy, DEFAULT_MAX_SIZE, lru_cache};
//!
//! # let dir = tempfile::tempdir()?;
//! let fib = lru_cache("fibonacci", DEFAULT_MAX_SIZE, None)
//!     # .base_dir(dir.path())
//!     .wrap(|&n: &u32| {
//!         let (mut a, mut b) = (0_u64, 1_u64);
//!         for _ in 0..n {
//!             (a, b) = (b, a + b);
//!         }
//!         a
//!     })?;
//!
//! assert_eq!(fib.call(&50)?, 12_586_269_025);
//! assert_eq!(fib.cache().len()?, 1);
//! # Ok::<(), diskette::Error>(())
//! ```
//!
//! # Features
//!
//! - `logs`: emits structured `tracing` events for cache operations.
//! - `serde`: enables [`FileCacheOptions`] for loading settings from
//!   configuration files.
//! - `test-util`: enables [`testing::MockStore`], an in-memory store with
//!   failure injection and a controllable clock.

mod memoize;

#[doc(inline)]
pub use diskette_fs::{
    Address, Codec, DEFAULT_MAX_SIZE, Eviction, FileCache, FileCacheBuilder, Json, LeastRecentlyUsed, LruFileCache, OldestWritten,
    Postcard, Timestamps,
};
#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
#[doc(inline)]
pub use diskette_fs::FileCacheOptions;
#[doc(inline)]
pub use diskette_tier::{CachePolicy, CacheStore, Error, ErrorKind, Result};
#[cfg(any(feature = "test-util", test))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
#[doc(inline)]
pub use diskette_tier::testing;
pub use memoize::{DEFAULT_TTL, Memoized, Memoizer, cached, cached_with_key, lru_cache, ttl_cache};
