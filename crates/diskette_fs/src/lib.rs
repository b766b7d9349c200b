// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Filesystem storage for persistent caches.
//!
//! [`FileCache`] keeps every entry in its own file under
//! `<base_dir>/<name>/`, so cached values survive process restarts. It
//! implements [`CacheStore`](diskette_tier::CacheStore) and therefore gets
//! every [`CachePolicy`](diskette_tier::CachePolicy) operation: lazy
//! time-to-live expiry, capacity-bounded eviction, defaults and clearing.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use diskette_fs::LruFileCache;
//! use diskette_tier::CachePolicy;
//!
//! # let dir = tempfile::tempdir()?;
//! let cache = LruFileCache::<(String, u32), String>::builder("pages")
//!     .max_size(100)
//!     .ttl(Duration::from_secs(300))
//!     .base_dir(dir.path())
//!     .build()?;
//!
//! let key = ("https://example.com".to_string(), 2);
//! cache.insert(&key, &"<html>...</html>".to_string())?;
//! assert!(cache.contains(&key));
//! assert_eq!(cache.pop(&key, None)?, "<html>...</html>");
//! assert!(cache.is_empty()?);
//! # Ok::<(), diskette_tier::Error>(())
//! ```
//!
//! # Storage Layout
//!
//! Each entry is a regular file named by the 128-bit `xxh3` digest of the
//! key's `postcard` encoding and holds only the encoded value. There is no
//! index: the directory listing is the set of entries and the file
//! timestamps are their metadata. Writes go through a hidden temporary file
//! that is renamed into place, so readers never observe a partial entry.
//!
//! Distinct keys with the same digest share a file. With 128-bit digests this
//! is not a practical concern.
//!
//! The cache does not coordinate between processes. Concurrent writers to the
//! same key race and the last rename wins; an entry that disappears between
//! two steps of an operation is treated as a miss.
//!
//! # Features
//!
//! - `logs`: emits structured `tracing` events for cache operations.
//! - `serde`: enables [`FileCacheOptions`] for loading settings from
//!   configuration files.

mod address;
mod builder;
mod cache;
mod codec;
mod eviction;
#[cfg(feature = "serde")]
mod options;

pub use address::Address;
pub use builder::{DEFAULT_MAX_SIZE, FileCacheBuilder};
pub use cache::{FileCache, LruFileCache};
pub use codec::{Codec, Json, Postcard};
pub use eviction::{Eviction, LeastRecentlyUsed, OldestWritten, Timestamps};
#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
pub use options::FileCacheOptions;
