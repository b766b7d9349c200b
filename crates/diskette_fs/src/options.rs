// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Loadable cache configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::builder::{DEFAULT_MAX_SIZE, FileCacheBuilder};

/// Cache settings in a form that can be read from a configuration file.
///
/// Only `name` is required. Unknown fields are rejected so that typos do not
/// silently fall back to defaults.
///
/// # Examples
///
/// ```
/// use diskette_fs::{FileCache, FileCacheOptions};
///
/// let options: FileCacheOptions = serde_json::from_str(
///     r#"{ "name": "avatars", "max_size": 64, "ttl_secs": 3600 }"#,
/// )?;
/// # let dir = tempfile::tempdir()?;
/// # let options = FileCacheOptions { base_dir: Some(dir.path().to_path_buf()), ..options };
///
/// let cache: FileCache<String, Vec<u8>> = options.builder().build()?;
/// assert_eq!(cache.name(), "avatars");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileCacheOptions {
    /// Name of the cache and of its directory.
    pub name: String,
    /// Capacity ceiling in entries.
    #[serde(default = "default_max_size")]
    pub max_size: u64,
    /// Time-to-live of entries in seconds. Entries never expire if absent.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
    /// Directory the cache directory is created in. The per-user cache
    /// directory if absent.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
}

fn default_max_size() -> u64 {
    DEFAULT_MAX_SIZE
}

impl FileCacheOptions {
    /// Creates options for the named cache with every other setting at its default.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_size: DEFAULT_MAX_SIZE,
            ttl_secs: None,
            base_dir: None,
        }
    }

    /// Returns the time-to-live, if entries expire.
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }

    /// Returns a builder configured with these options.
    ///
    /// Settings that cannot be expressed in a configuration file, such as the
    /// clock, the codec or the eviction order, can still be changed on the
    /// returned builder.
    #[must_use]
    pub fn builder<K, V>(&self) -> FileCacheBuilder<K, V> {
        let mut builder = FileCacheBuilder::new(self.name.clone()).max_size(self.max_size);
        if let Some(ttl) = self.ttl() {
            builder = builder.ttl(ttl);
        }
        if let Some(base_dir) = &self.base_dir {
            builder = builder.base_dir(base_dir.clone());
        }
        builder
    }
}
