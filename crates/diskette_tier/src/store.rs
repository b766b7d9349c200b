// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The storage contract that cache backends implement.
//!
//! [`CacheStore`] exposes raw storage primitives addressed by a backend-specific
//! handle. Expiry and capacity are not its concern; they are decided by
//! [`CachePolicy`](crate::CachePolicy) for every backend.

use std::time::{Duration, SystemTime};

use crate::Result;

/// Trait for cache storage backends.
///
/// A backend maps keys to handles with [`locate`](Self::locate) and enumerates
/// the handles of everything it holds with [`handles`](Self::handles). Handles
/// produced by enumeration are not required to carry the original key, so every
/// primitive accepts a handle rather than a key.
///
/// All primitives that address a single entry fail with
/// [`ErrorKind::NotFound`](crate::ErrorKind::NotFound) when the entry is absent.
/// [`store`](Self::store) and [`load`](Self::load) must not apply any policy:
/// no expiry check on load, no capacity enforcement on store.
pub trait CacheStore<K, V> {
    /// Opaque reference to one stored entry.
    type Handle: Clone;

    /// Eviction order. Entries with the lowest weight are evicted first.
    type Weight: Ord;

    /// Resolves a key to the handle of its entry, whether or not it exists.
    fn locate(&self, key: &K) -> Self::Handle;

    /// Returns handles for every entry present when the call begins.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be enumerated.
    fn handles(&self) -> Result<Vec<Self::Handle>>;

    /// Returns `true` if the entry exists. Never fails.
    fn exists(&self, handle: &Self::Handle) -> bool;

    /// Reads and decodes the entry.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for a missing entry and a corrupt error when
    /// the stored bytes cannot be decoded.
    fn load(&self, handle: &Self::Handle) -> Result<V>;

    /// Encodes the value and replaces the entry as a whole.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded or written.
    fn store(&self, handle: &Self::Handle, value: &V) -> Result<()>;

    /// Removes the entry.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for a missing entry.
    fn unlink(&self, handle: &Self::Handle) -> Result<()>;

    /// Returns the time the entry was last written.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for a missing entry.
    fn modified_at(&self, handle: &Self::Handle) -> Result<SystemTime>;

    /// Returns the eviction weight of the entry.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for a missing entry.
    fn weight_of(&self, handle: &Self::Handle) -> Result<Self::Weight>;

    /// Returns the size the entry contributes towards [`max_size`](Self::max_size).
    ///
    /// # Errors
    ///
    /// Returns a not-found error for a missing entry.
    fn size_of(&self, handle: &Self::Handle) -> Result<u64>;

    /// Returns the name of this cache for telemetry identification.
    fn name(&self) -> &str {
        "cache"
    }

    /// Returns the capacity ceiling compared against the summed entry sizes.
    fn max_size(&self) -> u64;

    /// Returns the time-to-live of entries, if they expire.
    fn ttl(&self) -> Option<Duration>;

    /// Returns the current time as seen by the backend.
    fn now(&self) -> SystemTime;

    /// Records a read of the entry for recency-based eviction.
    ///
    /// # Errors
    ///
    /// Returns an error if the access could not be recorded.
    fn touch(&self, handle: &Self::Handle) -> Result<()> {
        let _ = handle;
        Ok(())
    }

    /// Removes storage left behind by writes that never completed.
    ///
    /// Called at the end of [`clear`](crate::CachePolicy::clear). Backends
    /// whose writes cannot be interrupted keep the default no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the leftovers cannot be removed.
    fn discard_partial(&self) -> Result<()> {
        Ok(())
    }

    /// Synthesizes a value for a key that is not present.
    ///
    /// Backends without a missing-key handler return `None`.
    fn on_missing(&self, key: &K) -> Option<V> {
        let _ = key;
        None
    }
}
