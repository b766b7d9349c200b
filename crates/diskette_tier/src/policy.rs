// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache policy implemented once on top of any [`CacheStore`].

use crate::telemetry::{self, CacheActivity, CacheOperation};
use crate::{CacheStore, Error, Result};

/// Cache operations built purely from [`CacheStore`] primitives.
///
/// This trait is implemented for every store, so backends only supply storage
/// and receive expiry, capacity enforcement, defaults and bulk operations for
/// free.
///
/// Reads are lazy about expiry: a stale entry found by [`get`](Self::get) is
/// deleted and reported as a miss. Writes through [`insert`](Self::insert)
/// immediately run [`limit`](Self::limit), which may evict other entries or
/// even the one just written.
///
/// The sweeping operations [`expire`](Self::expire), [`limit`](Self::limit)
/// and [`clear`](Self::clear) treat an entry that vanishes mid-sweep as
/// already handled. Every other failure propagates.
pub trait CachePolicy<K, V>: CacheStore<K, V> {
    /// Returns `true` if an entry for the key is present. Expired entries
    /// that have not been swept yet are still present.
    fn contains(&self, key: &K) -> bool {
        self.exists(&self.locate(key))
    }

    /// Returns the cached value for the key and records the access.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the key is absent or its entry expired.
    /// A corrupt or I/O error from the backend is propagated.
    fn get(&self, key: &K) -> Result<V> {
        let result = read::<K, V, Self>(self, &self.locate(key));
        let activity = match &result {
            Ok(_) => CacheActivity::Hit,
            Err(error) if error.is_not_found() => CacheActivity::Miss,
            Err(_) => CacheActivity::Error,
        };
        telemetry::record(self.name(), CacheOperation::Get, activity);
        result
    }

    /// Stores the value under the key, then enforces capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be stored or the following
    /// [`limit`](Self::limit) pass fails.
    fn insert(&self, key: &K, value: &V) -> Result<()> {
        if let Err(error) = self.store(&self.locate(key), value) {
            return Err(failed(self.name(), CacheOperation::Insert, error));
        }
        telemetry::record(self.name(), CacheOperation::Insert, CacheActivity::Inserted);
        self.limit()
    }

    /// Deletes the entry for the key.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the key is absent.
    fn remove(&self, key: &K) -> Result<()> {
        self.unlink(&self.locate(key))?;
        telemetry::record(self.name(), CacheOperation::Remove, CacheActivity::Removed);
        Ok(())
    }

    /// Returns the cached value, or `default` on a miss.
    ///
    /// # Errors
    ///
    /// Only corrupt and I/O errors are returned; a miss is not an error.
    fn get_or(&self, key: &K, default: V) -> Result<V> {
        recover(self.get(key), || Ok(default))
    }

    /// Removes the entry for the key and returns its value.
    ///
    /// On a miss, returns `default` if one is given.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the key is absent and no default is
    /// given. Corrupt and I/O errors are always returned.
    fn pop(&self, key: &K, default: Option<V>) -> Result<V> {
        match self.get(key) {
            Ok(value) => {
                recover(self.remove(key), || Ok(()))?;
                Ok(value)
            }
            Err(error) if error.is_not_found() => default.ok_or(error),
            Err(error) => Err(error),
        }
    }

    /// Removes the entry for the key and returns its value, or `default` on a miss.
    ///
    /// # Errors
    ///
    /// Only corrupt and I/O errors are returned.
    fn pop_or(&self, key: &K, default: V) -> Result<V> {
        self.pop(key, Some(default))
    }

    /// Returns the cached value, storing `default` first if the key is absent.
    ///
    /// An existing value is never overwritten. After storing the default the
    /// entry is read back, so the returned value is the one now in the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing entry cannot be read or the default
    /// cannot be stored. Returns a not-found error if the capacity pass that
    /// follows the write evicted the default again, as happens with a zero
    /// [`max_size`](CacheStore::max_size).
    fn set_default(&self, key: &K, default: V) -> Result<V> {
        recover(self.get(key), || {
            self.insert(key, &default)?;
            self.get(key)
        })
    }

    /// Synthesizes, stores and returns a value for a missing key through the
    /// backend's missing-key handler.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the backend has no missing-key handler,
    /// or any error from storing the synthesized value.
    fn resolve_missing(&self, key: &K) -> Result<V> {
        let value = self.on_missing(key).ok_or_else(Error::not_found)?;
        self.insert(key, &value)?;
        Ok(value)
    }

    /// Returns every fresh value in the cache in backend enumeration order.
    ///
    /// Entries that expire or vanish while the values are collected are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be enumerated or an entry
    /// cannot be decoded.
    fn values(&self) -> Result<Vec<V>> {
        let mut values = Vec::new();
        for handle in self.handles()? {
            if let Some(value) = present(read::<K, V, Self>(self, &handle))? {
                values.push(value);
            }
        }
        Ok(values)
    }

    /// Returns the number of stored entries, including expired ones not yet swept.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be enumerated.
    fn len(&self) -> Result<usize> {
        Ok(self.handles()?.len())
    }

    /// Returns `true` if no entries are stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be enumerated.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns the accumulated size of all stored entries.
    ///
    /// The size is recomputed from the backend on every call.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be enumerated or an entry size
    /// cannot be determined.
    fn current_size(&self) -> Result<u64> {
        let mut total = 0_u64;
        for handle in self.handles()? {
            if let Some(size) = present(self.size_of(&handle))? {
                total = total.saturating_add(size);
            }
        }
        Ok(total)
    }

    /// Returns `true` if the entry for the key has not outlived the time-to-live.
    ///
    /// Always `true` when the cache has no time-to-live.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if a time-to-live is set and the key is absent.
    fn is_fresh(&self, key: &K) -> Result<bool> {
        fresh::<K, V, Self>(self, &self.locate(key))
    }

    /// Deletes every entry that has outlived the time-to-live.
    ///
    /// Does nothing when the cache has no time-to-live.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be enumerated or an entry
    /// cannot be inspected or deleted for a reason other than absence.
    fn expire(&self) -> Result<()> {
        if self.ttl().is_none() {
            return Ok(());
        }

        for handle in self.handles()? {
            if present(fresh::<K, V, Self>(self, &handle))? != Some(false) {
                continue;
            }
            match self.unlink(&handle) {
                Ok(()) => telemetry::record(self.name(), CacheOperation::Expire, CacheActivity::Expired),
                Err(error) if error.is_not_found() => {}
                Err(error) => return Err(failed(self.name(), CacheOperation::Expire, error)),
            }
        }
        Ok(())
    }

    /// Expires stale entries, then evicts the lowest-weight entry until the
    /// accumulated size fits [`max_size`](CacheStore::max_size).
    ///
    /// Ties are broken by enumeration order: the first minimum found is
    /// evicted. The pass ends early if no entry is left to evict.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry cannot be weighed or deleted for a reason
    /// other than absence.
    fn limit(&self) -> Result<()> {
        self.expire()?;

        while self.current_size()? > self.max_size() {
            let mut victim: Option<(Self::Weight, Self::Handle)> = None;
            for handle in self.handles()? {
                let Some(weight) = present(self.weight_of(&handle))? else {
                    continue;
                };
                if victim.as_ref().is_none_or(|(lowest, _)| weight < *lowest) {
                    victim = Some((weight, handle));
                }
            }

            let Some((_, handle)) = victim else {
                break;
            };
            match self.unlink(&handle) {
                Ok(()) => telemetry::record(self.name(), CacheOperation::Limit, CacheActivity::Evicted),
                Err(error) if error.is_not_found() => {}
                Err(error) => return Err(failed(self.name(), CacheOperation::Limit, error)),
            }
        }
        Ok(())
    }

    /// Deletes every entry present when the call begins, then lets the
    /// backend discard leftovers of interrupted writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be enumerated or an entry
    /// cannot be deleted for a reason other than absence.
    fn clear(&self) -> Result<()> {
        for handle in self.handles()? {
            match self.unlink(&handle) {
                Ok(()) => telemetry::record(self.name(), CacheOperation::Clear, CacheActivity::Removed),
                Err(error) if error.is_not_found() => {}
                Err(error) => return Err(failed(self.name(), CacheOperation::Clear, error)),
            }
        }
        self.discard_partial()
            .map_err(|error| failed(self.name(), CacheOperation::Clear, error))
    }
}

impl<K, V, S> CachePolicy<K, V> for S where S: CacheStore<K, V> + ?Sized {}

/// Reads an entry, deleting it instead if it is stale.
fn read<K, V, S>(store: &S, handle: &S::Handle) -> Result<V>
where
    S: CacheStore<K, V> + ?Sized,
{
    if !fresh::<K, V, S>(store, handle)? {
        recover(store.unlink(handle), || Ok(()))?;
        telemetry::record(store.name(), CacheOperation::Get, CacheActivity::Expired);
        return Err(Error::not_found());
    }

    let value = store.load(handle)?;

    // The value is already loaded; a failed access-time refresh only costs
    // recency information.
    if store.touch(handle).is_err_and(|error| !error.is_not_found()) {
        telemetry::record(store.name(), CacheOperation::Get, CacheActivity::Error);
    }
    Ok(value)
}

fn fresh<K, V, S>(store: &S, handle: &S::Handle) -> Result<bool>
where
    S: CacheStore<K, V> + ?Sized,
{
    let Some(ttl) = store.ttl() else {
        return Ok(true);
    };
    let modified = store.modified_at(handle)?;

    // A cutoff before the representable range means nothing can be older than it.
    Ok(store.now().checked_sub(ttl).is_none_or(|cutoff| modified >= cutoff))
}

/// Turns a miss into the fallback's outcome.
fn recover<T>(result: Result<T>, fallback: impl FnOnce() -> Result<T>) -> Result<T> {
    match result {
        Err(error) if error.is_not_found() => fallback(),
        other => other,
    }
}

/// Turns a miss into `None`.
fn present<T>(result: Result<T>) -> Result<Option<T>> {
    recover(result.map(Some), || Ok(None))
}

fn failed(cache_name: &str, operation: CacheOperation, error: Error) -> Error {
    telemetry::record(cache_name, operation, CacheActivity::Error);
    error
}
