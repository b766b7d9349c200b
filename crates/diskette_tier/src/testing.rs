// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock storage backend for testing.
//!
//! This module provides `MockStore`, an in-memory [`CacheStore`] with a
//! logical clock that records every storage primitive it serves and supports
//! failure injection for testing error and race paths of the policy layer.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;

use crate::{CacheStore, Error, ErrorKind, Result};

/// Recorded storage primitive with the key it addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp<K> {
    /// The store was enumerated.
    Handles,
    /// An entry was read.
    Load(K),
    /// An entry was written.
    Store(K),
    /// An entry was removed.
    Unlink(K),
    /// An entry's access time was refreshed.
    Touch(K),
    /// An entry's eviction weight was computed.
    Weigh(K),
}

type FailPredicate<K> = Box<dyn Fn(&StoreOp<K>) -> bool + Send + Sync>;
type MissingHandler<K, V> = Box<dyn Fn(&K) -> V + Send + Sync>;

#[derive(Debug, Clone)]
struct MockEntry<V> {
    value: V,
    accessed: SystemTime,
    modified: SystemTime,
}

struct Config<K, V> {
    name: String,
    max_size: u64,
    ttl: Option<Duration>,
    by_access: bool,
    missing: Option<MissingHandler<K, V>>,
}

/// A configurable in-memory store for testing.
///
/// Entries are kept in insertion order, so enumeration and therefore eviction
/// tie-breaking are deterministic. Time only moves when [`advance`](Self::advance)
/// is called. Weights are modification times unless the store was configured
/// with [`by_access`](Self::by_access). The `with_*` configuration methods only
/// take effect before the store is first cloned.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use diskette_tier::CachePolicy;
/// use diskette_tier::testing::{MockStore, StoreOp};
///
/// let store = MockStore::<String, i32>::new().with_ttl(Duration::from_secs(60));
/// store.insert(&"answer".to_string(), &42).unwrap();
/// assert_eq!(store.get(&"answer".to_string()).unwrap(), 42);
///
/// store.advance(Duration::from_secs(61));
/// assert!(store.get(&"answer".to_string()).unwrap_err().is_not_found());
/// assert!(store.operations().contains(&StoreOp::Unlink("answer".to_string())));
/// ```
///
/// # Failure Injection
///
/// ```
/// use diskette_tier::testing::{MockStore, StoreOp};
/// use diskette_tier::{CachePolicy, ErrorKind};
///
/// let store = MockStore::<String, i32>::new();
/// store.fail_when(|op| matches!(op, StoreOp::Store(k) if k == "forbidden"));
///
/// let error = store.insert(&"forbidden".to_string(), &1).unwrap_err();
/// assert_eq!(error.kind(), ErrorKind::Io);
/// assert!(store.insert(&"allowed".to_string(), &1).is_ok());
/// ```
pub struct MockStore<K, V> {
    data: Arc<Mutex<Vec<(K, MockEntry<V>)>>>,
    clock: Arc<Mutex<SystemTime>>,
    operations: Arc<Mutex<Vec<StoreOp<K>>>>,
    fail_when: Arc<Mutex<Option<(ErrorKind, FailPredicate<K>)>>>,
    config: Arc<Config<K, V>>,
}

impl<K, V> fmt::Debug for MockStore<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockStore")
            .field("name", &self.config.name)
            .field("data", &self.data)
            .field("now", &self.clock)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl<K, V> Clone for MockStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            clock: Arc::clone(&self.clock),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
            config: Arc::clone(&self.config),
        }
    }
}

impl<K, V> Default for MockStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MockStore<K, V> {
    /// Creates an empty store named `"mock"` holding up to 128 entries that never expire.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(Vec::new())),
            clock: Arc::new(Mutex::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000))),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
            config: Arc::new(Config {
                name: "mock".to_string(),
                max_size: 128,
                ttl: None,
                by_access: false,
                missing: None,
            }),
        }
    }

    /// Sets the name reported to telemetry.
    #[must_use]
    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.reconfigure(|config| config.name = name.into())
    }

    /// Sets the capacity ceiling.
    #[must_use]
    pub fn with_max_size(self, max_size: u64) -> Self {
        self.reconfigure(|config| config.max_size = max_size)
    }

    /// Sets the time-to-live of entries.
    #[must_use]
    pub fn with_ttl(self, ttl: Duration) -> Self {
        self.reconfigure(|config| config.ttl = Some(ttl))
    }

    /// Weighs entries by their last access rather than their last write.
    #[must_use]
    pub fn by_access(self) -> Self {
        self.reconfigure(|config| config.by_access = true)
    }

    /// Installs a handler that synthesizes values for missing keys.
    #[must_use]
    pub fn with_missing<F>(self, handler: F) -> Self
    where
        F: Fn(&K) -> V + Send + Sync + 'static,
    {
        self.reconfigure(|config| config.missing = Some(Box::new(handler)))
    }

    /// Moves the logical clock forward.
    pub fn advance(&self, duration: Duration) {
        *self.clock.lock() += duration;
    }

    /// Returns the number of stored entries, expired or not.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Sets a predicate that determines when a primitive should fail with an I/O error.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp<K>) -> bool + Send + Sync + 'static,
    {
        self.fail_with(ErrorKind::Io, predicate);
    }

    /// Sets a predicate that determines when a primitive should fail with the given kind.
    ///
    /// Failing with [`ErrorKind::NotFound`] simulates an entry vanishing
    /// between enumeration and use.
    pub fn fail_with<F>(&self, kind: ErrorKind, predicate: F)
    where
        F: Fn(&StoreOp<K>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some((kind, Box::new(predicate)));
    }

    /// Clears the failure predicate, allowing all primitives to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    fn reconfigure(mut self, change: impl FnOnce(&mut Config<K, V>)) -> Self {
        if let Some(config) = Arc::get_mut(&mut self.config) {
            change(config);
        }
        self
    }
}

impl<K, V> MockStore<K, V>
where
    K: Clone,
{
    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp<K>> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn check(&self, op: StoreOp<K>) -> Result<()> {
        let failure = self
            .fail_when
            .lock()
            .as_ref()
            .and_then(|(kind, predicate)| predicate(&op).then_some(*kind));
        self.operations.lock().push(op);

        match failure {
            None => Ok(()),
            Some(ErrorKind::NotFound) => Err(Error::not_found()),
            Some(ErrorKind::Corrupt) => Err(Error::corrupt("mock: injected corruption")),
            Some(ErrorKind::Io) => Err(Error::io("mock: injected failure")),
        }
    }
}

impl<K, V> MockStore<K, V>
where
    K: PartialEq,
{
    /// Returns `true` if an entry for the key is stored, expired or not.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.data.lock().iter().any(|(k, _)| k == key)
    }

    /// Returns the last access time of an entry.
    #[must_use]
    pub fn accessed_at(&self, key: &K) -> Option<SystemTime> {
        self.with_entry(key, |entry| entry.accessed).ok()
    }

    fn with_entry<T>(&self, key: &K, f: impl FnOnce(&mut MockEntry<V>) -> T) -> Result<T> {
        self.data
            .lock()
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, entry)| f(entry))
            .ok_or_else(Error::not_found)
    }
}

impl<K, V> CacheStore<K, V> for MockStore<K, V>
where
    K: Clone + PartialEq,
    V: Clone,
{
    type Handle = K;
    type Weight = SystemTime;

    fn locate(&self, key: &K) -> K {
        key.clone()
    }

    fn handles(&self) -> Result<Vec<K>> {
        self.check(StoreOp::Handles)?;
        Ok(self.data.lock().iter().map(|(k, _)| k.clone()).collect())
    }

    fn exists(&self, handle: &K) -> bool {
        self.contains_key(handle)
    }

    fn load(&self, handle: &K) -> Result<V> {
        self.check(StoreOp::Load(handle.clone()))?;
        self.with_entry(handle, |entry| entry.value.clone())
    }

    fn store(&self, handle: &K, value: &V) -> Result<()> {
        self.check(StoreOp::Store(handle.clone()))?;
        let now = self.now();
        let entry = MockEntry {
            value: value.clone(),
            accessed: now,
            modified: now,
        };

        let mut data = self.data.lock();
        match data.iter_mut().find(|(k, _)| k == handle) {
            Some((_, existing)) => *existing = entry,
            None => data.push((handle.clone(), entry)),
        }
        Ok(())
    }

    fn unlink(&self, handle: &K) -> Result<()> {
        self.check(StoreOp::Unlink(handle.clone()))?;
        let mut data = self.data.lock();
        let index = data.iter().position(|(k, _)| k == handle).ok_or_else(Error::not_found)?;
        data.remove(index);
        Ok(())
    }

    fn modified_at(&self, handle: &K) -> Result<SystemTime> {
        self.with_entry(handle, |entry| entry.modified)
    }

    fn weight_of(&self, handle: &K) -> Result<SystemTime> {
        self.check(StoreOp::Weigh(handle.clone()))?;
        let by_access = self.config.by_access;
        self.with_entry(handle, |entry| {
            if by_access {
                entry.accessed.max(entry.modified)
            } else {
                entry.modified
            }
        })
    }

    fn size_of(&self, handle: &K) -> Result<u64> {
        self.with_entry(handle, |_| 1)
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn max_size(&self) -> u64 {
        self.config.max_size
    }

    fn ttl(&self) -> Option<Duration> {
        self.config.ttl
    }

    fn now(&self) -> SystemTime {
        *self.clock.lock()
    }

    fn touch(&self, handle: &K) -> Result<()> {
        self.check(StoreOp::Touch(handle.clone()))?;
        let now = self.now();
        self.with_entry(handle, |entry| entry.accessed = now)
    }

    fn on_missing(&self, key: &K) -> Option<V> {
        self.config.missing.as_ref().map(|handler| handler(key))
    }
}
