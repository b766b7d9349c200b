// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Storage contract and cache policy for persistent caches.
//!
//! This crate defines the [`CacheStore`] trait that cache backends implement,
//! the [`CachePolicy`] operations every backend gets for free, and the
//! [`Error`] type shared by both.
//!
//! # Overview
//!
//! The split separates storage from policy. A backend answers questions about
//! single entries (does it exist, when was it written, how heavy is it) and
//! performs whole-entry reads, writes and deletes. [`CachePolicy`] combines
//! those primitives into time-to-live expiry, capacity-bounded eviction,
//! defaults, bulk reads and clearing, written once for every backend.
//!
//! # Implementing a Store
//!
//! ```
//! use std::cell::RefCell;
//! use std::collections::HashMap;
//! use std::time::{Duration, SystemTime};
//!
//! use diskette_tier::{CachePolicy, CacheStore, Error, Result};
//!
//! struct SimpleStore(RefCell<HashMap<String, (i32, SystemTime)>>);
//!
//! impl CacheStore<String, i32> for SimpleStore {
//!     type Handle = String;
//!     type Weight = SystemTime;
//!
//!     fn locate(&self, key: &String) -> String {
//!         key.clone()
//!     }
//!
//!     fn handles(&self) -> Result<Vec<String>> {
//!         Ok(self.0.borrow().keys().cloned().collect())
//!     }
//!
//!     fn exists(&self, handle: &String) -> bool {
//!         self.0.borrow().contains_key(handle)
//!     }
//!
//!     fn load(&self, handle: &String) -> Result<i32> {
//!         self.0.borrow().get(handle).map(|(v, _)| *v).ok_or_else(Error::not_found)
//!     }
//!
//!     fn store(&self, handle: &String, value: &i32) -> Result<()> {
//!         self.0.borrow_mut().insert(handle.clone(), (*value, SystemTime::now()));
//!         Ok(())
//!     }
//!
//!     fn unlink(&self, handle: &String) -> Result<()> {
//!         self.0.borrow_mut().remove(handle).map(drop).ok_or_else(Error::not_found)
//!     }
//!
//!     fn modified_at(&self, handle: &String) -> Result<SystemTime> {
//!         self.0.borrow().get(handle).map(|(_, t)| *t).ok_or_else(Error::not_found)
//!     }
//!
//!     fn weight_of(&self, handle: &String) -> Result<SystemTime> {
//!         self.modified_at(handle)
//!     }
//!
//!     fn size_of(&self, handle: &String) -> Result<u64> {
//!         self.load(handle).map(|_| 1)
//!     }
//!
//!     fn max_size(&self) -> u64 {
//!         2
//!     }
//!
//!     fn ttl(&self) -> Option<Duration> {
//!         None
//!     }
//!
//!     fn now(&self) -> SystemTime {
//!         SystemTime::now()
//!     }
//! }
//!
//! let store = SimpleStore(RefCell::new(HashMap::new()));
//! store.insert(&"a".to_string(), &1)?;
//! assert_eq!(store.get_or(&"b".to_string(), 0)?, 0);
//! assert_eq!(store.set_default(&"b".to_string(), 2)?, 2);
//! assert_eq!(store.current_size()?, 2);
//! # Ok::<(), Error>(())
//! ```
//!
//! # Features
//!
//! - `logs`: emits a structured `cache.event` through `tracing` for every
//!   policy outcome (hit, miss, insert, expiry, eviction, removal, error).
//! - `test-util`: exposes [`testing::MockStore`], an in-memory store with a
//!   logical clock, operation recording and failure injection.

pub mod error;
pub(crate) mod policy;
pub(crate) mod store;
pub(crate) mod telemetry;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use policy::CachePolicy;
#[doc(inline)]
pub use store::CacheStore;
