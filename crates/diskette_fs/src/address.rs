// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Resolution of cache keys to file names.

use std::fmt;

use diskette_tier::{Error, Result};
use serde::Serialize;
use xxhash_rust::xxh3::xxh3_128;

/// Identifies one entry of a [`FileCache`](crate::FileCache).
///
/// An address is either a key supplied by the caller or the name of a file
/// found while enumerating the cache directory. Enumeration cannot recover
/// keys from file names, so both forms resolve to the same file: a key
/// through its digest, a stored name as is.
///
/// Addresses are only created by the cache itself; a caller can never pass a
/// file name where a key is expected.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Address<K>(Repr<K>);

#[derive(Clone, PartialEq, Eq, Hash)]
enum Repr<K> {
    Key(K),
    Stored(String),
}

impl<K> Address<K> {
    pub(crate) fn key(key: K) -> Self {
        Self(Repr::Key(key))
    }

    pub(crate) fn stored(file_name: String) -> Self {
        Self(Repr::Stored(file_name))
    }
}

impl<K: Serialize> Address<K> {
    /// Returns the name of the file holding this entry.
    ///
    /// A key maps to the 32-digit lowercase hex form of the 128-bit `xxh3`
    /// digest of its `postcard` encoding, so equal keys map to the same file
    /// in every process.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the key cannot be encoded.
    pub fn file_name(&self) -> Result<String> {
        match &self.0 {
            Repr::Key(key) => {
                let bytes = postcard::to_allocvec(key).map_err(Error::io)?;
                Ok(format!("{:032x}", xxh3_128(&bytes)))
            }
            Repr::Stored(name) => Ok(name.clone()),
        }
    }
}

impl<K> fmt::Debug for Address<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Key(_) => f.write_str("Address::Key(..)"),
            Repr::Stored(name) => write!(f, "Address::Stored({name:?})"),
        }
    }
}
