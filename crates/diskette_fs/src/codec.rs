// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Serialization formats for stored values.

use diskette_tier::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Converts values to and from the bytes stored in an entry file.
///
/// Encoding failures are reported as I/O errors because nothing was written.
/// Decoding failures are reported as corrupt entries so they are never
/// mistaken for a miss.
pub trait Codec {
    /// Encodes a value.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the value cannot be represented in this format.
    fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>>;

    /// Decodes a value.
    ///
    /// # Errors
    ///
    /// Returns a corrupt error if the bytes are not a valid encoding of `V`.
    fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V>;
}

/// Compact binary encoding through `postcard`. The default codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Postcard;

impl Codec for Postcard {
    fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>> {
        postcard::to_allocvec(value).map_err(Error::io)
    }

    fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V> {
        postcard::from_bytes(bytes).map_err(Error::corrupt)
    }
}

/// Human-readable encoding through `serde_json`.
///
/// Useful when entries should be inspectable on disk, and required for
/// values whose `Deserialize` implementation needs a self-describing format,
/// such as untagged enums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json;

impl Codec for Json {
    fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(Error::io)
    }

    fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V> {
        serde_json::from_slice(bytes).map_err(Error::corrupt)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use diskette_tier::ErrorKind;

    use super::*;

    #[test]
    fn postcard_round_trips_structured_values() {
        let value: BTreeMap<String, Vec<u32>> = [("primes".to_string(), vec![2, 3, 5])].into();
        let bytes = Postcard.encode(&value).unwrap();
        let decoded: BTreeMap<String, Vec<u32>> = Postcard.decode(&bytes).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn json_is_readable() {
        let bytes = Json.encode(&("answer", 42)).unwrap();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), r#"["answer",42]"#);
    }

    #[test]
    fn truncated_postcard_is_corrupt() {
        let bytes = Postcard.encode(&"a long enough string").unwrap();
        let error = Postcard.decode::<String>(&bytes[..3]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn malformed_json_is_corrupt() {
        let error = Json.decode::<u32>(b"{not json").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn non_string_map_keys_fail_json_encoding_as_io() {
        let value: BTreeMap<(u8, u8), u8> = [((1, 2), 3)].into();
        let error = Json.encode(&value).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Io);
    }
}
