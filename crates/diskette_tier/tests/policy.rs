// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the `CachePolicy` operations over a mock store.

use std::time::Duration;

use diskette_tier::testing::{MockStore, StoreOp};
use diskette_tier::{CachePolicy, ErrorKind};

fn store() -> MockStore<String, String> {
    MockStore::new()
}

fn key(name: &str) -> String {
    name.to_string()
}

#[test]
fn round_trip() {
    let cache = store();
    cache.insert(&key("k"), &"v".to_string()).unwrap();
    assert!(cache.contains(&key("k")));
    assert_eq!(cache.get(&key("k")).unwrap(), "v");
}

#[test]
fn miss_semantics() {
    let cache = store();
    assert!(!cache.contains(&key("k")));
    assert!(cache.get(&key("k")).unwrap_err().is_not_found());
    assert_eq!(cache.get_or(&key("k"), "d".to_string()).unwrap(), "d");
}

#[test]
fn overwrite_replaces_value_and_times() {
    let cache = store();
    cache.insert(&key("k"), &"v1".to_string()).unwrap();
    let first = cache.accessed_at(&key("k")).unwrap();

    cache.advance(Duration::from_secs(1));
    cache.insert(&key("k"), &"v2".to_string()).unwrap();

    assert_eq!(cache.get(&key("k")).unwrap(), "v2");
    assert!(cache.accessed_at(&key("k")).unwrap() > first);
    assert_eq!(cache.len().unwrap(), 1);
}

#[test]
fn ttl_expiry_on_read() {
    let cache = MockStore::<String, String>::new().with_ttl(Duration::from_secs(5));
    cache.insert(&key("k"), &"v".to_string()).unwrap();

    cache.advance(Duration::from_secs(6));

    assert!(cache.get(&key("k")).unwrap_err().is_not_found());
    assert!(!cache.contains(&key("k")));
}

#[test]
fn expire_sweeps_only_stale_entries() {
    let cache = MockStore::<String, String>::new().with_ttl(Duration::from_secs(5));
    cache.insert(&key("old"), &"1".to_string()).unwrap();
    cache.advance(Duration::from_secs(4));
    cache.insert(&key("new"), &"2".to_string()).unwrap();
    cache.advance(Duration::from_secs(2));

    cache.expire().unwrap();

    assert!(!cache.contains(&key("old")));
    assert!(cache.contains(&key("new")));
}

#[test]
fn plain_eviction_removes_oldest_written() {
    let cache = MockStore::<String, String>::new().with_max_size(3);
    for name in ["a", "b", "c", "d"] {
        cache.insert(&key(name), &name.to_string()).unwrap();
        cache.advance(Duration::from_secs(1));
    }

    assert_eq!(cache.len().unwrap(), 3);
    assert!(!cache.contains(&key("a")));
}

#[test]
fn plain_eviction_ignores_reads() {
    let cache = MockStore::<String, String>::new().with_max_size(2);
    cache.insert(&key("a"), &"a".to_string()).unwrap();
    cache.advance(Duration::from_secs(1));
    cache.insert(&key("b"), &"b".to_string()).unwrap();
    cache.advance(Duration::from_secs(1));
    cache.get(&key("a")).unwrap();
    cache.advance(Duration::from_secs(1));
    cache.insert(&key("c"), &"c".to_string()).unwrap();

    assert!(!cache.contains(&key("a")));
    assert!(cache.contains(&key("b")));
}

#[test]
fn lru_eviction_spares_recently_read() {
    let cache = MockStore::<String, String>::new().with_max_size(2).by_access();
    cache.insert(&key("a"), &"a".to_string()).unwrap();
    cache.advance(Duration::from_secs(1));
    cache.insert(&key("b"), &"b".to_string()).unwrap();
    cache.advance(Duration::from_secs(1));
    cache.get(&key("a")).unwrap();
    cache.advance(Duration::from_secs(1));
    cache.insert(&key("c"), &"c".to_string()).unwrap();

    assert!(cache.contains(&key("a")));
    assert!(!cache.contains(&key("b")));
    assert!(cache.contains(&key("c")));
}

#[test]
fn pop_variants() {
    let cache = store();
    cache.insert(&key("k"), &"v".to_string()).unwrap();

    assert_eq!(cache.pop(&key("k"), None).unwrap(), "v");
    assert!(!cache.contains(&key("k")));
    assert!(cache.pop(&key("k"), None).unwrap_err().is_not_found());
    assert_eq!(cache.pop(&key("k"), Some("d".to_string())).unwrap(), "d");
    assert_eq!(cache.pop_or(&key("k"), "e".to_string()).unwrap(), "e");
}

#[test]
fn set_default_stores_only_when_absent() {
    let cache = store();
    assert_eq!(cache.set_default(&key("k"), "first".to_string()).unwrap(), "first");
    assert_eq!(cache.set_default(&key("k"), "second".to_string()).unwrap(), "first");
    assert_eq!(cache.get(&key("k")).unwrap(), "first");
}

#[test]
fn clear_empties_values() {
    let cache = store();
    for name in ["a", "b", "c"] {
        cache.insert(&key(name), &name.to_string()).unwrap();
    }
    assert_eq!(cache.values().unwrap().len(), 3);

    cache.clear().unwrap();

    assert!(cache.values().unwrap().is_empty());
    assert!(cache.is_empty().unwrap());
}

#[test]
fn values_skip_expired_entries() {
    let cache = MockStore::<String, String>::new().with_ttl(Duration::from_secs(5));
    cache.insert(&key("old"), &"old".to_string()).unwrap();
    cache.advance(Duration::from_secs(4));
    cache.insert(&key("new"), &"new".to_string()).unwrap();
    cache.advance(Duration::from_secs(2));

    assert_eq!(cache.values().unwrap(), vec!["new".to_string()]);
    assert!(!cache.contains(&key("old")));
}

#[test]
fn explicit_remove_of_missing_key_fails() {
    let cache = store();
    cache.insert(&key("k"), &"v".to_string()).unwrap();
    cache.remove(&key("k")).unwrap();
    assert!(cache.remove(&key("k")).unwrap_err().is_not_found());
}

#[test]
fn sweeps_tolerate_double_delete() {
    let cache = MockStore::<String, String>::new().with_ttl(Duration::from_secs(1));
    cache.insert(&key("k"), &"v".to_string()).unwrap();
    cache.advance(Duration::from_secs(2));
    cache.fail_with(ErrorKind::NotFound, |op| matches!(op, StoreOp::Unlink(_)));

    cache.expire().unwrap();
    cache.limit().unwrap();
    cache.clear().unwrap();
}

#[test]
fn metadata_reads_do_not_touch() {
    let cache = store();
    cache.insert(&key("k"), &"v".to_string()).unwrap();
    let accessed = cache.accessed_at(&key("k"));
    cache.advance(Duration::from_secs(1));

    cache.is_fresh(&key("k")).unwrap();
    cache.current_size().unwrap();

    assert_eq!(cache.accessed_at(&key("k")), accessed);
}

#[test]
fn corrupt_entries_are_not_misses() {
    let cache = store();
    cache.insert(&key("k"), &"v".to_string()).unwrap();
    cache.fail_with(ErrorKind::Corrupt, |op| matches!(op, StoreOp::Load(_)));

    assert_eq!(cache.values().unwrap_err().kind(), ErrorKind::Corrupt);
    assert_eq!(cache.set_default(&key("k"), "d".to_string()).unwrap_err().kind(), ErrorKind::Corrupt);
}
