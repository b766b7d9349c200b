// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for memoization through file caches.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use diskette::{CachePolicy, CacheStore, ErrorKind, FileCache, cached, lru_cache, ttl_cache};
use tick::ClockControl;

fn control() -> ClockControl {
    ClockControl::new_at(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
}

#[test]
fn repeated_calls_run_the_function_once() {
    let dir = tempfile::tempdir().unwrap();
    let calls = AtomicUsize::new(0);
    let square = lru_cache("squares", 10, None)
        .base_dir(dir.path())
        .wrap(|n: &u64| {
            calls.fetch_add(1, Ordering::Relaxed);
            n * n
        })
        .unwrap();

    assert_eq!(square.call(&7).unwrap(), 49);
    assert_eq!(square.call(&7).unwrap(), 49);
    assert_eq!(square.call(&8).unwrap(), 64);

    assert_eq!(calls.load(Ordering::Relaxed), 2);
    assert_eq!(square.cache().len().unwrap(), 2);
}

#[test]
fn results_survive_rewrapping() {
    let dir = tempfile::tempdir().unwrap();
    let first = ttl_cache("lengths", 10, Duration::from_secs(60))
        .base_dir(dir.path())
        .clock(control().to_clock())
        .wrap(|s: &String| s.len())
        .unwrap();
    assert_eq!(first.call(&"persisted".to_string()).unwrap(), 9);
    drop(first);

    let calls = AtomicUsize::new(0);
    let second = ttl_cache("lengths", 10, Duration::from_secs(60))
        .base_dir(dir.path())
        .clock(control().to_clock())
        .wrap(|s: &String| {
            calls.fetch_add(1, Ordering::Relaxed);
            s.len()
        })
        .unwrap();

    assert_eq!(second.call(&"persisted".to_string()).unwrap(), 9);
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn expired_result_is_recomputed() {
    let dir = tempfile::tempdir().unwrap();
    let control = control();
    let calls = AtomicUsize::new(0);
    let stamp = ttl_cache("stamps", 10, Duration::from_secs(60))
        .base_dir(dir.path())
        .clock(control.to_clock())
        .wrap(|_: &u8| calls.fetch_add(1, Ordering::Relaxed))
        .unwrap();

    assert_eq!(stamp.call(&0).unwrap(), 0);
    control.advance(Duration::from_secs(60));
    assert_eq!(stamp.call(&0).unwrap(), 0, "still fresh at the boundary");
    control.advance(Duration::from_secs(1));
    assert_eq!(stamp.call(&0).unwrap(), 1);
}

#[test]
fn least_recently_used_result_is_evicted() {
    let dir = tempfile::tempdir().unwrap();
    let control = control();
    let calls = AtomicUsize::new(0);
    let double = lru_cache("doubles", 2, None)
        .base_dir(dir.path())
        .clock(control.to_clock())
        .wrap(|n: &u32| {
            calls.fetch_add(1, Ordering::Relaxed);
            n * 2
        })
        .unwrap();

    double.call(&1).unwrap();
    control.advance(Duration::from_secs(1));
    double.call(&2).unwrap();
    control.advance(Duration::from_secs(1));
    double.call(&1).unwrap();
    control.advance(Duration::from_secs(1));
    double.call(&3).unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 3);

    double.call(&1).unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 3, "1 was used recently and kept");
    double.call(&2).unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 4, "2 was evicted");
}

#[test]
fn corrupt_result_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let cache: FileCache<u32, u64> = FileCache::builder("corrupt").base_dir(dir.path()).build().unwrap();
    let file_name = cache.locate(&5).file_name().unwrap();
    fs::write(cache.directory().join(file_name), [0xff; 16]).unwrap();

    let calls = AtomicUsize::new(0);
    let triple = cached(cache, |n: &u32| {
        calls.fetch_add(1, Ordering::Relaxed);
        u64::from(*n) * 3
    });

    assert_eq!(triple.call(&5).unwrap_err().kind(), ErrorKind::Corrupt);
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn key_function_shares_results() {
    let dir = tempfile::tempdir().unwrap();
    let calls = AtomicUsize::new(0);
    let lookup = lru_cache("lookups", 10, None)
        .base_dir(dir.path())
        .wrap_with_key(
            |&(id, _attempt): &(u32, u32)| id,
            |&(id, _attempt): &(u32, u32)| {
                calls.fetch_add(1, Ordering::Relaxed);
                format!("user-{id}")
            },
        )
        .unwrap();

    assert_eq!(lookup.call(&(42, 1)).unwrap(), "user-42");
    assert_eq!(lookup.call(&(42, 2)).unwrap(), "user-42");
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert!(lookup.cache().contains(&42));
}
