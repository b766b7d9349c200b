// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structured log events for cache operations.
//!
//! When the `logs` feature is enabled every policy operation emits a
//! `cache.event` through `tracing`. Without the feature recording is a no-op.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheOperation {
    Get,
    Insert,
    Remove,
    Expire,
    Limit,
    Clear,
}

#[cfg(any(feature = "logs", test))]
impl CacheOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "cache.get",
            Self::Insert => "cache.insert",
            Self::Remove => "cache.remove",
            Self::Expire => "cache.expire",
            Self::Limit => "cache.limit",
            Self::Clear => "cache.clear",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheActivity {
    Hit,
    Miss,
    Expired,
    Inserted,
    Evicted,
    Removed,
    Error,
}

#[cfg(any(feature = "logs", test))]
impl CacheActivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cache.hit",
            Self::Miss => "cache.miss",
            Self::Expired => "cache.expired",
            Self::Inserted => "cache.inserted",
            Self::Evicted => "cache.evicted",
            Self::Removed => "cache.removed",
            Self::Error => "cache.error",
        }
    }
}

/// Records a cache event.
#[allow(unused_variables, reason = "No-op when logging is disabled")]
pub(crate) fn record(cache_name: &str, operation: CacheOperation, activity: CacheActivity) {
    #[cfg(any(feature = "logs", test))]
    emit(cache_name, operation, activity);
}

#[cfg(any(feature = "logs", test))]
fn emit(cache_name: &str, operation: CacheOperation, activity: CacheActivity) {
    let op = operation.as_str();
    let ev = activity.as_str();

    // Tracing level must be constant, so a macro selects the level per activity.
    macro_rules! emit_event {
        ($level:ident) => {
            tracing::$level!(cache.name = cache_name, cache.operation = op, cache.activity = ev, "cache.event")
        };
    }

    match activity {
        CacheActivity::Hit | CacheActivity::Miss => emit_event!(debug),
        CacheActivity::Expired | CacheActivity::Inserted | CacheActivity::Evicted | CacheActivity::Removed => {
            emit_event!(info);
        }
        CacheActivity::Error => emit_event!(error),
    }
}
