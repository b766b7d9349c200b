// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Eviction orders for file caches.

use std::time::SystemTime;

/// File timestamps of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    /// Last read or write, whichever is later.
    pub accessed: SystemTime,
    /// Last write.
    pub modified: SystemTime,
}

/// Chooses which entry a full cache evicts first: the one with the lowest weight.
pub trait Eviction {
    /// Returns the eviction weight of an entry with the given timestamps.
    fn weight(times: &Timestamps) -> SystemTime;
}

/// Evicts the entry written longest ago. Reads do not matter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OldestWritten;

impl Eviction for OldestWritten {
    fn weight(times: &Timestamps) -> SystemTime {
        times.modified
    }
}

/// Evicts the entry read or written longest ago.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeastRecentlyUsed;

impl Eviction for LeastRecentlyUsed {
    fn weight(times: &Timestamps) -> SystemTime {
        times.accessed
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn weights_pick_their_timestamp() {
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        let accessed = modified + Duration::from_secs(5);
        let times = Timestamps { accessed, modified };

        assert_eq!(OldestWritten::weight(&times), modified);
        assert_eq!(LeastRecentlyUsed::weight(&times), accessed);
    }
}
