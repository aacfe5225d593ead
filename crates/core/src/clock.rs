// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Monotonic millisecond clock for sync cursors.
//!
//! Every write to the file store is stamped with a `synced_at` value that
//! clients later use as a pagination cursor. Two writes landing in the same
//! wall-clock millisecond must still receive distinct, strictly increasing
//! stamps, otherwise a page boundary could fall between them and one of the
//! rows would be skipped by `synced_at > cursor`.
//!
//! Stamp rule: `max(wall_ms, last + 1)`.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Trait for getting the current wall clock time.
///
/// This allows injecting a mock clock for testing.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> i64;
}

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Box<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// Hands out strictly increasing millisecond stamps.
///
/// Thread-safe. Follows the wall clock when it moves forward and advances by
/// one millisecond past the last stamp when the wall clock stalls or goes
/// backwards.
pub struct SyncClock<C: ClockSource = SystemClock> {
    clock: C,
    last: Mutex<i64>,
}

impl SyncClock<SystemClock> {
    /// Creates a sync clock backed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for SyncClock<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ClockSource> SyncClock<C> {
    /// Creates a sync clock with a custom clock source.
    pub fn with_clock(clock: C) -> Self {
        SyncClock {
            clock,
            last: Mutex::new(0),
        }
    }

    /// Returns the next stamp, strictly greater than every stamp issued or
    /// observed so far.
    pub fn next(&self) -> i64 {
        let physical = self.clock.now_ms();
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let stamp = if physical > *last { physical } else { *last + 1 };
        *last = stamp;
        stamp
    }

    /// Raises the high-water mark to at least `stamp`.
    ///
    /// Called when opening an existing store so that new stamps continue
    /// after the newest persisted `synced_at`, even if the wall clock is
    /// behind it.
    pub fn observe(&self, stamp: i64) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if stamp > *last {
            *last = stamp;
        }
    }

    /// Returns the last stamp handed out or observed.
    pub fn last(&self) -> i64 {
        *self.last.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
