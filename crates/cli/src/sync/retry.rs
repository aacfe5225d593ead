// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Retry policy for sync requests.

use std::time::Duration;

use super::client::SyncError;

/// Statuses worth retrying: timeouts, throttling, and transient server errors.
pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Exponential backoff for failed requests.
///
/// Connection failures and the statuses in `retry_on_status` are retried;
/// other HTTP errors and undecodable responses fail immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per request including the first. 1 disables retries.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    pub retry_on_status: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            retry_on_status: RETRYABLE_STATUSES.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        RetryPolicy {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based), doubling each time.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Whether a failed attempt should be retried.
    pub fn is_retryable(&self, error: &SyncError) -> bool {
        match error {
            SyncError::Connection(_) => true,
            SyncError::Http { status, .. } => self.retry_on_status.contains(status),
            SyncError::Decode(_) | SyncError::Protocol(_) | SyncError::Setup(_) => false,
        }
    }
}
