//! Request pacing record shared by every fetch

use crate::config::FetchConfig;
use std::time::Duration;
use tokio::time::Instant;

/// Process-wide request pacing state
///
/// One instance governs every request to the target site. It lives behind the
/// fetch governor's mutex; nothing else reads or writes the timestamp.
#[derive(Debug, Clone)]
pub struct FetchState {
    /// Time slot granted to the most recent request
    pub last_request_time: Option<Instant>,

    /// Minimum spacing between two granted slots
    pub min_interval: Duration,

    /// Re-attempts allowed after an HTTP 429
    pub max_retries: u32,

    /// Number of slots granted so far
    pub request_count: u64,
}

impl FetchState {
    /// Creates a new FetchState from the pacing configuration
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            last_request_time: None,
            min_interval: config.min_interval(),
            max_retries: config.max_retries,
            request_count: 0,
        }
    }

    /// Reserves the next request slot and records it
    ///
    /// The slot is `max(now, last + min_interval + jitter)`, or `now` for the
    /// first request. Slots are strictly ordered: every reservation lands at
    /// least `min_interval` after the previous one, even when it is still in
    /// the future.
    pub fn reserve_slot(&mut self, now: Instant, jitter: Duration) -> Instant {
        let slot = match self.last_request_time {
            Some(last) => now.max(last + self.min_interval + jitter),
            None => now,
        };

        self.last_request_time = Some(slot);
        self.request_count += 1;
        slot
    }
}
