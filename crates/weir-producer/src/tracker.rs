//! Deadline accounting for a batch's delivery attempts
//!
//! The tracker is the single source of truth for whether a batch is out
//! of time. The dispatcher consults it before every send and before every
//! backoff wait; an expired batch goes straight to completion without
//! another network attempt.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub(crate) struct DeliveryTracker {
    created_at: Instant,
    deadline: Instant,
    attempts: u32,
}

impl DeliveryTracker {
    /// Start the clock. The deadline covers the batch's whole life:
    /// `creation + delivery_timeout`, spanning linger, queueing, and all
    /// retries.
    pub(crate) fn new(delivery_timeout: Duration) -> Self {
        let created_at = Instant::now();
        Self {
            created_at,
            deadline: created_at + delivery_timeout,
            attempts: 0,
        }
    }

    /// Budget left before the deadline; zero once expired
    pub(crate) fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has passed
    pub(crate) fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Wall-clock time since batch creation
    pub(crate) fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Number of send attempts started so far
    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Count a new send attempt
    pub(crate) fn record_attempt(&mut self) {
        self.attempts += 1;
    }
}
