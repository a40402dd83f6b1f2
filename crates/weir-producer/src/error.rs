//! Caller-visible error taxonomy
//!
//! Transient broker refusals are absorbed and retried inside the engine;
//! only terminal outcomes surface here. The type is `Clone` because one
//! batch outcome fans out to every record's waiting handle.

use crate::record::TopicPartition;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Submission was attempted after the producer was closed
    #[error("producer is closed")]
    Closed,

    /// The delivery deadline elapsed before the broker acknowledged the
    /// batch — before the first send, mid-retry, or while waiting for an
    /// acknowledgment.
    #[error("Expiring {records} record(s) for {partition}: {elapsed_ms} ms has passed since batch creation (delivery timeout: {timeout_ms} ms)")]
    TimeoutExpired {
        partition: TopicPartition,
        records: usize,
        elapsed_ms: u64,
        timeout_ms: u64,
    },

    /// The broker rejected the batch with a non-retriable error code
    #[error("Broker rejected batch for {partition}: {reason}")]
    Rejected {
        partition: TopicPartition,
        reason: String,
    },

    /// Connection-level failure that is not retry-eligible
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Configuration rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
