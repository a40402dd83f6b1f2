//! Records, destinations, and caller-visible delivery outcomes

use crate::error::Error;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use tokio::sync::oneshot;

/// A record to be published. Immutable once submitted.
#[derive(Debug, Clone)]
pub struct Record {
    /// Record key (optional, opaque bytes)
    pub key: Option<Bytes>,

    /// Record payload
    pub value: Bytes,

    /// Timestamp assigned when the record was created
    pub timestamp: DateTime<Utc>,
}

impl Record {
    /// Create a new keyless record
    pub fn new(value: impl Into<Bytes>) -> Self {
        Self {
            key: None,
            value: value.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a record with a key
    pub fn with_key(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: Some(key.into()),
            value: value.into(),
            timestamp: Utc::now(),
        }
    }

    /// Size the record contributes to a batch (key + value bytes)
    pub fn size_bytes(&self) -> usize {
        self.value.len() + self.key.as_ref().map(|k| k.len()).unwrap_or(0)
    }
}

/// Destination partition of a record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: u32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: u32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.topic, self.partition)
    }
}

/// Metadata returned after successful delivery
#[derive(Debug, Clone)]
pub struct RecordMetadata {
    /// Topic name
    pub topic: String,
    /// Partition the batch was appended to
    pub partition: u32,
    /// Offset the broker assigned to the batch
    pub offset: u64,
    /// Broker-assigned append timestamp
    pub timestamp: DateTime<Utc>,
}

/// Final, caller-visible result of a delivery
pub type Outcome = std::result::Result<RecordMetadata, Error>;

/// Pending handle returned by `submit`.
///
/// Resolves once the engine reaches a terminal outcome for the record's
/// batch — broker acknowledgment, fatal rejection, or deadline expiry.
#[derive(Debug)]
pub struct DeliveryHandle {
    rx: oneshot::Receiver<Outcome>,
}

impl DeliveryHandle {
    pub(crate) fn new(rx: oneshot::Receiver<Outcome>) -> Self {
        Self { rx }
    }

    /// Wait for the delivery to resolve
    pub async fn wait(self) -> Outcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            // The engine dropped without resolving; only happens when the
            // producer is torn down underneath pending work.
            Err(_) => Err(Error::Closed),
        }
    }
}
