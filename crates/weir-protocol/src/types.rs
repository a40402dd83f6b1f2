//! Shared protocol value types

use crate::serde_utils::{bytes_serde, option_bytes_serde};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single record as carried inside a produce request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRecord {
    /// Record key (optional, opaque to the transport)
    #[serde(with = "option_bytes_serde")]
    pub key: Option<Bytes>,

    /// Record payload
    #[serde(with = "bytes_serde")]
    pub value: Bytes,

    /// Client-assigned creation timestamp, milliseconds since epoch
    pub timestamp_ms: i64,
}

impl WireRecord {
    /// Wire size contribution of this record (key + value bytes)
    pub fn size_bytes(&self) -> usize {
        self.value.len() + self.key.as_ref().map(|k| k.len()).unwrap_or(0)
    }
}

/// Error codes a broker can attach to a failed request.
///
/// WARNING: variant order matters for bincode serialization.
///
/// The split into retriable and non-retriable codes is what drives the
/// producer's retry decision, so brokers must pick codes accordingly: a
/// condition that can clear on its own (replication catching up, a leader
/// election finishing) gets a retriable code, a request that can never
/// succeed as sent gets a non-retriable one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The partition's in-sync replica requirement cannot currently be met
    NotEnoughReplicas,

    /// The write was appended locally but the in-sync set shrank before
    /// the required replicas confirmed it
    NotEnoughReplicasAfterAppend,

    /// The broker could not process the request in time
    RequestTimedOut,

    /// The addressed broker is not the current leader for the partition
    NotLeaderForPartition,

    /// The record failed broker-side validation
    InvalidRecord,

    /// The batch exceeds the broker's configured maximum message size
    MessageTooLarge,

    /// The principal is not authorized to write to the topic
    TopicAuthorizationFailed,

    /// The topic or partition does not exist
    UnknownTopicOrPartition,

    /// Unexpected broker-side failure
    Unknown,
}

impl ErrorCode {
    /// Whether a producer may retry the request that failed with this code
    pub fn is_retriable(self) -> bool {
        matches!(
            self,
            ErrorCode::NotEnoughReplicas
                | ErrorCode::NotEnoughReplicasAfterAppend
                | ErrorCode::RequestTimedOut
                | ErrorCode::NotLeaderForPartition
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorCode::NotEnoughReplicas => "NOT_ENOUGH_REPLICAS",
            ErrorCode::NotEnoughReplicasAfterAppend => "NOT_ENOUGH_REPLICAS_AFTER_APPEND",
            ErrorCode::RequestTimedOut => "REQUEST_TIMED_OUT",
            ErrorCode::NotLeaderForPartition => "NOT_LEADER_FOR_PARTITION",
            ErrorCode::InvalidRecord => "INVALID_RECORD",
            ErrorCode::MessageTooLarge => "MESSAGE_TOO_LARGE",
            ErrorCode::TopicAuthorizationFailed => "TOPIC_AUTHORIZATION_FAILED",
            ErrorCode::UnknownTopicOrPartition => "UNKNOWN_TOPIC_OR_PARTITION",
            ErrorCode::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_codes() {
        assert!(ErrorCode::NotEnoughReplicas.is_retriable());
        assert!(ErrorCode::NotEnoughReplicasAfterAppend.is_retriable());
        assert!(ErrorCode::RequestTimedOut.is_retriable());
        assert!(ErrorCode::NotLeaderForPartition.is_retriable());
    }

    #[test]
    fn test_fatal_codes() {
        assert!(!ErrorCode::InvalidRecord.is_retriable());
        assert!(!ErrorCode::MessageTooLarge.is_retriable());
        assert!(!ErrorCode::TopicAuthorizationFailed.is_retriable());
        assert!(!ErrorCode::UnknownTopicOrPartition.is_retriable());
        assert!(!ErrorCode::Unknown.is_retriable());
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(
            ErrorCode::NotEnoughReplicas.to_string(),
            "NOT_ENOUGH_REPLICAS"
        );
        assert_eq!(ErrorCode::InvalidRecord.to_string(), "INVALID_RECORD");
    }

    #[test]
    fn test_wire_record_size() {
        let record = WireRecord {
            key: Some(Bytes::from("key")),
            value: Bytes::from("value"),
            timestamp_ms: 0,
        };
        assert_eq!(record.size_bytes(), 8);

        let keyless = WireRecord {
            key: None,
            value: Bytes::from("value"),
            timestamp_ms: 0,
        };
        assert_eq!(keyless.size_bytes(), 5);
    }
}
