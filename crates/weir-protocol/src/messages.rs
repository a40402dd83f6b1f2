//! Protocol messages exchanged between a producer and a broker
//!
//! WARNING: Variant order must stay stable — bincode identifies variants
//! by index.

use crate::error::{ProtocolError, Result};
use crate::types::{ErrorCode, WireRecord};
use crate::MAX_MESSAGE_SIZE;
use serde::{Deserialize, Serialize};

/// Requests a producer can issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    /// Append a batch of records to one partition.
    ///
    /// The broker appends the whole batch atomically and acknowledges it
    /// only once the requested `acks` level is satisfied.
    Produce {
        topic: String,
        partition: u32,
        /// Acknowledgment level: 0 = none, 1 = leader, -1 = all in-sync replicas
        acks: i8,
        records: Vec<WireRecord>,
    },

    /// Liveness probe
    Ping,
}

/// Broker responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    /// The batch was appended and acknowledged per the requested acks level
    Produced {
        partition: u32,
        /// Offset assigned to the first record of the batch
        base_offset: u64,
        /// Broker-assigned append timestamp, milliseconds since epoch
        timestamp_ms: i64,
    },

    /// The request failed; `code` decides whether a retry can help
    Error { code: ErrorCode, message: String },

    /// Pong
    Pong,
}

impl Request {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        decode(data)
    }
}

impl Response {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        decode(data)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let bytes =
        bincode::serialize(value).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
    if bytes.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(bytes.len(), MAX_MESSAGE_SIZE));
    }
    Ok(bytes)
}

fn decode<'de, T: Deserialize<'de>>(data: &'de [u8]) -> Result<T> {
    bincode::deserialize(data).map_err(|e| ProtocolError::Deserialization(e.to_string()))
}
