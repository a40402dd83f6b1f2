//! Weir Wire Protocol
//!
//! This crate defines the wire protocol types shared between a weir
//! producer and a broker. It provides serialization/deserialization for
//! all protocol messages.
//!
//! # Protocol Stability
//!
//! The enum variant order is significant for bincode serialization.
//! Changes to variant order will break wire compatibility with existing
//! producers/brokers.
//!
//! # Example
//!
//! ```rust,ignore
//! use weir_protocol::{Request, Response};
//!
//! // Serialize a request
//! let request = Request::Ping;
//! let bytes = request.to_bytes()?;
//!
//! // Deserialize a response
//! let response = Response::from_bytes(&bytes)?;
//! ```

mod error;
mod messages;
pub mod serde_utils;
mod types;

pub use error::{ProtocolError, Result};
pub use messages::{Request, Response};
pub use types::{ErrorCode, WireRecord};

/// Protocol version for compatibility checking
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum message size (64 MiB)
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;
