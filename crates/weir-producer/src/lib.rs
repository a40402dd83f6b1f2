//! Weir producer — reliable at-least-once delivery to a replicated log broker
//!
//! The producer accepts records for publication, buffers them into
//! per-partition batches, sends each batch to the broker, and retries
//! transient refusals (such as an unmet in-sync replica requirement) with
//! capped exponential backoff until the batch's delivery deadline elapses.
//! Every submitted record resolves with exactly one [`Outcome`]: either
//! the broker's acknowledgment or a typed, terminal error.
//!
//! # Guarantees
//!
//! - **At-least-once**: a record is only reported delivered once the
//!   broker acknowledged it at the configured `acks` level.
//! - **Per-partition ordering**: batches for one partition are sent and
//!   resolved strictly in the order they were sealed; a batch is never
//!   split or reordered.
//! - **Bounded delivery time**: once `delivery_timeout` has passed since
//!   batch creation, the batch fails with [`Error::TimeoutExpired`] no
//!   matter how much retry budget remains.
//!
//! # Example
//!
//! ```rust,ignore
//! use weir_producer::{Producer, ProducerConfig, Record};
//! use std::time::Duration;
//!
//! # async fn example() -> weir_producer::Result<()> {
//! let config = ProducerConfig::builder()
//!     .bootstrap_servers(vec!["localhost:9092".to_string()])
//!     .delivery_timeout(Duration::from_secs(120))
//!     .request_timeout(Duration::from_secs(5))
//!     .retry_backoff_ms(500)
//!     .build();
//!
//! let producer = Producer::connect(config).await?;
//!
//! let handle = producer.submit("events", 0, Record::new("hello"))?;
//! let metadata = handle.wait().await?;
//! println!("delivered at offset {}", metadata.offset);
//! # Ok(())
//! # }
//! ```

mod accumulator;
mod backoff;
mod batch;
mod completion;
pub mod config;
pub mod connection;
mod dispatcher;
pub mod error;
pub mod producer;
pub mod record;
mod tracker;

pub use config::{ProducerConfig, ProducerConfigBuilder};
pub use connection::{
    BrokerAck, BrokerConnection, FatalError, SendOutcome, TcpBrokerConnection, TransientError,
};
pub use error::{Error, Result};
pub use producer::{Producer, ProducerStatsSnapshot};
pub use record::{DeliveryHandle, Outcome, Record, RecordMetadata, TopicPartition};
