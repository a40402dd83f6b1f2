//! The producer facade
//!
//! Thread-safe via `Arc`: clone the handle freely across tasks. All
//! delivery work happens in background tasks owned by the accumulator and
//! dispatcher; the facade only validates, routes, and reports.

use crate::accumulator::Accumulator;
use crate::completion::FlushGate;
use crate::config::ProducerConfig;
use crate::connection::{BrokerConnection, TcpBrokerConnection};
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::record::{DeliveryHandle, Outcome, Record, TopicPartition};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Reliable at-least-once producer for a replicated log broker
pub struct Producer {
    inner: Arc<ProducerInner>,
}

struct ProducerInner {
    config: ProducerConfig,
    accumulator: Accumulator,
    gate: Arc<FlushGate>,
    stats: Arc<ProducerStats>,
    closed: AtomicBool,
}

impl Clone for Producer {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer").finish_non_exhaustive()
    }
}

impl Producer {
    /// Connect to the first bootstrap server over TCP
    pub async fn connect(config: ProducerConfig) -> Result<Self> {
        config.validate()?;
        if config.bootstrap_servers.is_empty() {
            return Err(Error::InvalidConfig(
                "no bootstrap servers configured".to_string(),
            ));
        }
        let addr = config.bootstrap_servers[0].clone();
        let connection = TcpBrokerConnection::connect(addr, config.connection_timeout).await?;
        Self::with_connection(config, Arc::new(connection))
    }

    /// Build a producer over any broker connection (tests use an
    /// in-process double here)
    pub fn with_connection(
        config: ProducerConfig,
        connection: Arc<dyn BrokerConnection>,
    ) -> Result<Self> {
        config.validate()?;

        let stats = Arc::new(ProducerStats::default());
        let gate = Arc::new(FlushGate::default());
        let dispatcher = Dispatcher::new(config.clone(), connection, Arc::clone(&stats));
        let accumulator = Accumulator::new(config.clone(), dispatcher, Arc::clone(&gate));

        info!(
            "Producer initialized (delivery_timeout: {} ms, request_timeout: {} ms, linger: {} ms)",
            config.delivery_timeout.as_millis(),
            config.request_timeout.as_millis(),
            config.linger_ms
        );

        Ok(Self {
            inner: Arc::new(ProducerInner {
                config,
                accumulator,
                gate,
                stats,
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Submit a record for delivery to an explicit partition.
    ///
    /// Returns immediately with a pending handle; the engine batches,
    /// sends, and retries in the background. The handle resolves with the
    /// record's terminal [`Outcome`] — at the latest once
    /// `delivery_timeout` has passed since its batch was created.
    pub fn submit(
        &self,
        topic: impl Into<String>,
        partition: u32,
        record: Record,
    ) -> Result<DeliveryHandle> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        self.inner
            .stats
            .records_submitted
            .fetch_add(1, Ordering::Relaxed);
        self.inner
            .accumulator
            .submit(TopicPartition::new(topic, partition), record)
    }

    /// Submit and wait for the terminal outcome (convenience)
    pub async fn send(
        &self,
        topic: impl Into<String>,
        partition: u32,
        record: Record,
    ) -> Outcome {
        match self.submit(topic, partition, record) {
            Ok(handle) => handle.wait().await,
            Err(e) => Err(e),
        }
    }

    /// Seal all open batches and wait until every pending record has
    /// resolved. Terminates at the latest when the slowest batch hits its
    /// delivery deadline.
    pub async fn flush(&self) {
        self.inner.accumulator.seal_open();
        self.inner.gate.wait_idle().await;
    }

    /// Stop accepting records, then drain everything already accepted.
    /// Subsequent submissions fail with [`Error::Closed`].
    pub async fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.accumulator.close();
        self.inner.gate.wait_idle().await;
        info!("Producer closed");
    }

    /// Number of records accepted but not yet resolved
    pub fn pending_records(&self) -> u64 {
        self.inner.gate.pending()
    }

    /// Snapshot of producer statistics
    pub fn stats(&self) -> ProducerStatsSnapshot {
        ProducerStatsSnapshot {
            records_submitted: self.inner.stats.records_submitted.load(Ordering::Relaxed),
            records_delivered: self.inner.stats.records_delivered.load(Ordering::Relaxed),
            records_failed: self.inner.stats.records_failed.load(Ordering::Relaxed),
            batches_dispatched: self.inner.stats.batches_dispatched.load(Ordering::Relaxed),
            retries: self.inner.stats.retries.load(Ordering::Relaxed),
        }
    }

    /// The configuration this producer was built with
    pub fn config(&self) -> &ProducerConfig {
        &self.inner.config
    }
}

/// Internal atomic counters
#[derive(Debug, Default)]
pub(crate) struct ProducerStats {
    pub(crate) records_submitted: AtomicU64,
    pub(crate) records_delivered: AtomicU64,
    pub(crate) records_failed: AtomicU64,
    pub(crate) batches_dispatched: AtomicU64,
    pub(crate) retries: AtomicU64,
}

/// Snapshot of producer statistics
#[derive(Debug, Clone)]
pub struct ProducerStatsSnapshot {
    /// Records accepted by `submit`
    pub records_submitted: u64,
    /// Records resolved with a broker acknowledgment
    pub records_delivered: u64,
    /// Records resolved with a terminal error
    pub records_failed: u64,
    /// Batches handed to partition workers
    pub batches_dispatched: u64,
    /// Retransmissions after transient failures
    pub retries: u64,
}

impl ProducerStatsSnapshot {
    /// Fraction of resolved records that were delivered
    pub fn success_rate(&self) -> f64 {
        let resolved = self.records_delivered + self.records_failed;
        if resolved == 0 {
            1.0
        } else {
            self.records_delivered as f64 / resolved as f64
        }
    }

    /// Records still awaiting an outcome
    pub fn pending(&self) -> u64 {
        self.records_submitted
            .saturating_sub(self.records_delivered + self.records_failed)
    }
}
