//! Per-partition dispatch of sealed batches
//!
//! Each partition gets one worker task that owns the partition's queue of
//! sealed batches and drives them to resolution strictly in seal order —
//! the worker is the partition's single in-flight slot. Backoff waits
//! suspend only their own worker, so unrelated partitions keep making
//! progress.

use crate::backoff::BackoffPolicy;
use crate::batch::RecordBatch;
use crate::config::ProducerConfig;
use crate::connection::{BrokerConnection, FatalError, SendOutcome};
use crate::error::Error;
use crate::producer::ProducerStats;
use crate::record::{RecordMetadata, TopicPartition};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Clone)]
pub(crate) struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    config: ProducerConfig,
    connection: Arc<dyn BrokerConnection>,
    backoff: BackoffPolicy,
    stats: Arc<ProducerStats>,
    partitions: Mutex<HashMap<TopicPartition, mpsc::UnboundedSender<RecordBatch>>>,
}

impl Dispatcher {
    pub(crate) fn new(
        config: ProducerConfig,
        connection: Arc<dyn BrokerConnection>,
        stats: Arc<ProducerStats>,
    ) -> Self {
        let backoff = BackoffPolicy::new(
            Duration::from_millis(config.retry_backoff_ms),
            Duration::from_millis(config.retry_backoff_max_ms),
            config.retry_multiplier,
        );
        Self {
            inner: Arc::new(DispatcherInner {
                config,
                connection,
                backoff,
                stats,
                partitions: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Hand a sealed batch to its partition's worker, spawning the worker
    /// on first use. Callers must enqueue batches for one partition in
    /// seal order; the worker preserves it.
    pub(crate) fn dispatch(&self, batch: RecordBatch) {
        let tp = batch.topic_partition().clone();
        let mut partitions = self.inner.partitions.lock();
        let tx = partitions.entry(tp.clone()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            let inner = Arc::clone(&self.inner);
            tokio::spawn(partition_worker(inner, tp.clone(), rx));
            tx
        });
        if let Err(mpsc::error::SendError(mut batch)) = tx.send(batch) {
            // Worker gone; nothing will ever send this batch
            batch.resolve(Err(Error::Closed));
        }
    }

    /// Stop accepting batches; workers drain what was already queued
    pub(crate) fn shutdown(&self) {
        self.inner.partitions.lock().clear();
    }
}

async fn partition_worker(
    inner: Arc<DispatcherInner>,
    tp: TopicPartition,
    mut rx: mpsc::UnboundedReceiver<RecordBatch>,
) {
    debug!("Dispatch worker started for {}", tp);
    while let Some(batch) = rx.recv().await {
        deliver(&inner, &tp, batch).await;
    }
    debug!("Dispatch worker stopped for {}", tp);
}

/// Drive one batch to resolution: send, classify, back off, retry, expire.
/// Exactly one attempt is in flight at any instant, and the deadline is
/// consulted before every send and before every backoff wait.
async fn deliver(inner: &DispatcherInner, tp: &TopicPartition, mut batch: RecordBatch) {
    inner.stats.batches_dispatched.fetch_add(1, Ordering::Relaxed);

    loop {
        if batch.tracker().expired() {
            expire(inner, tp, &mut batch);
            return;
        }

        batch.tracker_mut().record_attempt();
        let attempt = batch.tracker().attempts();
        if attempt > 1 {
            inner.stats.retries.fetch_add(1, Ordering::Relaxed);
        }
        if attempt == inner.config.retries.saturating_add(1) {
            debug!(
                "Retry budget of {} exceeded for {}; continuing until the delivery deadline",
                inner.config.retries, tp
            );
        }

        // Never wait on the broker past the deadline
        let attempt_window = inner.config.request_timeout.min(batch.tracker().remaining());
        let send = inner
            .connection
            .produce(&tp.topic, tp.partition, inner.config.acks, batch.records());
        let outcome = match tokio::time::timeout(attempt_window, send).await {
            Ok(outcome) => outcome,
            Err(_) => SendOutcome::Transient(crate::connection::TransientError::RequestTimedOut(
                attempt_window,
            )),
        };

        match outcome {
            SendOutcome::Acked(ack) => {
                debug!(
                    "Batch {} for {} acknowledged at offset {} (attempt {})",
                    batch.id(),
                    tp,
                    ack.base_offset,
                    attempt
                );
                inner
                    .stats
                    .records_delivered
                    .fetch_add(batch.record_count() as u64, Ordering::Relaxed);
                let metadata = RecordMetadata {
                    topic: tp.topic.clone(),
                    partition: ack.partition,
                    offset: ack.base_offset,
                    timestamp: DateTime::<Utc>::from_timestamp_millis(ack.timestamp_ms)
                        .unwrap_or_else(Utc::now),
                };
                batch.resolve(Ok(metadata));
                return;
            }
            SendOutcome::Fatal(fatal) => {
                warn!(
                    "Batch {} for {} failed fatally on attempt {}: {}",
                    batch.id(),
                    tp,
                    attempt,
                    fatal
                );
                inner
                    .stats
                    .records_failed
                    .fetch_add(batch.record_count() as u64, Ordering::Relaxed);
                let error = match fatal {
                    FatalError::Rejected(reason) => Error::Rejected {
                        partition: tp.clone(),
                        reason,
                    },
                    FatalError::Transport(message) => Error::TransportError(message),
                };
                batch.resolve(Err(error));
                return;
            }
            SendOutcome::Transient(cause) => {
                if batch.tracker().expired() {
                    expire(inner, tp, &mut batch);
                    return;
                }
                let delay = inner
                    .backoff
                    .delay_within(attempt - 1, batch.tracker().remaining());
                debug!(
                    "Transient failure for batch {} on {} (attempt {}): {}; retrying in {:?}",
                    batch.id(),
                    tp,
                    attempt,
                    cause,
                    delay
                );
                tokio::time::sleep(delay).await;
                // The top-of-loop check catches a budget that ran out
                // during the wait
            }
        }
    }
}

fn expire(inner: &DispatcherInner, tp: &TopicPartition, batch: &mut RecordBatch) {
    let elapsed_ms = batch.tracker().elapsed().as_millis() as u64;
    warn!(
        "Delivery deadline elapsed for batch {} on {} after {} attempt(s); expiring {} record(s)",
        batch.id(),
        tp,
        batch.tracker().attempts(),
        batch.record_count()
    );
    inner
        .stats
        .records_failed
        .fetch_add(batch.record_count() as u64, Ordering::Relaxed);
    batch.resolve(Err(Error::TimeoutExpired {
        partition: tp.clone(),
        records: batch.record_count(),
        elapsed_ms,
        timeout_ms: inner.config.delivery_timeout.as_millis() as u64,
    }));
}
