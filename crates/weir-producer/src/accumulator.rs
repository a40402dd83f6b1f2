//! Buffers caller records into per-partition batches
//!
//! One open batch exists per partition. A record joins the open batch
//! while the byte-size, record-count, and linger limits all hold;
//! otherwise the open batch is sealed — handed to the dispatcher — and a
//! fresh one is opened. Sealing moves the batch out of the accumulator,
//! so a batch can never be sealed twice, and the next batch starts
//! filling while the sealed one is still in flight.

use crate::batch::RecordBatch;
use crate::completion::FlushGate;
use crate::config::ProducerConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::record::{DeliveryHandle, Record, TopicPartition};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub(crate) struct Accumulator {
    inner: Arc<AccumulatorInner>,
}

struct AccumulatorInner {
    config: ProducerConfig,
    dispatcher: Dispatcher,
    gate: Arc<FlushGate>,
    state: Mutex<AccumulatorState>,
}

struct AccumulatorState {
    open: HashMap<TopicPartition, RecordBatch>,
    next_batch_id: u64,
    closed: bool,
}

impl Accumulator {
    pub(crate) fn new(
        config: ProducerConfig,
        dispatcher: Dispatcher,
        gate: Arc<FlushGate>,
    ) -> Self {
        Self {
            inner: Arc::new(AccumulatorInner {
                config,
                dispatcher,
                gate,
                state: Mutex::new(AccumulatorState {
                    open: HashMap::new(),
                    next_batch_id: 0,
                    closed: false,
                }),
            }),
        }
    }

    /// Append `record` to the partition's open batch, sealing first if it
    /// does not fit. Returns the record's pending handle.
    pub(crate) fn submit(&self, tp: TopicPartition, record: Record) -> Result<DeliveryHandle> {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        if state.closed {
            return Err(Error::Closed);
        }

        let mut batch = match state.open.remove(&tp) {
            Some(open)
                if open.has_room_for(
                    &record,
                    inner.config.batch_size_limit,
                    inner.config.batch_record_limit,
                ) =>
            {
                open
            }
            Some(full) => {
                debug!(
                    "Sealing batch {} for {} ({} records, {} bytes): no room left",
                    full.id(),
                    tp,
                    full.record_count(),
                    full.size_bytes()
                );
                inner.dispatcher.dispatch(full);
                self.open_batch(&mut state, &tp)
            }
            None => self.open_batch(&mut state, &tp),
        };

        let rx = batch.push(record);

        // Seal immediately when the batch hit a limit, or when there is no
        // linger window to wait out.
        if inner.config.linger_ms == 0
            || batch.is_full(
                inner.config.batch_size_limit,
                inner.config.batch_record_limit,
            )
        {
            inner.dispatcher.dispatch(batch);
        } else {
            state.open.insert(tp, batch);
        }

        Ok(DeliveryHandle::new(rx))
    }

    /// Seal every open batch (used by `flush`)
    pub(crate) fn seal_open(&self) {
        let mut state = self.inner.state.lock();
        // Dispatch under the lock so a concurrent submit cannot slip a
        // newer batch for the same partition in front of an older one.
        for (tp, batch) in state.open.drain() {
            debug!(
                "Sealing batch {} for {} ({} records): flush requested",
                batch.id(),
                tp,
                batch.record_count()
            );
            self.inner.dispatcher.dispatch(batch);
        }
    }

    /// Reject further submissions and seal what is buffered
    pub(crate) fn close(&self) {
        let mut state = self.inner.state.lock();
        state.closed = true;
        for (_, batch) in state.open.drain() {
            self.inner.dispatcher.dispatch(batch);
        }
        drop(state);
        self.inner.dispatcher.shutdown();
    }

    fn open_batch(&self, state: &mut AccumulatorState, tp: &TopicPartition) -> RecordBatch {
        let id = state.next_batch_id;
        state.next_batch_id += 1;
        let batch = RecordBatch::new(
            tp.clone(),
            id,
            self.inner.config.delivery_timeout,
            Arc::clone(&self.inner.gate),
        );
        if self.inner.config.linger_ms > 0 {
            self.spawn_linger_timer(tp.clone(), id);
        }
        batch
    }

    /// Seal the partition's open batch once its linger window elapses,
    /// unless a size/count limit (or flush/close) already sealed it.
    fn spawn_linger_timer(&self, tp: TopicPartition, batch_id: u64) {
        let inner = Arc::clone(&self.inner);
        let linger = Duration::from_millis(inner.config.linger_ms);
        tokio::spawn(async move {
            tokio::time::sleep(linger).await;
            let mut state = inner.state.lock();
            if state.open.get(&tp).map(RecordBatch::id) != Some(batch_id) {
                return;
            }
            if let Some(batch) = state.open.remove(&tp) {
                debug!(
                    "Sealing batch {} for {} ({} records): linger of {:?} elapsed",
                    batch.id(),
                    tp,
                    batch.record_count(),
                    linger
                );
                inner.dispatcher.dispatch(batch);
            }
        });
    }
}
