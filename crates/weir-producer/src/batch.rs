//! Per-partition record batches

use crate::completion::{BatchCompletion, FlushGate};
use crate::record::{Outcome, Record, TopicPartition};
use crate::tracker::DeliveryTracker;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use weir_protocol::WireRecord;

/// A batch of records destined for one partition.
///
/// Built by the accumulator, then moved (by value) to the dispatcher when
/// sealed — a batch is never shared between the two. Records keep their
/// append order and the whole batch travels in one send.
#[derive(Debug)]
pub(crate) struct RecordBatch {
    topic_partition: TopicPartition,
    id: u64,
    records: Vec<WireRecord>,
    size_bytes: usize,
    tracker: DeliveryTracker,
    completion: BatchCompletion,
}

impl RecordBatch {
    pub(crate) fn new(
        topic_partition: TopicPartition,
        id: u64,
        delivery_timeout: Duration,
        gate: Arc<FlushGate>,
    ) -> Self {
        Self {
            topic_partition,
            id,
            records: Vec::new(),
            size_bytes: 0,
            tracker: DeliveryTracker::new(delivery_timeout),
            completion: BatchCompletion::new(gate),
        }
    }

    /// Append a record and register its outcome waiter
    pub(crate) fn push(&mut self, record: Record) -> oneshot::Receiver<Outcome> {
        self.size_bytes += record.size_bytes();
        self.records.push(WireRecord {
            key: record.key,
            value: record.value,
            timestamp_ms: record.timestamp.timestamp_millis(),
        });
        self.completion.register()
    }

    /// Whether `record` fits under the batch limits. An empty batch
    /// accepts any record, so an oversized record still gets a batch of
    /// its own.
    pub(crate) fn has_room_for(
        &self,
        record: &Record,
        size_limit: usize,
        record_limit: usize,
    ) -> bool {
        if self.records.is_empty() {
            return true;
        }
        self.records.len() < record_limit && self.size_bytes + record.size_bytes() <= size_limit
    }

    /// Whether the batch has hit a size or count limit
    pub(crate) fn is_full(&self, size_limit: usize, record_limit: usize) -> bool {
        self.records.len() >= record_limit || self.size_bytes >= size_limit
    }

    pub(crate) fn topic_partition(&self) -> &TopicPartition {
        &self.topic_partition
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn records(&self) -> &[WireRecord] {
        &self.records
    }

    pub(crate) fn record_count(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn tracker(&self) -> &DeliveryTracker {
        &self.tracker
    }

    pub(crate) fn tracker_mut(&mut self) -> &mut DeliveryTracker {
        &mut self.tracker
    }

    /// Resolve every record's outcome; idempotent
    pub(crate) fn resolve(&mut self, outcome: Outcome) {
        self.completion.resolve(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn batch() -> RecordBatch {
        RecordBatch::new(
            TopicPartition::new("events", 0),
            1,
            Duration::from_secs(60),
            Arc::new(FlushGate::default()),
        )
    }

    #[tokio::test]
    async fn test_push_accounts_size_and_preserves_order() {
        let mut batch = batch();
        assert!(batch.is_empty());

        let _rx1 = batch.push(Record::with_key("key", "value"));
        let _rx2 = batch.push(Record::new("second"));

        assert_eq!(batch.record_count(), 2);
        assert_eq!(batch.size_bytes(), 8 + 6);
        assert_eq!(batch.records()[0].value, Bytes::from("value"));
        assert_eq!(batch.records()[1].value, Bytes::from("second"));
    }

    #[tokio::test]
    async fn test_room_limits() {
        let mut batch = batch();
        let _rx = batch.push(Record::new("0123456789"));

        // Byte-size limit
        assert!(batch.has_room_for(&Record::new("xy"), 12, 10));
        assert!(!batch.has_room_for(&Record::new("xyz"), 12, 10));

        // Record-count limit
        assert!(!batch.has_room_for(&Record::new("x"), 1024, 1));
    }

    #[tokio::test]
    async fn test_empty_batch_accepts_oversized_record() {
        let batch = batch();
        let oversized = Record::new(vec![0u8; 1024]);
        assert!(batch.has_room_for(&oversized, 16, 10));
    }

    #[tokio::test]
    async fn test_is_full_after_limit() {
        let mut batch = batch();
        let _rx = batch.push(Record::new(vec![0u8; 64]));
        assert!(batch.is_full(64, 10));
        assert!(batch.is_full(1024, 1));
        assert!(!batch.is_full(1024, 10));
    }

    #[tokio::test]
    async fn test_resolve_fans_out_identical_outcome() {
        let mut batch = batch();
        let rx1 = batch.push(Record::new("a"));
        let rx2 = batch.push(Record::new("b"));

        batch.resolve(Ok(crate::record::RecordMetadata {
            topic: "events".to_string(),
            partition: 0,
            offset: 9,
            timestamp: chrono::Utc::now(),
        }));

        let m1 = rx1.await.unwrap().unwrap();
        let m2 = rx2.await.unwrap().unwrap();
        assert_eq!(m1.offset, 9);
        assert_eq!(m2.offset, 9);
        assert_eq!(m1.partition, m2.partition);
    }
}
