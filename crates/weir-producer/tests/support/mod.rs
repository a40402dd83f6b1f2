//! Test doubles for the broker connection seam

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use weir_producer::{BrokerAck, BrokerConnection, FatalError, SendOutcome, TransientError};
use weir_protocol::WireRecord;

/// Enable `RUST_LOG`-driven log output for a test run
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Canned broker reply
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    /// Acknowledge the batch
    Ack,
    /// Refuse: in-sync replica requirement unmet (transient)
    Unmet,
    /// Reject fatally
    Reject,
    /// Never answer (exercises the per-attempt timeout)
    Hang,
}

/// Scripted broker double.
///
/// Replies are scripted per partition; once a partition's script is
/// exhausted (or was never set) the default reply applies. Attempt counts
/// and the time of the last attempt are captured for verification.
pub struct ScriptedBroker {
    default: Reply,
    scripts: Mutex<HashMap<u32, VecDeque<Reply>>>,
    attempts: Mutex<HashMap<u32, u64>>,
    last_attempt_at: Mutex<Option<Instant>>,
    next_offset: AtomicU64,
}

impl ScriptedBroker {
    fn with_default(default: Reply) -> Self {
        Self {
            default,
            scripts: Mutex::new(HashMap::new()),
            attempts: Mutex::new(HashMap::new()),
            last_attempt_at: Mutex::new(None),
            next_offset: AtomicU64::new(0),
        }
    }

    /// Acknowledges everything not covered by a script
    pub fn acking() -> Self {
        Self::with_default(Reply::Ack)
    }

    /// Permanently cannot satisfy the acknowledgment requirement
    pub fn failing() -> Self {
        Self::with_default(Reply::Unmet)
    }

    /// Accepts connections but never answers
    pub fn unresponsive() -> Self {
        Self::with_default(Reply::Hang)
    }

    /// Set the reply script for one partition
    pub fn script(self, partition: u32, replies: Vec<Reply>) -> Self {
        self.scripts.lock().insert(partition, replies.into());
        self
    }

    /// Send attempts observed for one partition
    pub fn attempts(&self, partition: u32) -> u64 {
        self.attempts.lock().get(&partition).copied().unwrap_or(0)
    }

    /// When the most recent send attempt arrived
    pub fn last_attempt_at(&self) -> Option<Instant> {
        *self.last_attempt_at.lock()
    }
}

#[async_trait]
impl BrokerConnection for ScriptedBroker {
    async fn produce(
        &self,
        _topic: &str,
        partition: u32,
        _acks: i8,
        records: &[WireRecord],
    ) -> SendOutcome {
        *self.last_attempt_at.lock() = Some(Instant::now());
        *self.attempts.lock().entry(partition).or_insert(0) += 1;

        let reply = self
            .scripts
            .lock()
            .get_mut(&partition)
            .and_then(|script| script.pop_front())
            .unwrap_or(self.default);

        match reply {
            Reply::Ack => SendOutcome::Acked(BrokerAck {
                partition,
                base_offset: self
                    .next_offset
                    .fetch_add(records.len() as u64, Ordering::SeqCst),
                timestamp_ms: chrono::Utc::now().timestamp_millis(),
            }),
            Reply::Unmet => SendOutcome::Transient(TransientError::AckPolicyUnmet(
                "2 in-sync replicas required, 1 available".to_string(),
            )),
            Reply::Reject => SendOutcome::Fatal(FatalError::Rejected(
                "INVALID_RECORD: value failed broker-side validation".to_string(),
            )),
            Reply::Hang => {
                std::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
        }
    }
}
