//! Exactly-once resolution of batch outcomes

use crate::record::Outcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};

/// Counts unresolved records and wakes `flush` when it reaches zero
#[derive(Debug, Default)]
pub(crate) struct FlushGate {
    pending: AtomicU64,
    notify: Notify,
}

impl FlushGate {
    pub(crate) fn pending(&self) -> u64 {
        self.pending.load(Ordering::Acquire)
    }

    fn add(&self, n: u64) {
        self.pending.fetch_add(n, Ordering::Release);
    }

    fn done(&self, n: u64) {
        if n == 0 {
            return;
        }
        let prev = self.pending.fetch_sub(n, Ordering::Release);
        if prev == n {
            self.notify.notify_waiters();
        }
    }

    /// Wait until no records are pending delivery
    pub(crate) async fn wait_idle(&self) {
        loop {
            if self.pending() == 0 {
                return;
            }
            tokio::select! {
                _ = self.notify.notified() => continue,
                // Periodic re-check in case a notification was missed
                _ = tokio::time::sleep(Duration::from_millis(10)) => continue,
            }
        }
    }
}

/// Resolves the caller-visible outcome for every record of one batch.
///
/// The first `resolve` call wins: it delivers the outcome to every
/// registered waiter and releases the pending count. Later calls are
/// no-ops, so a batch can never produce two outcomes.
#[derive(Debug)]
pub(crate) struct BatchCompletion {
    waiters: Option<Vec<oneshot::Sender<Outcome>>>,
    gate: Arc<FlushGate>,
}

impl BatchCompletion {
    pub(crate) fn new(gate: Arc<FlushGate>) -> Self {
        Self {
            waiters: Some(Vec::new()),
            gate,
        }
    }

    /// Register one record's waiter. Only called while the batch is open.
    pub(crate) fn register(&mut self) -> oneshot::Receiver<Outcome> {
        let (tx, rx) = oneshot::channel();
        if let Some(waiters) = self.waiters.as_mut() {
            waiters.push(tx);
            self.gate.add(1);
        }
        rx
    }

    /// Deliver `outcome` to every waiter; no-op if already resolved
    pub(crate) fn resolve(&mut self, outcome: Outcome) {
        let Some(waiters) = self.waiters.take() else {
            return;
        };
        let n = waiters.len() as u64;
        for tx in waiters {
            let _ = tx.send(outcome.clone());
        }
        self.gate.done(n);
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.waiters.is_none()
    }
}

impl Drop for BatchCompletion {
    fn drop(&mut self) {
        // An unresolved drop still releases the pending count; the
        // waiters' receivers observe the closed channel.
        if let Some(waiters) = self.waiters.take() {
            self.gate.done(waiters.len() as u64);
        }
    }
}
