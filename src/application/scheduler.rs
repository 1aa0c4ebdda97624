use super::session::FlowId;
use crate::flow::delay::DelayStep;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// A timer that ran out, addressed to the flow that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub flow: FlowId,
    pub step: DelayStep,
}

#[derive(Debug)]
struct Envelope {
    seq: u64,
    fired: TimerFired,
}

/// Runs flow timers as sleeping tokio tasks that post back into one channel.
///
/// Every handle is kept so teardown can abort it. A message whose timer was
/// cancelled after it had already been sent is swallowed by [`next_fired`].
///
/// [`next_fired`]: TimerScheduler::next_fired
pub struct TimerScheduler {
    tx: mpsc::UnboundedSender<Envelope>,
    rx: mpsc::UnboundedReceiver<Envelope>,
    pending: HashMap<u64, JoinHandle<()>>,
    next_seq: u64,
}

impl Default for TimerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerScheduler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            pending: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, flow: FlowId, step: DelayStep, after: Duration) {
        let seq = self.next_seq;
        self.next_seq += 1;
        debug!(%flow, ?step, after_ms = after.as_millis() as u64, "Timer scheduled");

        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // The receiver lives as long as the scheduler.
            let _ = tx.send(Envelope {
                seq,
                fired: TimerFired { flow, step },
            });
        });
        self.pending.insert(seq, handle);
    }

    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            debug!(count = self.pending.len(), "Cancelling timers");
        }
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Waits for the next live timer.
    ///
    /// Never resolves while nothing is pending, so callers check
    /// [`has_pending`](TimerScheduler::has_pending) first or race it against
    /// a deadline.
    pub async fn next_fired(&mut self) -> Option<TimerFired> {
        while let Some(envelope) = self.rx.recv().await {
            if self.pending.remove(&envelope.seq).is_some() {
                return Some(envelope.fired);
            }
            debug!(seq = envelope.seq, "Discarding cancelled timer");
        }
        None
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }
}
