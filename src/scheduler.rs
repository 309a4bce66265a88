//! Generation-stamped timeouts
//!
//! Timers post `TimeoutFired { generation }` into the conversation mailbox.
//! Cancelling is best effort: a timer whose cancellation loses the race still
//! fires, and the state machine drops it because its generation is stale.

use crate::state_machine::Event;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Handle to one armed timer
#[derive(Debug, Clone)]
pub struct TimeoutHandle {
    generation: u64,
    token: CancellationToken,
}

impl TimeoutHandle {
    #[allow(dead_code)] // Used in tests
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Issues cancellable delayed events for the state machine
pub struct TimeoutScheduler {
    event_tx: mpsc::Sender<Event>,
    pending: Vec<TimeoutHandle>,
}

impl TimeoutScheduler {
    pub fn new(event_tx: mpsc::Sender<Event>) -> Self {
        Self {
            event_tx,
            pending: Vec::new(),
        }
    }

    /// Arm a timer that fires `TimeoutFired { generation }` after `delay`
    pub fn arm(&mut self, delay: Duration, generation: u64) -> TimeoutHandle {
        // Fired and cancelled timers have nothing left to cancel
        self.pending.retain(|handle| !handle.is_cancelled());

        let token = CancellationToken::new();
        let handle = TimeoutHandle {
            generation,
            token: token.clone(),
        };

        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => {
                    token.cancel();
                    tracing::debug!(generation, "Timeout fired");
                    let _ = event_tx.send(Event::TimeoutFired { generation }).await;
                }
                () = token.cancelled() => {
                    tracing::debug!(generation, "Timeout cancelled");
                }
            }
        });

        self.pending.push(handle.clone());
        handle
    }

    /// Cancel every outstanding timer
    pub fn cancel_all(&mut self) {
        for handle in self.pending.drain(..) {
            handle.cancel();
        }
    }

    /// Number of timers that have neither fired nor been cancelled
    #[allow(dead_code)] // Used in tests
    pub fn outstanding(&self) -> usize {
        self.pending.iter().filter(|h| !h.is_cancelled()).count()
    }
}

impl Drop for TimeoutScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
