//! Single-fire completion signal.
//!
//! A [`CompletionTrigger`] / [`CompletionWaiter`] pair wraps a
//! `tokio::sync::oneshot` channel. The trigger side may be cloned and fired
//! from several places (load failure, result bridge); only the first
//! [`fire`](CompletionTrigger::fire) delivers a value, every later one is a
//! no-op. The oneshot send/receive is the release/acquire handoff between
//! the rendering context and the waiting caller.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::protocol::CheckResult;


// ============================================================================
// Constructor
// ============================================================================

/// Creates a fresh signal for one check attempt.
#[must_use]
pub fn completion_signal() -> (CompletionTrigger, CompletionWaiter) {
    let (tx, rx) = oneshot::channel();
    let trigger = CompletionTrigger {
        slot: Arc::new(Mutex::new(Some(tx))),
    };
    (trigger, CompletionWaiter { rx })
}

// ============================================================================
// CompletionTrigger
// ============================================================================

/// Firing side of a completion signal.
#[derive(Clone)]
pub struct CompletionTrigger {
    slot: Arc<Mutex<Option<oneshot::Sender<CheckResult>>>>,
}

impl CompletionTrigger {
    /// Publishes `result` if nothing was published yet.
    ///
    /// Returns `true` only for the call that actually fired. Firing after
    /// the waiter went away still counts as the one fire.
    pub fn fire(&self, result: CheckResult) -> bool {
        let Some(tx) = self.slot.lock().take() else {
            trace!(%result, "Completion signal already fired");
            return false;
        };

        if tx.send(result).is_err() {
            trace!("Completion signal fired after waiter was dropped");
        }
        true
    }

    /// Returns `true` once the signal has fired.
    #[inline]
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl fmt::Debug for CompletionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionTrigger")
            .field("fired", &self.has_fired())
            .finish()
    }
}

// ============================================================================
// WaitOutcome
// ============================================================================

/// How a wait on the signal ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The signal fired with this result.
    Completed(CheckResult),
    /// The deadline expired first.
    TimedOut,
    /// The wait was cancelled first.
    Cancelled,
    /// Every trigger was dropped without firing.
    Abandoned,
}

// ============================================================================
// CompletionWaiter
// ============================================================================

/// Waiting side of a completion signal.
#[derive(Debug)]
pub struct CompletionWaiter {
    rx: oneshot::Receiver<CheckResult>,
}

impl CompletionWaiter {
    /// Waits for the signal, at most `deadline` from now.
    ///
    /// Cancellation is checked first, so an already-cancelled token wins
    /// over a result that is already available.
    pub async fn wait(self, deadline: Duration, cancel: &CancellationToken) -> WaitOutcome {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => WaitOutcome::Cancelled,

            received = timeout(deadline, self.rx) => match received {
                Ok(Ok(result)) => WaitOutcome::Completed(result),
                Ok(Err(_)) => WaitOutcome::Abandoned,
                Err(_) => WaitOutcome::TimedOut,
            },
        }
    }

    /// Returns the result if the signal has already fired.
    #[must_use]
    pub fn try_result(&mut self) -> Option<CheckResult> {
        self.rx.try_recv().ok()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::time::Instant;
    use tokio_test::assert_pending;
    use tokio_test::task;

    #[tokio::test]
    async fn test_first_fire_wins() {
        let (trigger, waiter) = completion_signal();
        let other = trigger.clone();

        assert!(trigger.fire(CheckResult::connection_failed()));
        assert!(!other.fire(CheckResult::solved()));
        assert!(other.has_fired());

        let outcome = waiter.wait(Duration::from_secs(1), &CancellationToken::new()).await;
        assert_eq!(
            outcome,
            WaitOutcome::Completed(CheckResult::connection_failed())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_measured_from_wait_start() {
        let (_trigger, waiter) = completion_signal();
        let deadline = Duration::from_secs(30);

        let started = Instant::now();
        let outcome = waiter.wait(deadline, &CancellationToken::new()).await;

        assert_eq!(outcome, WaitOutcome::TimedOut);
        let elapsed = started.elapsed();
        assert!(elapsed >= deadline);
        assert!(elapsed < deadline + Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_cancel_before_any_event() {
        let (_trigger, waiter) = completion_signal();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = waiter.wait(Duration::from_secs(30), &cancel).await;
        assert_eq!(outcome, WaitOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_while_waiting() {
        let (_trigger, waiter) = completion_signal();
        let cancel = CancellationToken::new();

        let mut wait = task::spawn(waiter.wait(Duration::from_secs(30), &cancel));
        assert_pending!(wait.poll());

        cancel.cancel();
        assert!(wait.is_woken());
        assert_eq!(wait.await, WaitOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_dropped_trigger_abandons_wait() {
        let (trigger, waiter) = completion_signal();
        drop(trigger);

        let outcome = waiter.wait(Duration::from_secs(30), &CancellationToken::new()).await;
        assert_eq!(outcome, WaitOutcome::Abandoned);
    }

    #[test]
    fn test_fire_after_waiter_dropped_is_harmless() {
        let (trigger, waiter) = completion_signal();
        drop(waiter);

        assert!(trigger.fire(CheckResult::solved()));
        assert!(!trigger.fire(CheckResult::solved()));
    }
}
