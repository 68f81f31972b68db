//! First-success race over a fixed set of probes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::models::Candidate;
use crate::probe::BoxedProbe;

/// Single-assignment result slot shared by every probe task.
///
/// `won` is set by the first success; `completed` counts finished probes so
/// the all-failed case is detected exactly once, when the count reaches the
/// number of probes issued.
struct RaceSlot<T> {
    won: AtomicBool,
    completed: AtomicUsize,
    expected: usize,
    tx: Mutex<Option<oneshot::Sender<Option<T>>>>,
}

impl<T> RaceSlot<T> {
    fn new(expected: usize, tx: oneshot::Sender<Option<T>>) -> Self {
        Self {
            won: AtomicBool::new(false),
            completed: AtomicUsize::new(0),
            expected,
            tx: Mutex::new(Some(tx)),
        }
    }

    fn is_won(&self) -> bool {
        self.won.load(Ordering::SeqCst)
    }

    fn report(&self, value: Option<T>) {
        // Claim the win before counting, so the final failure can never
        // observe a full count without also observing the win.
        if let Some(value) = value {
            if !self.won.swap(true, Ordering::SeqCst) {
                self.deliver(Some(value));
            }
        }

        let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        if done == self.expected && !self.won.load(Ordering::SeqCst) {
            self.deliver(None);
        }
    }

    fn deliver(&self, value: Option<T>) {
        let sender = self.tx.lock().ok().and_then(|mut tx| tx.take());
        if let Some(sender) = sender {
            let _ = sender.send(value);
        }
    }
}

/// Probe every candidate concurrently; the first to report found wins.
///
/// Returns the winner with its index in generation order. Probes still in
/// flight after a win keep running but their results are ignored; probes
/// still waiting on pacing when the win lands are never sent.
pub(crate) async fn first_found(
    probe: &BoxedProbe,
    candidates: &[Candidate],
) -> Option<(usize, Candidate)> {
    if candidates.is_empty() {
        return None;
    }

    let (tx, rx) = oneshot::channel();
    let slot = Arc::new(RaceSlot::new(candidates.len(), tx));

    for (index, candidate) in candidates.iter().cloned().enumerate() {
        let probe = Arc::clone(probe);
        let slot = Arc::clone(&slot);
        tokio::spawn(async move {
            // A paced candidate may still be queued when another wins.
            probe.pace(&candidate.path).await;
            if slot.is_won() {
                slot.report(None);
                return;
            }
            let found = probe.check(&candidate.path).await.is_found();
            slot.report(found.then_some((index, candidate)));
        });
    }

    rx.await.unwrap_or(None)
}
