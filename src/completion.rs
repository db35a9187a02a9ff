//! Counting completion barrier shared by the reader and aggregator phases.

use std::sync::mpsc;

/// Blocks until a known number of workers report completion.
pub struct Latch {
    expected: usize,
    tx: mpsc::Sender<()>,
    rx: mpsc::Receiver<()>,
}

/// One worker's completion report.
///
/// Reported by `complete`, or on drop if the worker never got that far.
pub struct Signal {
    tx: Option<mpsc::Sender<()>>,
}

impl Latch {
    pub fn new(expected: usize) -> Latch {
        let (tx, rx) = mpsc::channel();
        Latch { expected, tx, rx }
    }

    pub fn signal(&self) -> Signal {
        Signal {
            tx: Some(self.tx.clone()),
        }
    }

    /// Wait for `expected` signals and return how many arrived.
    ///
    /// Returns early when every handed out `Signal` is gone, so a latch
    /// created with more expected signals than it issued can't hang.
    pub fn wait(self) -> usize {
        let Latch { expected, tx, rx } = self;
        drop(tx);

        let mut received = 0;
        while received < expected {
            if rx.recv().is_err() {
                log::warn!(
                    "Completion barrier released with {} of {} signals.",
                    received,
                    expected
                );
                break;
            }
            received += 1;
        }

        received
    }
}

impl Signal {
    pub fn complete(mut self) {
        self.report();
    }

    fn report(&mut self) {
        if let Some(tx) = self.tx.take() {
            // The latch may already be gone if nobody waits on it.
            let _ = tx.send(());
        }
    }
}

impl Drop for Signal {
    fn drop(&mut self) {
        self.report();
    }
}
