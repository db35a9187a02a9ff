//! Progress reporter.

use std::sync::mpsc;
use std::thread;

type Join = thread::JoinHandle<u64>;

/// Accumulates per-shard increments and reports the running total.
pub struct Progress {
    tx: mpsc::Sender<u64>,
    handle: Join,
}

impl Progress {
    /// Start the reporter, `report` sees the total after every increment.
    pub fn spawn<F>(report: F) -> Progress
    where
        F: FnMut(u64) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || accumulate(rx, report));

        Progress { tx, handle }
    }

    /// A handle for an aggregator to report increments with.
    pub fn sender(&self) -> mpsc::Sender<u64> {
        self.tx.clone()
    }

    /// Close the stream and return the final total.
    ///
    /// Only call once every sender handed out has been dropped.
    pub fn finish(self) -> u64 {
        let Progress { tx, handle } = self;
        drop(tx);

        handle.join().unwrap_or_else(|_| {
            log::error!("Progress reporter panicked, total is unavailable.");
            0
        })
    }
}

fn accumulate<F: FnMut(u64)>(rx: mpsc::Receiver<u64>, mut report: F) -> u64 {
    let mut total = 0;

    for increment in rx {
        total += increment;
        report(total);
    }

    total
}
