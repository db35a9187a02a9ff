//! Internal implementation of shuffler.

use std::path::PathBuf;
use std::thread;

use crate::completion::Latch;
use crate::shuffle::reader::{self, FileStats};
use crate::shuffle::{self, Group, Router};

type Join = thread::JoinHandle<Vec<FileStats>>;

pub struct Shuffler {
    group: Group,
    capacity: usize,
}

/// The running reader phase.
pub struct ReadPhase {
    coordinator: Join,
}

impl Shuffler {
    /// Create a new shuffler.
    pub fn new(group: Group, capacity: usize) -> Shuffler {
        Shuffler { group, capacity }
    }

    /// Start one reader per file and return the shard receivers.
    ///
    /// Every receiver disconnects once all readers are done, which is how
    /// the aggregators learn there is no more input.
    pub fn run_partition(&self, paths: Vec<PathBuf>) -> (Vec<shuffle::Receiver>, ReadPhase) {
        let (router, receivers) = Router::open(self.group, self.capacity);

        let coordinator = thread::spawn(move || coordinate_readers(paths, router));

        (receivers, ReadPhase { coordinator })
    }
}

impl ReadPhase {
    /// Wait for the reader phase and return the stats of every file.
    pub fn join(self) -> Vec<FileStats> {
        self.coordinator.join().unwrap_or_else(|_| {
            log::error!("Reader coordinator panicked, file stats are unavailable.");
            Vec::new()
        })
    }
}

fn coordinate_readers(paths: Vec<PathBuf>, router: Router) -> Vec<FileStats> {
    let latch = Latch::new(paths.len());

    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let router = router.clone();
            let signal = latch.signal();
            let reading = path.clone();

            let handle = thread::spawn(move || {
                log::debug!("Start reading {}.", reading.display());

                let stats = reader::read_file(&reading, &router);

                // Senders go first so the shards can close right after the last signal.
                drop(router);
                signal.complete();

                log::debug!(
                    "Finish reading {}: {} contacts, {} skipped lines.",
                    stats.path.display(),
                    stats.contacts,
                    stats.skipped
                );
                stats
            });

            (path, handle)
        })
        .collect();

    let finished = latch.wait();
    log::info!("All {} readers finished, close shard channels.", finished);

    drop(router);

    handles
        .into_iter()
        .map(|(path, handle)| {
            handle.join().unwrap_or_else(|_| {
                log::error!("Reader of {} panicked.", path.display());
                FileStats {
                    path,
                    error: Some("reader panicked".to_string()),
                    ..FileStats::default()
                }
            })
        })
        .collect()
}
