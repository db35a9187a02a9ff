//! Count distinct normalized email identities across large contact files.
//!
//! Every file is read by its own thread, contacts are hash partitioned into
//! shards, and each shard is folded by a single aggregator thread before the
//! shards are merged into a `Summary`.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use failure::{Error, ResultExt};

mod completion;
mod config;
mod entry;
mod error;
mod memory;
mod progress;
mod reduce;
mod shuffle;

pub use crate::config::{Config, DEFAULT_CHANNEL_CAPACITY, DEFAULT_PARALLELISM};
pub use crate::entry::{fingerprint, normalize, Contact};
pub use crate::error::CensusError;
pub use crate::memory::{as_megabytes, MemoryProbe, ProcessMemory};
pub use crate::reduce::Summary;
pub use crate::shuffle::FileStats;

/// Outcome of a whole run.
#[derive(Debug, Clone)]
pub struct Report {
    pub summary: Summary,
    /// Contacts folded by the aggregators, as totalled by the progress reporter.
    pub contacts_read: u64,
    /// Memory growth between pipeline start and the end of aggregation, in bytes.
    pub memory_delta: i64,
    pub elapsed: Duration,
    pub files: Vec<FileStats>,
}

/// Main entry function, run the whole pipeline over `paths`.
///
/// Unreadable files and malformed lines are skipped, see `Report::files`.
pub fn count_contacts<P: MemoryProbe + ?Sized>(
    paths: Vec<PathBuf>,
    config: &Config,
    probe: &P,
) -> Result<Report, Error> {
    config.validate().context("Invalid configuration")?;

    log::info!(
        "Count contacts of {} files with {} shards.",
        paths.len(),
        config.parallelism
    );

    let started = Instant::now();
    let before = probe.measure();

    let group = shuffle::Group::new(config.parallelism);
    let (receivers, read_phase) =
        shuffle::Shuffler::new(group, config.channel_capacity).run_partition(paths);

    let progress = progress::Progress::spawn(|total| {
        log::info!("Read {:.1}M contacts...", total as f64 / 1_000_000.0)
    });
    let aggregate_phase =
        reduce::Reducer::new(config.progress_batch).spawn_aggregators(receivers, &progress.sender());

    let files = read_phase.join();
    let shards = aggregate_phase.join()?;
    let contacts_read = progress.finish();

    let after = probe.measure();

    let summary = reduce::Summary::merge(&shards);

    Ok(Report {
        summary,
        contacts_read,
        memory_delta: memory::delta(before, after),
        elapsed: started.elapsed(),
        files,
    })
}
