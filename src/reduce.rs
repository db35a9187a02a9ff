//! Reducer
//!
//! One aggregator thread per shard folds that shard's contacts into its own
//! map. Nothing else ever touches the map until the aggregator returns it,
//! so the maps need no synchronization.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::mpsc;
use std::thread;

use crate::completion::Latch;
use crate::entry::Contact;
use crate::error::CensusError;
use crate::shuffle;

/// Fingerprint to the ids of every contact carrying it, in arrival order.
pub type ShardMap = HashMap<u64, Vec<i64>>;

const INITIAL_SHARD_CAPACITY: usize = 1000;

pub struct Reducer {
    batch: u64,
}

/// The running aggregator phase.
pub struct AggregatePhase {
    latch: Latch,
    handles: Vec<thread::JoinHandle<ShardMap>>,
}

impl Reducer {
    pub fn new(batch: u64) -> Reducer {
        Reducer { batch }
    }

    /// Spawn one aggregator per shard receiver.
    pub fn spawn_aggregators(
        &self,
        receivers: Vec<shuffle::Receiver>,
        progress: &mpsc::Sender<u64>,
    ) -> AggregatePhase {
        log::info!("Start {} shard aggregators.", receivers.len());

        let latch = Latch::new(receivers.len());
        let batch = self.batch;

        let handles = receivers
            .into_iter()
            .enumerate()
            .map(|(index, rx)| {
                let progress = progress.clone();
                let signal = latch.signal();

                thread::spawn(move || {
                    let shard = aggregate(rx, &progress, batch);
                    log::debug!("Shard {} holds {} fingerprints.", index, shard.len());
                    signal.complete();
                    shard
                })
            })
            .collect();

        AggregatePhase { latch, handles }
    }
}

impl AggregatePhase {
    /// Wait for every aggregator and take ownership of the frozen shards.
    pub fn join(self) -> Result<Vec<ShardMap>, CensusError> {
        let finished = self.latch.wait();
        log::info!("All {} shard aggregators finished.", finished);

        self.handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| {
                handle
                    .join()
                    .map_err(|_| CensusError::AggregatorPanicked(index))
            })
            .collect()
    }
}

/// Drain one shard channel until every reader is done.
fn aggregate(rx: shuffle::Receiver, progress: &mpsc::Sender<u64>, batch: u64) -> ShardMap {
    let mut shard = ShardMap::with_capacity(INITIAL_SHARD_CAPACITY);
    let mut count = 0;

    for Contact { id, fingerprint } in rx {
        shard.entry(fingerprint).or_insert_with(Vec::new).push(id);

        count += 1;
        if count == batch {
            // The reporter may be gone; progress is only observational.
            let _ = progress.send(count);
            count = 0;
        }
    }

    if count > 0 {
        let _ = progress.send(count);
    }

    shard
}

/// Identity counts over all shards.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct Summary {
    /// Distinct fingerprints.
    pub all: u64,
    /// Fingerprints seen in exactly one record.
    pub uniq: u64,
}

impl Summary {
    pub fn merge(shards: &[ShardMap]) -> Summary {
        shards
            .iter()
            .flat_map(|shard| shard.values())
            .fold(Summary::default(), |acc, ids| Summary {
                all: acc.all + 1,
                uniq: acc.uniq + (ids.len() == 1) as u64,
            })
    }

    /// Share of identities seen exactly once, `None` without any identity.
    pub fn percentage(&self) -> Option<f64> {
        if self.all == 0 {
            None
        } else {
            Some(self.uniq as f64 / self.all as f64 * 100.0)
        }
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "Found {} unique emails, {} only once ", self.all, self.uniq)?;

        match self.percentage() {
            Some(percentage) => write!(f, "({:.2}%)", percentage),
            None => write!(f, "(undefined)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shard_of(entries: Vec<(u64, Vec<i64>)>) -> ShardMap {
        entries.into_iter().collect()
    }

    #[test]
    fn test_aggregate_groups_ids() {
        let (tx, rx) = mpsc::channel::<u64>();
        let (contacts, shard_rx) = mpsc::sync_channel(16);

        for (id, fingerprint) in vec![(1, 7), (2, 7), (3, 9)] {
            contacts.send(Contact::new(id, fingerprint)).unwrap();
        }
        drop(contacts);

        let shard = aggregate(shard_rx, &tx, 100_000);
        drop(tx);

        assert_eq!(shard, shard_of(vec![(7, vec![1, 2]), (9, vec![3])]));
        assert_eq!(rx.iter().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_aggregate_reports_batches_and_remainder() {
        let (tx, rx) = mpsc::channel::<u64>();
        let (contacts, shard_rx) = mpsc::sync_channel(16);

        let feeder = thread::spawn(move || {
            for id in 0..7 {
                contacts.send(Contact::new(id, id as u64)).unwrap();
            }
        });

        let shard = aggregate(shard_rx, &tx, 3);
        drop(tx);
        feeder.join().unwrap();

        assert_eq!(shard.len(), 7);
        assert_eq!(rx.iter().collect::<Vec<_>>(), vec![3, 3, 1]);
    }

    #[test]
    fn test_aggregate_phase_joins_every_shard() {
        let (tx, rx) = mpsc::channel::<u64>();
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..3).map(|_| mpsc::sync_channel(4)).unzip();

        let phase = Reducer::new(2).spawn_aggregators(receivers, &tx);
        drop(tx);

        for (index, sender) in senders.into_iter().enumerate() {
            for id in 0..5 {
                sender.send(Contact::new(id, index as u64)).unwrap();
            }
        }

        let shards = phase.join().unwrap();
        assert_eq!(shards.len(), 3);
        for (index, shard) in shards.iter().enumerate() {
            assert_eq!(shard[&(index as u64)], vec![0, 1, 2, 3, 4]);
        }
        assert_eq!(rx.iter().sum::<u64>(), 15);
    }

    #[test]
    fn test_panicked_aggregator_is_an_error() {
        let latch = Latch::new(1);
        let signal = latch.signal();

        let handle = thread::spawn(move || -> ShardMap {
            let _signal = signal;
            panic!("out of memory");
        });

        let phase = AggregatePhase {
            latch,
            handles: vec![handle],
        };

        match phase.join() {
            Err(CensusError::AggregatorPanicked(index)) => assert_eq!(index, 0),
            other => panic!("unexpected result {:?}", other.map(|shards| shards.len())),
        }
    }

    #[test]
    fn test_merge() {
        let shards = vec![
            shard_of(vec![(1, vec![1, 2]), (2, vec![3])]),
            shard_of(vec![]),
            shard_of(vec![(3, vec![4]), (4, vec![5, 6, 7])]),
        ];

        let summary = Summary::merge(&shards);

        assert_eq!(summary, Summary { all: 4, uniq: 2 });
        assert_eq!(summary.percentage(), Some(50.0));
    }

    #[test]
    fn test_merge_all_unique() {
        let shards = vec![shard_of(vec![(1, vec![1]), (2, vec![2])])];

        let summary = Summary::merge(&shards);

        assert_eq!(summary.all, summary.uniq);
    }

    #[test]
    fn test_empty_summary_is_undefined() {
        let summary = Summary::merge(&[]);

        assert_eq!(summary.percentage(), None);
        assert_eq!(
            summary.to_string(),
            "Found 0 unique emails, 0 only once (undefined)"
        );
    }

    #[test]
    fn test_summary_display() {
        let summary = Summary { all: 3, uniq: 1 };

        assert_eq!(
            summary.to_string(),
            "Found 3 unique emails, 1 only once (33.33%)"
        );
    }
}
