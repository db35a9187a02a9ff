//! Run configuration.

use crate::error::CensusError;

/// Default number of shards (and aggregator threads).
pub const DEFAULT_PARALLELISM: u32 = 8;

/// Bounded capacity of each shard channel, readers block once it is full.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Contacts an aggregator folds before it reports progress.
pub const DEFAULT_PROGRESS_BATCH: u64 = 100_000;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Config {
    pub parallelism: u32,
    pub channel_capacity: usize,
    pub progress_batch: u64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            parallelism: DEFAULT_PARALLELISM,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            progress_batch: DEFAULT_PROGRESS_BATCH,
        }
    }
}

impl Config {
    pub fn with_parallelism(parallelism: u32) -> Config {
        Config {
            parallelism,
            ..Config::default()
        }
    }

    pub fn validate(&self) -> Result<(), CensusError> {
        if self.parallelism == 0 {
            return Err(CensusError::ZeroParallelism);
        }
        if self.channel_capacity == 0 {
            return Err(CensusError::ZeroChannelCapacity);
        }
        if self.progress_batch == 0 {
            return Err(CensusError::ZeroProgressBatch);
        }
        Ok(())
    }
}
