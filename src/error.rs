//! Failure kinds raised by the pipeline itself.
//!
//! Malformed records and unreadable files are not errors, see `shuffle::reader`.

use failure::Fail;

#[derive(Debug, Fail)]
pub enum CensusError {
    #[fail(display = "parallelism must be at least 1")]
    ZeroParallelism,

    #[fail(display = "channel capacity must be at least 1")]
    ZeroChannelCapacity,

    #[fail(display = "progress batch must be at least 1")]
    ZeroProgressBatch,

    #[fail(display = "shard aggregator {} panicked", _0)]
    AggregatorPanicked(usize),
}
