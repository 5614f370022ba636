pub mod bincode_slice;

use std::path::Path;

use uuid::Uuid;

use crate::{general::partition::Partition, result::DistResult};

pub use bincode_slice::BincodeSliceMaterializer;

pub type DistributionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceParams {
    /// Instances batched into one slice, at least 1.
    pub instances_grouping_size: usize,
    /// Subgraph bins, within `[1, partition.size()]`.
    pub subgraph_bins: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    pub id: DistributionId,
    pub bytes_written: u64,
}

/// Writes a partition out as slice files under `dir`.
///
/// Every call produces a fresh id. Files left behind on error are the
/// caller's to clean up.
pub trait SliceMaterializer<P: Partition + ?Sized>: Send + Sync {
    fn write_partition(&self, partition: &P, dir: &Path, params: SliceParams)
        -> DistResult<Materialized>;
}
