#![deny(
    unused_variables,
    unused_mut,
    unused_attributes,
    dead_code,
    unused_results,
    unused_must_use,
    unconditional_recursion
)]

pub mod general;

pub mod cmd_arg;
pub mod config;
pub mod distributer;
pub mod result;
pub mod util;

pub use config::{DistributerConfig, DEFAULT_TRANSPORT_BINARY};
pub use distributer::{DistributeReport, PartitionDistributer, ScpSliceDistributer, SliceDistributer};
pub use general::{
    binning::BinCount,
    partition::{MemPartition, Partition},
    slice::{BincodeSliceMaterializer, DistributionId, SliceMaterializer},
    transport::{Location, ScpTransport, Transport},
};
pub use result::{DistError, DistResult};
