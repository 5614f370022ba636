use std::path::PathBuf;

use async_trait::async_trait;

use crate::{
    config::{DistributerConf, DistributerConfig},
    general::{
        partition::Partition,
        scratch::ScratchArea,
        slice::{BincodeSliceMaterializer, DistributionId, Materialized, SliceMaterializer, SliceParams},
        transport::{Location, ScpTransport, Transport},
    },
    result::{DistResult, MaterializeErr, ScratchErr},
    util::block_in_place_if_multi_thread,
};

/// Deploys a partition to a location and names the deployed instance.
///
/// The returned id means the partition was materialized and the transport
/// accepted it, nothing stronger.
#[async_trait]
pub trait PartitionDistributer<P: Partition + ?Sized>: Send + Sync {
    async fn distribute(&self, location: &Location, partition: &P) -> DistResult<DistributionId>;
}

#[derive(Debug)]
pub struct DistributeReport {
    pub id: DistributionId,
    pub bytes_written: u64,
    /// File names of the transferred slices.
    pub slices: Vec<String>,
    /// Scratch area used by the call, gone unless `cleanup` is set.
    pub scratch: PathBuf,
    pub cleanup: Option<ScratchErr>,
}

/// Materializes a partition into a private scratch area, hands the slices to
/// the transport and always tries to remove the scratch area afterwards.
#[derive(Debug)]
pub struct SliceDistributer<M, T = ScpTransport> {
    conf: DistributerConf,
    materializer: M,
    transport: T,
}

pub type ScpSliceDistributer = SliceDistributer<BincodeSliceMaterializer, ScpTransport>;

impl<M> SliceDistributer<M, ScpTransport> {
    pub fn new(config: &DistributerConfig, materializer: M) -> DistResult<Self> {
        let conf = config.validate()?;
        let transport = ScpTransport::from_conf(&conf);
        Ok(Self {
            conf,
            materializer,
            transport,
        })
    }
}

impl<M, T: Transport> SliceDistributer<M, T> {
    pub fn with_transport(config: &DistributerConfig, materializer: M, transport: T) -> DistResult<Self> {
        Ok(Self {
            conf: config.validate()?,
            materializer,
            transport,
        })
    }

    pub fn conf(&self) -> &DistributerConf {
        &self.conf
    }

    pub async fn distribute_report<P>(
        &self,
        location: &Location,
        partition: &P,
    ) -> DistResult<DistributeReport>
    where
        P: Partition + ?Sized,
        M: SliceMaterializer<P>,
    {
        if partition.size() < 1 {
            return Err(MaterializeErr::EmptyPartition {
                partition: partition.id(),
            }
            .into());
        }

        let scratch = ScratchArea::acquire(&self.conf.scratch_root)?;
        let scratch_path = scratch.path().to_owned();
        let staged = self.stage_and_copy(&scratch, location, partition).await;
        // release failure is only recorded, the staged result wins
        let cleanup = scratch.release().err();

        let (materialized, slices) = staged?;
        Ok(DistributeReport {
            id: materialized.id,
            bytes_written: materialized.bytes_written,
            slices: slices
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .collect(),
            scratch: scratch_path,
            cleanup,
        })
    }

    async fn stage_and_copy<P>(
        &self,
        scratch: &ScratchArea,
        location: &Location,
        partition: &P,
    ) -> DistResult<(Materialized, Vec<PathBuf>)>
    where
        P: Partition + ?Sized,
        M: SliceMaterializer<P>,
    {
        let params = SliceParams {
            instances_grouping_size: self.conf.instances_grouping_size,
            subgraph_bins: self.conf.subgraph_bins.effective(partition.size()),
        };

        tracing::info!(
            "writing partition {} ({} subgraphs into {} bins)...",
            partition.id(),
            partition.size(),
            params.subgraph_bins
        );
        // slice writing and listing are blocking fs work
        let (materialized, slices) = block_in_place_if_multi_thread(|| {
            let materialized = self
                .materializer
                .write_partition(partition, scratch.path(), params)?;
            tracing::info!(
                "partition {} written [{} KB]",
                partition.id(),
                materialized.bytes_written / 1000
            );
            let slices = scratch.list_files()?;
            DistResult::Ok((materialized, slices))
        })?;

        tracing::info!("moving partition {} to {}...", partition.id(), location);
        self.transport.copy(&slices, location).await?;

        Ok((materialized, slices))
    }
}

#[async_trait]
impl<P, M, T> PartitionDistributer<P> for SliceDistributer<M, T>
where
    P: Partition + ?Sized,
    M: SliceMaterializer<P>,
    T: Transport,
{
    async fn distribute(&self, location: &Location, partition: &P) -> DistResult<DistributionId> {
        Ok(self.distribute_report(location, partition).await?.id)
    }
}
