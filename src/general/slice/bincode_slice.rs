use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use super::{Materialized, SliceMaterializer, SliceParams};
use crate::{
    general::partition::{Instance, MemPartition, Partition, PartitionId, SubgraphId, VertexId},
    result::{DistResult, MaterializeErr, MaterializeResultExt},
};

pub const PARTITION_SLICE_EXT: &str = "partition";
pub const SUBGRAPH_SLICE_EXT: &str = "subgraphs";
pub const INSTANCE_SLICE_EXT: &str = "instances";

/// Header slice, one per distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionSlice {
    pub partition: PartitionId,
    pub id: Uuid,
    pub instances_grouping_size: u64,
    /// Subgraph ids held by each bin.
    pub bins: Vec<Vec<SubgraphId>>,
    pub instance_groups: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgraphTemplate {
    pub id: SubgraphId,
    pub vertices: Vec<VertexId>,
    pub edges: Vec<(VertexId, VertexId)>,
}

/// Structure of every subgraph in one bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgraphSlice {
    pub bin: u64,
    pub subgraphs: Vec<SubgraphTemplate>,
}

/// One instance group of one bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSlice {
    pub bin: u64,
    pub group: u64,
    /// Position of the first instance of this group within each subgraph.
    pub first_instance: u64,
    pub subgraphs: Vec<(SubgraphId, Vec<Instance>)>,
}

pub fn partition_slice_name(id: &Uuid) -> String {
    format!("{}.{}", id, PARTITION_SLICE_EXT)
}

pub fn subgraph_slice_name(id: &Uuid, bin: usize) -> String {
    format!("{}-b{}.{}", id, bin, SUBGRAPH_SLICE_EXT)
}

pub fn instance_slice_name(id: &Uuid, bin: usize, group: usize) -> String {
    format!("{}-b{}-g{}.{}", id, bin, group, INSTANCE_SLICE_EXT)
}

pub fn read_slice<T: DeserializeOwned>(path: impl AsRef<Path>) -> DistResult<T> {
    let path = path.as_ref();
    let file = File::open(path).materialize_ctx(|| format!("open slice {:?}", path))?;
    bincode::deserialize_from(BufReader::new(file))
        .materialize_ctx(|| format!("decode slice {:?}", path))
}

fn write_slice<T: Serialize>(dir: &Path, name: &str, slice: &T) -> DistResult<u64> {
    let path = dir.join(name);
    let file = File::create(&path).materialize_ctx(|| format!("create slice {:?}", path))?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, slice)
        .materialize_ctx(|| format!("encode slice {:?}", path))?;
    let file = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .materialize_ctx(|| format!("flush slice {:?}", path))?;
    let len = file
        .metadata()
        .materialize_ctx(|| format!("stat slice {:?}", path))?
        .len();
    tracing::debug!("wrote slice {} ({} bytes)", name, len);
    Ok(len)
}

/// Assigns subgraph indices to exactly `bins` bins, largest subgraph first into
/// the lightest bin. Empty bins win ties, so every bin gets at least one
/// subgraph when `bins <= weights.len()`.
pub fn bin_subgraphs(weights: &[usize], bins: usize) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|a, b| weights[*b].cmp(&weights[*a]).then(a.cmp(b)));

    let mut loads = vec![0usize; bins];
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); bins];
    for idx in order {
        let Some(bin) = (0..bins).min_by_key(|b| (loads[*b], members[*b].len(), *b)) else {
            break;
        };
        loads[bin] += weights[idx];
        members[bin].push(idx);
    }
    for m in members.iter_mut() {
        m.sort();
    }
    members
}

/// Writes slices with `bincode`: a header, one structure slice per bin and one
/// slice per (bin, instance group).
#[derive(Debug, Default, Clone)]
pub struct BincodeSliceMaterializer;

impl BincodeSliceMaterializer {
    pub fn new() -> Self {
        Self
    }
}

impl SliceMaterializer<MemPartition> for BincodeSliceMaterializer {
    fn write_partition(
        &self,
        partition: &MemPartition,
        dir: &Path,
        params: SliceParams,
    ) -> DistResult<Materialized> {
        if partition.size() == 0 {
            return Err(MaterializeErr::EmptyPartition {
                partition: partition.id(),
            }
            .into());
        }
        let id = Uuid::new_v4();
        let grouping = params.instances_grouping_size.max(1);
        let bins = params.subgraph_bins.clamp(1, partition.size());
        let groups = (partition.max_instances() + grouping - 1) / grouping;

        let weights: Vec<usize> = partition
            .subgraphs
            .iter()
            .map(|sg| sg.vertices.len())
            .collect();
        let binned = bin_subgraphs(&weights, bins);

        let mut total = write_slice(
            dir,
            &partition_slice_name(&id),
            &PartitionSlice {
                partition: partition.id(),
                id,
                instances_grouping_size: grouping as u64,
                bins: binned
                    .iter()
                    .map(|m| m.iter().map(|i| partition.subgraphs[*i].id).collect())
                    .collect(),
                instance_groups: groups as u64,
            },
        )?;

        for (bin, members) in binned.iter().enumerate() {
            let subgraphs = members
                .iter()
                .map(|i| {
                    let sg = &partition.subgraphs[*i];
                    SubgraphTemplate {
                        id: sg.id,
                        vertices: sg.vertices.clone(),
                        edges: sg.edges.clone(),
                    }
                })
                .collect();
            total += write_slice(
                dir,
                &subgraph_slice_name(&id, bin),
                &SubgraphSlice {
                    bin: bin as u64,
                    subgraphs,
                },
            )?;

            for group in 0..groups {
                let start = group * grouping;
                let subgraphs: Vec<_> = members
                    .iter()
                    .map(|i| &partition.subgraphs[*i])
                    .filter(|sg| sg.instances.len() > start)
                    .map(|sg| {
                        let end = (start + grouping).min(sg.instances.len());
                        (sg.id, sg.instances[start..end].to_vec())
                    })
                    .collect();
                if subgraphs.is_empty() {
                    continue;
                }
                total += write_slice(
                    dir,
                    &instance_slice_name(&id, bin, group),
                    &InstanceSlice {
                        bin: bin as u64,
                        group: group as u64,
                        first_instance: start as u64,
                        subgraphs,
                    },
                )?;
            }
        }

        Ok(Materialized {
            id,
            bytes_written: total,
        })
    }
}
