use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::result::{DistInputErr, DistResult};

pub type PartitionId = u64;
pub type SubgraphId = u64;
pub type VertexId = u64;
pub type InstanceId = u64;

/// A deployable unit of a larger graph. The distributer only needs to know how
/// many subgraphs it holds and what it is called; everything else is up to the
/// slice materializer.
pub trait Partition: Send + Sync {
    fn id(&self) -> PartitionId;
    /// Number of subgraphs.
    fn size(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub time_start: i64,
    pub time_end: i64,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subgraph {
    pub id: SubgraphId,
    #[serde(default)]
    pub vertices: Vec<VertexId>,
    #[serde(default)]
    pub edges: Vec<(VertexId, VertexId)>,
    /// Temporal snapshots, oldest first.
    #[serde(default)]
    pub instances: Vec<Instance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemPartition {
    pub id: PartitionId,
    pub subgraphs: Vec<Subgraph>,
}

impl MemPartition {
    pub fn new(id: PartitionId, subgraphs: Vec<Subgraph>) -> Self {
        Self { id, subgraphs }
    }

    pub fn load(file_path: impl AsRef<Path>) -> DistResult<Self> {
        let path = file_path.as_ref().to_owned();
        tracing::debug!("loading partition from {:?}", path);
        let file = std::fs::File::open(&path).map_err(|err| DistInputErr::ReadPartition {
            path: path.clone(),
            err,
        })?;
        let partition = serde_yaml::from_reader(file)
            .map_err(|err| DistInputErr::DecodePartition { path, err })?;
        Ok(partition)
    }

    /// Largest number of instances held by any subgraph.
    pub fn max_instances(&self) -> usize {
        self.subgraphs
            .iter()
            .map(|sg| sg.instances.len())
            .max()
            .unwrap_or(0)
    }
}

impl Partition for MemPartition {
    fn id(&self) -> PartitionId {
        self.id
    }
    fn size(&self) -> usize {
        self.subgraphs.len()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_partition_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.yaml");
        std::fs::write(
            &path,
            r#"
id: 7
subgraphs:
  - id: 1
    vertices: [1, 2, 3]
    edges: [[1, 2], [2, 3]]
    instances:
      - id: 0
        time_start: 0
        time_end: 5
        properties:
          color: red
  - id: 2
    vertices: [4]
"#,
        )
        .unwrap();

        let p = MemPartition::load(&path).unwrap();
        assert_eq!(p.id(), 7);
        assert_eq!(p.size(), 2);
        assert_eq!(p.subgraphs[0].edges, vec![(1, 2), (2, 3)]);
        assert_eq!(p.subgraphs[0].instances[0].properties["color"], "red");
        assert!(p.subgraphs[1].instances.is_empty());
        assert_eq!(p.max_instances(), 1);
    }

    #[test]
    fn test_load_partition_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MemPartition::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(
            err,
            crate::result::DistError::InputErr(DistInputErr::ReadPartition { .. })
        ));
    }
}
