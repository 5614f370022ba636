use crate::{
    general::binning::BinCount,
    result::{DistConfigErr, DistResult},
};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_TRANSPORT_BINARY: &str = "scp";

/// Raw configuration surface, as read from yaml or assembled from the command
/// line. Nothing here is trusted until [`DistributerConfig::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributerConfig {
    pub transport_binary: PathBuf,
    pub extra_transport_options: Option<Vec<String>>,
    pub instances_grouping_size: i64,
    /// `None` means automatic.
    pub subgraph_bins: Option<i64>,
    /// Where scratch areas are created, system temp dir if unset.
    pub scratch_root: Option<PathBuf>,
}

impl Default for DistributerConfig {
    fn default() -> Self {
        Self {
            transport_binary: PathBuf::from(DEFAULT_TRANSPORT_BINARY),
            extra_transport_options: None,
            instances_grouping_size: 1,
            subgraph_bins: None,
            scratch_root: None,
        }
    }
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct DistributerConf {
    pub transport_binary: PathBuf,
    pub extra_transport_options: Vec<String>,
    pub instances_grouping_size: usize,
    pub subgraph_bins: BinCount,
    pub scratch_root: PathBuf,
}

impl DistributerConfig {
    pub fn validate(&self) -> DistResult<DistributerConf> {
        if self.transport_binary.as_os_str().is_empty() {
            return Err(DistConfigErr::MissingTransportBinary.into());
        }
        if self.instances_grouping_size < 1 {
            return Err(DistConfigErr::InstancesGroupingSize(self.instances_grouping_size).into());
        }
        let subgraph_bins = BinCount::from_setting(self.subgraph_bins)?;
        let transport_binary = normalize(&self.transport_binary);
        if transport_binary.as_os_str().is_empty() {
            return Err(DistConfigErr::MissingTransportBinary.into());
        }

        Ok(DistributerConf {
            transport_binary,
            extra_transport_options: self.extra_transport_options.clone().unwrap_or_default(),
            instances_grouping_size: self.instances_grouping_size as usize,
            subgraph_bins,
            scratch_root: self
                .scratch_root
                .clone()
                .unwrap_or_else(std::env::temp_dir),
        })
    }
}

/// Lexical cleanup: `.` is dropped and `name/..` collapsed. A bare name stays
/// bare so it is still looked up through PATH.
fn normalize(p: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for c in p.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => match out.last().copied() {
                Some(Component::Normal(_)) => {
                    let _ = out.pop();
                }
                // `..` right under the root is the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(c),
            },
            _ => out.push(c),
        }
    }
    out.iter().collect()
}

pub fn read_config(file_path: impl AsRef<Path>) -> DistResult<DistributerConfig> {
    let path = file_path.as_ref().to_owned();
    tracing::info!("reading config {:?}", path);
    let file = std::fs::File::open(&path).map_err(|err| DistConfigErr::ReadConfigFile {
        path: path.clone(),
        err,
    })?;
    let config = serde_yaml::from_reader(file)
        .map_err(|err| DistConfigErr::DecodeConfigFile { path, err })?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::DistError;

    #[test]
    fn test_default_config_is_valid() {
        let conf = DistributerConfig::default().validate().unwrap();
        assert_eq!(conf.transport_binary, PathBuf::from("scp"));
        assert!(conf.extra_transport_options.is_empty());
        assert_eq!(conf.instances_grouping_size, 1);
        assert_eq!(conf.subgraph_bins, BinCount::Auto);
        assert_eq!(conf.scratch_root, std::env::temp_dir());
    }

    #[test]
    fn test_reject_grouping_size() {
        for bad in [0, -1, -100] {
            let config = DistributerConfig {
                instances_grouping_size: bad,
                ..Default::default()
            };
            match config.validate() {
                Err(DistError::ConfigErr(DistConfigErr::InstancesGroupingSize(v))) => {
                    assert_eq!(v, bad)
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_reject_bins() {
        for bad in [0, -1, -7] {
            let config = DistributerConfig {
                subgraph_bins: Some(bad),
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(DistError::ConfigErr(DistConfigErr::SubgraphBins(_)))
            ));
        }
    }

    #[test]
    fn test_reject_missing_transport() {
        let config = DistributerConfig {
            transport_binary: PathBuf::new(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DistError::ConfigErr(DistConfigErr::MissingTransportBinary))
        ));
    }

    #[test]
    fn test_reject_transport_path_collapsing_to_nothing() {
        let config = DistributerConfig {
            transport_binary: PathBuf::from("bin/.."),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DistError::ConfigErr(DistConfigErr::MissingTransportBinary))
        ));
    }

    #[test]
    fn test_normalize_transport_path() {
        let config = DistributerConfig {
            transport_binary: PathBuf::from("./bin/./scp"),
            ..Default::default()
        };
        let conf = config.validate().unwrap();
        assert_eq!(conf.transport_binary, PathBuf::from("bin/scp"));

        for (raw, expect) in [
            ("/opt/tools/../bin/scp", "/opt/bin/scp"),
            ("a/b/../../scp", "scp"),
            ("../bin/scp", "../bin/scp"),
            ("../../x/../scp", "../../scp"),
            ("/../usr/bin/scp", "/usr/bin/scp"),
        ] {
            let config = DistributerConfig {
                transport_binary: PathBuf::from(raw),
                ..Default::default()
            };
            assert_eq!(
                config.validate().unwrap().transport_binary,
                PathBuf::from(expect),
                "{}",
                raw
            );
        }
    }

    #[test]
    fn test_read_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dist.yaml");
        std::fs::write(
            &path,
            r#"
transport_binary: /usr/bin/scp
extra_transport_options: ["-q", "-o", "BatchMode=yes"]
instances_grouping_size: 4
subgraph_bins: 3
"#,
        )
        .unwrap();
        let conf = read_config(&path).unwrap().validate().unwrap();
        assert_eq!(conf.transport_binary, PathBuf::from("/usr/bin/scp"));
        assert_eq!(conf.extra_transport_options, vec!["-q", "-o", "BatchMode=yes"]);
        assert_eq!(conf.instances_grouping_size, 4);
        assert_eq!(conf.subgraph_bins, BinCount::Fixed(3));
    }

    #[test]
    fn test_read_yaml_config_partial_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dist.yaml");
        std::fs::write(&path, "instances_grouping_size: 2\n").unwrap();
        let config = read_config(&path).unwrap();
        assert_eq!(config.transport_binary, PathBuf::from(DEFAULT_TRANSPORT_BINARY));
        assert_eq!(config.subgraph_bins, None);
        assert_eq!(config.instances_grouping_size, 2);
    }

    #[test]
    fn test_read_bad_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dist.yaml");
        std::fs::write(&path, "instances_grouping_size: [1, 2\n").unwrap();
        assert!(matches!(
            read_config(&path),
            Err(DistError::ConfigErr(DistConfigErr::DecodeConfigFile { .. }))
        ));
    }
}
