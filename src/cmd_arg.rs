use std::path::PathBuf;

use clap::Parser;

use crate::{
    config::{read_config, DistributerConfig},
    general::binning::BinCount,
    result::DistResult,
};

/// Materialize a graph partition into slices and copy them to a remote location
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CmdArgs {
    /// Destination, `scp://[user@]host[:port]/path`, `[user@]host:path` or a local path
    pub location: String,
    /// Partition yaml file
    pub partition: PathBuf,

    /// Yaml config, command line options override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub transport_binary: Option<PathBuf>,
    /// Extra option passed to the transport, repeatable
    #[arg(long = "transport-opt", allow_hyphen_values = true)]
    pub transport_opts: Vec<String>,
    #[arg(long)]
    pub instances_grouping: Option<i64>,
    /// `auto` or a positive number
    #[arg(long)]
    pub subgraph_bins: Option<String>,
    #[arg(long)]
    pub scratch_root: Option<PathBuf>,
}

impl CmdArgs {
    pub fn distributer_config(&self) -> DistResult<DistributerConfig> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => DistributerConfig::default(),
        };
        if let Some(binary) = &self.transport_binary {
            config.transport_binary = binary.clone();
        }
        if !self.transport_opts.is_empty() {
            config.extra_transport_options = Some(self.transport_opts.clone());
        }
        if let Some(grouping) = self.instances_grouping {
            config.instances_grouping_size = grouping;
        }
        if let Some(bins) = &self.subgraph_bins {
            config.subgraph_bins = BinCount::parse_setting(bins)?;
        }
        if let Some(root) = &self.scratch_root {
            config.scratch_root = Some(root.clone());
        }
        Ok(config)
    }
}
