use std::fmt::Display;

use crate::result::{DistConfigErr, DistResult};

/// How many subgraph bins a partition is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinCount {
    /// One bin per subgraph.
    Auto,
    Fixed(usize),
}

impl Default for BinCount {
    fn default() -> Self {
        BinCount::Auto
    }
}

impl BinCount {
    /// `None` stands for automatic binning.
    pub fn from_setting(setting: Option<i64>) -> DistResult<Self> {
        match setting {
            None => Ok(BinCount::Auto),
            Some(n) if n >= 1 => Ok(BinCount::Fixed(n as usize)),
            Some(n) => Err(DistConfigErr::SubgraphBins(n).into()),
        }
    }

    /// Accepts `auto`, `automatic` or a positive integer.
    pub fn parse_setting(s: &str) -> DistResult<Option<i64>> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") || s.eq_ignore_ascii_case("automatic") {
            return Ok(None);
        }
        s.parse::<i64>()
            .map(Some)
            .map_err(|_| DistConfigErr::SubgraphBinsNotNumber(s.to_owned()).into())
    }

    /// Bins actually used for a partition of `partition_size` subgraphs, never
    /// more than there are subgraphs so no bin ends up empty.
    pub fn effective(&self, partition_size: usize) -> usize {
        match *self {
            BinCount::Auto => partition_size,
            BinCount::Fixed(n) if n > partition_size => partition_size,
            BinCount::Fixed(n) => n,
        }
    }
}

impl Display for BinCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinCount::Auto => write!(f, "auto"),
            BinCount::Fixed(n) => write!(f, "{}", n),
        }
    }
}
