use std::path::PathBuf;

use thiserror::Error;
use tokio::task::JoinError;

use crate::general::partition::PartitionId;

pub type DistResult<T> = Result<T, DistError>;

#[derive(Debug)]
pub enum DistConfigErr {
    InstancesGroupingSize(i64),
    SubgraphBins(i64),
    SubgraphBinsNotNumber(String),
    MissingTransportBinary,
    InvalidLocation { location: String, reason: String },
    ReadConfigFile { path: PathBuf, err: std::io::Error },
    DecodeConfigFile { path: PathBuf, err: serde_yaml::Error },
}

#[derive(Debug)]
pub enum MaterializeErr {
    EmptyPartition {
        partition: PartitionId,
    },
    Io {
        context: String,
        err: std::io::Error,
    },
    Encode {
        context: String,
        err: Box<bincode::ErrorKind>,
    },
    ListSlices(walkdir::Error),
}

#[derive(Debug)]
pub enum TransportErr {
    SpawnFailed {
        binary: PathBuf,
        err: std::io::Error,
    },
    ExitFailure {
        binary: PathBuf,
        code: Option<i32>,
        stderr: String,
    },
}

/// Scratch area failures. `Release` is the cleanup failure of a distribute
/// call; it is recorded in the report and never returned as the call's error.
#[derive(Debug)]
pub enum ScratchErr {
    Acquire { root: PathBuf, err: std::io::Error },
    Release { path: PathBuf, err: std::io::Error },
}

#[derive(Debug)]
pub enum DistInputErr {
    ReadPartition { path: PathBuf, err: std::io::Error },
    DecodePartition { path: PathBuf, err: serde_yaml::Error },
}

#[derive(Debug)]
pub enum DistRuntimeErr {
    TokioJoin { err: JoinError, context: String },
}

#[derive(Error, Debug)]
pub enum DistError {
    #[error("Config error: {0:?}")]
    ConfigErr(DistConfigErr),

    #[error("Materialize error: {0:?}")]
    MaterializeErr(MaterializeErr),

    #[error("Transport error: {0:?}")]
    TransportErr(TransportErr),

    #[error("Scratch error: {0:?}")]
    ScratchErr(ScratchErr),

    #[error("Input error: {0:?}")]
    InputErr(DistInputErr),

    #[error("Runtime error: {0:?}")]
    RuntimeErr(DistRuntimeErr),
}

impl From<DistConfigErr> for DistError {
    fn from(e: DistConfigErr) -> Self {
        DistError::ConfigErr(e)
    }
}

impl From<MaterializeErr> for DistError {
    fn from(e: MaterializeErr) -> Self {
        DistError::MaterializeErr(e)
    }
}

impl From<TransportErr> for DistError {
    fn from(e: TransportErr) -> Self {
        DistError::TransportErr(e)
    }
}

impl From<ScratchErr> for DistError {
    fn from(e: ScratchErr) -> Self {
        DistError::ScratchErr(e)
    }
}

impl From<DistInputErr> for DistError {
    fn from(e: DistInputErr) -> Self {
        DistError::InputErr(e)
    }
}

impl From<DistRuntimeErr> for DistError {
    fn from(e: DistRuntimeErr) -> Self {
        DistError::RuntimeErr(e)
    }
}

impl From<walkdir::Error> for DistError {
    fn from(e: walkdir::Error) -> Self {
        DistError::MaterializeErr(MaterializeErr::ListSlices(e))
    }
}

/// Attaches a context string to foreign errors raised while writing slices.
pub trait MaterializeResultExt<T> {
    fn materialize_ctx(self, context: impl FnOnce() -> String) -> DistResult<T>;
}

impl<T> MaterializeResultExt<T> for Result<T, std::io::Error> {
    fn materialize_ctx(self, context: impl FnOnce() -> String) -> DistResult<T> {
        self.map_err(|err| {
            MaterializeErr::Io {
                context: context(),
                err,
            }
            .into()
        })
    }
}

impl<T> MaterializeResultExt<T> for Result<T, Box<bincode::ErrorKind>> {
    fn materialize_ctx(self, context: impl FnOnce() -> String) -> DistResult<T> {
        self.map_err(|err| {
            MaterializeErr::Encode {
                context: context(),
                err,
            }
            .into()
        })
    }
}

impl DistError {
    pub fn is_config_err(&self) -> bool {
        matches!(self, DistError::ConfigErr(_))
    }
    pub fn is_materialize_err(&self) -> bool {
        matches!(self, DistError::MaterializeErr(_))
    }
    pub fn is_transport_err(&self) -> bool {
        matches!(self, DistError::TransportErr(_))
    }
}
