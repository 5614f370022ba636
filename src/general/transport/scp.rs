use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;

use super::{Location, Transport};
use crate::{
    config::DistributerConf,
    result::{DistResult, TransportErr},
    util::command::CommandDebugStdio,
};

/// Runs an external `scp`-compatible binary:
/// `<binary> [-P port] [extra options..] <files..> <target>`.
#[derive(Debug, Clone)]
pub struct ScpTransport {
    binary: PathBuf,
    extra_options: Vec<String>,
}

impl ScpTransport {
    pub fn new(binary: impl Into<PathBuf>, extra_options: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            extra_options,
        }
    }

    pub fn from_conf(conf: &DistributerConf) -> Self {
        Self::new(
            conf.transport_binary.clone(),
            conf.extra_transport_options.clone(),
        )
    }

    pub fn binary(&self) -> &PathBuf {
        &self.binary
    }

    pub fn build_command(&self, files: &[PathBuf], location: &Location) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(port) = location.port {
            let _ = cmd.arg("-P").arg(port.to_string());
        }
        let _ = cmd.args(&self.extra_options).args(files).arg(location.target());
        cmd
    }
}

#[async_trait]
impl Transport for ScpTransport {
    async fn copy(&self, files: &[PathBuf], location: &Location) -> DistResult<()> {
        if files.is_empty() {
            tracing::debug!("nothing to copy to {}", location);
            return Ok(());
        }
        tracing::debug!(
            "{:?} copying {} files to {}",
            self.binary,
            files.len(),
            location.target()
        );

        let output = self
            .build_command(files, location)
            .output_debug()
            .await
            .map_err(|err| TransportErr::SpawnFailed {
                binary: self.binary.clone(),
                err,
            })??;

        if !output.status.success() {
            tracing::warn!(
                "{:?} exited with {:?}: {}",
                self.binary,
                output.status.code(),
                output.stderr.trim_end()
            );
            return Err(TransportErr::ExitFailure {
                binary: self.binary.clone(),
                code: output.status.code(),
                stderr: output.stderr,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::DistError;
    use std::fs;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_build_command_layout() {
        let t = ScpTransport::new("scp", vec!["-q".to_owned(), "-C".to_owned()]);
        let loc: Location = "scp://u@h:2200/dst".parse().unwrap();
        let files = vec![PathBuf::from("/s/a"), PathBuf::from("/s/b")];
        let cmd = t.build_command(&files, &loc);
        assert_eq!(cmd.as_std().get_program(), "scp");
        assert_eq!(
            args_of(&cmd),
            vec!["-P", "2200", "-q", "-C", "/s/a", "/s/b", "u@h:/dst"]
        );
    }

    #[test]
    fn test_build_command_without_port() {
        let t = ScpTransport::new("scp", vec![]);
        let loc: Location = "h:dst".parse().unwrap();
        let cmd = t.build_command(&[PathBuf::from("a")], &loc);
        assert_eq!(args_of(&cmd), vec!["a", "h:dst"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_copy_with_cp() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let mut files = vec![];
        for name in ["x.slice", "y.slice"] {
            let p = src.path().join(name);
            fs::write(&p, name.as_bytes()).unwrap();
            files.push(p);
        }

        let t = ScpTransport::new("cp", vec![]);
        let loc = Location::local(dst.path().to_str().unwrap());
        t.copy(&files, &loc).await.unwrap();

        for name in ["x.slice", "y.slice"] {
            assert_eq!(fs::read(dst.path().join(name)).unwrap(), name.as_bytes());
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_copy_exit_failure() {
        let src = tempfile::tempdir().unwrap();
        let p = src.path().join("a");
        fs::write(&p, b"a").unwrap();

        let t = ScpTransport::new("cp", vec![]);
        let loc = Location::local(src.path().join("no/such/dir").to_str().unwrap());
        match t.copy(&[p], &loc).await {
            Err(DistError::TransportErr(TransportErr::ExitFailure { code, stderr, .. })) => {
                assert_ne!(code, Some(0));
                assert!(!stderr.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_copy_spawn_failure() {
        let t = ScpTransport::new("/nonexistent/scp", vec![]);
        let res = t
            .copy(&[PathBuf::from("/tmp/a")], &Location::local("/tmp/b"))
            .await;
        assert!(matches!(
            res,
            Err(DistError::TransportErr(TransportErr::SpawnFailed { .. }))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_copy_nothing_skips_binary() {
        let t = ScpTransport::new("/nonexistent/scp", vec![]);
        t.copy(&[], &Location::local("/tmp/b")).await.unwrap();
    }
}
