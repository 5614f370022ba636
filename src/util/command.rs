use std::process::{ExitStatus, Stdio};

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    process::Command,
};

use crate::result::{DistResult, DistRuntimeErr};

/// Output of a finished child whose stdio was drained into tracing.
#[derive(Debug)]
pub struct DebugOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

pub trait CommandDebugStdio {
    /// Runs the command to completion, forwarding every stdout/stderr line to
    /// `tracing::debug!` and collecting both streams.
    ///
    /// The outer error is a spawn failure, the inner one a runtime failure
    /// while draining output.
    async fn output_debug(&mut self) -> std::io::Result<DistResult<DebugOutput>>;
}

impl CommandDebugStdio for Command {
    async fn output_debug(&mut self) -> std::io::Result<DistResult<DebugOutput>> {
        let mut child = self
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let program = self.as_std().get_program().to_string_lossy().to_string();

        let stdout_task = child
            .stdout
            .take()
            .map(|out| tokio::spawn(drain_lines(BufReader::new(out), program.clone(), "STDOUT")));
        let stderr_task = child
            .stderr
            .take()
            .map(|err| tokio::spawn(drain_lines(BufReader::new(err), program.clone(), "STDERR")));

        let status = child.wait().await?;

        let mut collected = Vec::with_capacity(2);
        for task in [stdout_task, stderr_task] {
            let text = match task {
                Some(task) => match task.await {
                    Ok(text) => text,
                    Err(err) => {
                        return Ok(Err(DistRuntimeErr::TokioJoin {
                            err,
                            context: format!("draining output of {}", program),
                        }
                        .into()))
                    }
                },
                None => String::new(),
            };
            collected.push(text);
        }
        let stderr = collected.pop().unwrap_or_default();
        let stdout = collected.pop().unwrap_or_default();

        Ok(Ok(DebugOutput {
            status,
            stdout,
            stderr,
        }))
    }
}

/// Reads until EOF so the child never sees a closed pipe; bytes that are not
/// utf8 are replaced rather than ending the drain.
async fn drain_lines<R>(mut reader: R, program: String, tag: &'static str) -> String
where
    R: AsyncBufRead + Unpin,
{
    let mut all = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                tracing::debug!("[{}][{}] {}", program, tag, line);
                all += line;
                all.push('\n');
            }
            Err(err) => {
                tracing::warn!("[{}][{}] read failed: {}", program, tag, err);
                break;
            }
        }
    }
    all
}
