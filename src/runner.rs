//! Optimizer subprocess orchestration.
//!
//! The optimizer is an opaque binary driven over its command line. Both of
//! its output streams are drained concurrently: sequential draining can
//! deadlock once the child fills the OS pipe buffer on the idle stream, so
//! the two readers are separate tasks joined before the exit status is
//! inspected. Each reader is line-buffered: complete lines are forwarded
//! to the live sink immediately, the trailing fragment is retained until
//! the next read and flushed at stream end.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::{EvalError, Result};

/// Captured output of one optimizer invocation.
#[derive(Clone, Debug)]
pub struct RunOutput {
    /// Exit code (always 0; non-zero exits surface as [`EvalError::OptimizerExit`]).
    pub exit_code: i32,
    /// Full stdout text, including progress lines.
    pub stdout: String,
    /// Full stderr text.
    pub stderr: String,
}

/// Spawns the optimizer once per (manifest, partition count) pair.
#[derive(Clone, Debug)]
pub struct BenchmarkRunner {
    program: PathBuf,
    compare_baseline: bool,
    compare_google: bool,
}

impl BenchmarkRunner {
    /// Runner for the optimizer binary at `program`, with both comparison
    /// modes enabled.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            compare_baseline: true,
            compare_google: true,
        }
    }

    /// Toggles the `--compare-baseline` flag.
    #[must_use]
    pub fn compare_baseline(mut self, enabled: bool) -> Self {
        self.compare_baseline = enabled;
        self
    }

    /// Toggles the `--compare-google` flag.
    #[must_use]
    pub fn compare_google(mut self, enabled: bool) -> Self {
        self.compare_google = enabled;
        self
    }

    /// Runs the optimizer and captures both streams.
    ///
    /// A non-zero exit code is fatal for the whole sweep and is propagated
    /// unchanged; there is no retry policy.
    pub async fn run(
        &self,
        manifest: &Path,
        output_dir: &Path,
        partitions: u32,
    ) -> Result<RunOutput> {
        log::info!(
            "running {} on {} with {partitions} partitions",
            self.program.display(),
            manifest.display()
        );
        let mut command = Command::new(&self.program);
        command
            .arg("--input")
            .arg(manifest)
            .arg("--output")
            .arg(output_dir)
            .arg("--n-partitions")
            .arg(partitions.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if self.compare_baseline {
            command.arg("--compare-baseline");
        }
        if self.compare_google {
            command.arg("--compare-google");
        }

        let mut child = command.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or(EvalError::StreamMissing("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(EvalError::StreamMissing("stderr"))?;

        let stdout_task = tokio::spawn(async move {
            let mut sink = std::io::stdout();
            drain_lines(stdout, &mut sink).await
        });
        let stderr_task = tokio::spawn(async move {
            let mut sink = std::io::stderr();
            drain_lines(stderr, &mut sink).await
        });

        let stdout_text = stdout_task.await??;
        let stderr_text = stderr_task.await??;

        let status = child.wait().await?;
        if !status.success() {
            let code = status.code().unwrap_or(-1);
            log::error!("optimizer exited with code {code}");
            return Err(EvalError::OptimizerExit { code });
        }

        Ok(RunOutput {
            exit_code: 0,
            stdout: stdout_text,
            stderr: stderr_text,
        })
    }
}

/// Drains one stream, forwarding complete lines to `sink` as they arrive
/// and returning the full captured text.
///
/// Bytes are accumulated and split on line boundaries; an incomplete
/// trailing fragment is retained across reads and flushed at stream end.
pub(crate) async fn drain_lines<R, W>(mut stream: R, sink: &mut W) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let mut captured: Vec<u8> = Vec::with_capacity(4096);
    let mut pending: Vec<u8> = Vec::with_capacity(256);
    let mut chunk = [0u8; 4096];

    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        captured.extend_from_slice(&chunk[..read]);
        pending.extend_from_slice(&chunk[..read]);
        while let Some(newline) = pending.iter().position(|&byte| byte == b'\n') {
            sink.write_all(&pending[..=newline])?;
            pending.drain(..=newline);
        }
        sink.flush()?;
    }
    if !pending.is_empty() {
        sink.write_all(&pending)?;
        sink.flush()?;
    }

    Ok(String::from_utf8_lossy(&captured).into_owned())
}
