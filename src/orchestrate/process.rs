use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::Context;

use crate::foundation::error::{ChartError, ChartResult};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Outcome of a child process that exited on its own.
#[derive(Debug)]
pub struct ProcessOutput {
    /// Exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Wall-clock time from spawn to exit.
    pub elapsed: Duration,
}

impl ProcessOutput {
    /// Diagnostic text for a failed run: stderr, else stdout, trimmed.
    pub fn diagnostic(&self) -> String {
        let err = self.stderr.trim();
        let text = if err.is_empty() {
            self.stdout.trim()
        } else {
            err
        };
        if text.is_empty() {
            format!("pipeline exited with {}", self.status)
        } else {
            text.to_string()
        }
    }
}

/// Run `cmd` to completion, killing it once `timeout` elapses.
///
/// Output goes to anonymous temp files rather than pipes so a chatty child can never block on a
/// full pipe while we poll. On unix the child leads its own process group, and a timeout kills
/// the whole group so helpers it forked do not outlive it. A killed child is always reaped
/// before returning.
#[tracing::instrument(skip(cmd), fields(program = ?cmd.get_program()))]
pub fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> ChartResult<ProcessOutput> {
    let mut out_file = tempfile::tempfile().context("create stdout capture file")?;
    let mut err_file = tempfile::tempfile().context("create stderr capture file")?;
    cmd.stdin(Stdio::null())
        .stdout(Stdio::from(
            out_file.try_clone().context("clone stdout capture handle")?,
        ))
        .stderr(Stdio::from(
            err_file.try_clone().context("clone stderr capture handle")?,
        ));
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt as _;
        cmd.process_group(0);
    }

    let start = Instant::now();
    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawn {:?}", cmd.get_program()))?;
    let pid = child.id();

    let status = loop {
        if let Some(status) = child.try_wait().context("poll pipeline status")? {
            break status;
        }
        if start.elapsed() >= timeout {
            kill_process_tree(&mut child);
            let _ = child.wait();
            tracing::warn!(pid, timeout_ms = timeout.as_millis() as u64, "pipeline killed");
            return Err(ChartError::TimeoutExceeded(timeout));
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    let elapsed = start.elapsed();
    tracing::debug!(pid, %status, elapsed_ms = elapsed.as_millis() as u64, "pipeline exited");
    Ok(ProcessOutput {
        status,
        stdout: read_capture(&mut out_file)?,
        stderr: read_capture(&mut err_file)?,
        elapsed,
    })
}

/// Kill the child's process group, falling back to the child alone.
#[cfg(unix)]
#[allow(unsafe_code)]
fn kill_process_tree(child: &mut Child) {
    // The child was spawned with `process_group(0)`, so its pid is also its group id.
    if let Ok(pgid) = i32::try_from(child.id())
        && pgid > 0
    {
        // SAFETY: `kill` takes plain integers and touches no memory of ours.
        if unsafe { libc::kill(-pgid, libc::SIGKILL) } == 0 {
            return;
        }
        tracing::debug!(pgid, error = %std::io::Error::last_os_error(), "process group kill failed");
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_process_tree(child: &mut Child) {
    let _ = child.kill();
}

fn read_capture(file: &mut File) -> ChartResult<String> {
    file.seek(SeekFrom::Start(0))
        .context("rewind capture file")?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).context("read capture file")?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/process.rs"]
mod tests;
