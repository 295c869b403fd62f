use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::foundation::error::{ChartError, ChartResult, ErrorKind};

/// Lifecycle of one render job.
///
/// `Created → InputWritten → Dispatched → {Succeeded | Failed} → Cleaned`. A failure before
/// dispatch goes straight from `InputWritten` to `Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    /// Identifier allocated.
    Created,
    /// Spec text is on disk.
    InputWritten,
    /// Pipeline process started.
    Dispatched,
    /// Output verified and kept.
    Succeeded,
    /// Terminal failure.
    Failed(ErrorKind),
    /// Transient artifacts released.
    Cleaned,
}

/// Output path that is deleted on drop unless [`OutputArtifact::keep`] is called.
#[derive(Debug)]
pub struct OutputArtifact {
    path: PathBuf,
    kept: bool,
}

impl OutputArtifact {
    /// Guard a path that may not exist yet.
    pub fn new(path: PathBuf) -> Self {
        Self { path, kept: false }
    }

    /// Guarded path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disarm the guard and hand the path to the caller.
    pub fn keep(mut self) -> PathBuf {
        self.kept = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for OutputArtifact {
    fn drop(&mut self) {
        if self.kept {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "could not remove output artifact")
            }
        }
    }
}

/// Ephemeral record of one orchestrated render.
///
/// Dropping a job releases its input artifact, and its output artifact unless the job
/// succeeded.
#[derive(Debug)]
pub struct RenderJob {
    id: Uuid,
    input: NamedTempFile,
    output: Option<OutputArtifact>,
    width: u32,
    deadline: Option<Instant>,
    state: JobState,
}

impl RenderJob {
    /// Allocate a job: write `spec_text` into `temp_dir` and reserve `<output_dir>/<id>.png`.
    pub fn create(spec_text: &str, width: u32, temp_dir: &Path, output_dir: &Path) -> ChartResult<Self> {
        let id = Uuid::new_v4();
        tracing::debug!(job = %id, state = ?JobState::Created, "job state");
        let mut input = tempfile::Builder::new()
            .prefix(&format!("chartrender-{id}-"))
            .suffix(".json")
            .tempfile_in(temp_dir)
            .with_context(|| format!("create input artifact in '{}'", temp_dir.display()))?;
        input
            .write_all(spec_text.as_bytes())
            .and_then(|()| input.flush())
            .context("write input artifact")?;

        let mut job = Self {
            id,
            input,
            output: Some(OutputArtifact::new(output_dir.join(format!("{id}.png")))),
            width,
            deadline: None,
            state: JobState::Created,
        };
        job.transition(JobState::InputWritten);
        Ok(job)
    }

    /// Job identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Path of the transient input artifact.
    pub fn input_path(&self) -> &Path {
        self.input.path()
    }

    /// Target path of the output artifact.
    pub fn output_path(&self) -> &Path {
        self.output
            .as_ref()
            .map(OutputArtifact::path)
            .unwrap_or_else(|| Path::new(""))
    }

    /// Requested pixel width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Wall-clock deadline, once dispatched.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Current state.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Mark the pipeline as started with the given budget.
    pub fn dispatch(&mut self, timeout: Duration) {
        self.deadline = Some(Instant::now() + timeout);
        self.transition(JobState::Dispatched);
    }

    /// Record the outcome. On success the output artifact is kept and its path returned.
    pub fn finish<T>(&mut self, result: ChartResult<T>) -> ChartResult<(T, PathBuf)> {
        match result {
            Ok(value) => match self.output.take() {
                Some(output) => {
                    self.transition(JobState::Succeeded);
                    Ok((value, output.keep()))
                }
                None => Err(ChartError::EmptyOutput(format!(
                    "job {} already released its output",
                    self.id
                ))),
            },
            Err(e) => {
                self.transition(JobState::Failed(e.kind()));
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: JobState) {
        tracing::debug!(job = %self.id, from = ?self.state, to = ?next, "job state");
        self.state = next;
    }
}

impl Drop for RenderJob {
    fn drop(&mut self) {
        // Field drops remove the input file and, unless kept, the output file.
        self.transition(JobState::Cleaned);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/job.rs"]
mod tests;
