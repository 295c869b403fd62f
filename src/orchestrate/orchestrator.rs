use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::foundation::error::{ChartError, ChartResult};
use crate::orchestrate::job::RenderJob;
use crate::orchestrate::locate::{PipelineLocator, augmented_search_path, default_path_dirs};
use crate::orchestrate::process::run_with_timeout;
use crate::pipeline::DEFAULT_OUTPUT_WIDTH;
use crate::spec::normalize::parse_spec_text;

/// Orchestrator configuration. Every field has a default, so `{}` is a valid config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorOpts {
    /// Root under which rendered images are stored.
    pub output_root: PathBuf,
    /// Subdirectory of `output_root` (and of the locator) for chart images.
    pub output_subdir: String,
    /// Prefix of returned locators.
    pub locator_prefix: String,
    /// Directory for transient input artifacts; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
    /// Wall-clock budget for one pipeline run.
    pub timeout_ms: u64,
    /// Smallest accepted output width.
    pub min_width: u32,
    /// Largest accepted output width.
    pub max_width: u32,
    /// Extra directories prepended to the child's `PATH` (after the built-in ones).
    pub extra_path_dirs: Vec<PathBuf>,
    /// Pipeline discovery.
    pub locator: PipelineLocator,
}

impl Default for OrchestratorOpts {
    fn default() -> Self {
        Self {
            output_root: std::env::temp_dir().join("chartrender"),
            output_subdir: "charts".to_string(),
            locator_prefix: "/storage".to_string(),
            temp_dir: None,
            timeout_ms: 30_000,
            min_width: 200,
            max_width: 4000,
            extra_path_dirs: Vec::new(),
            locator: PipelineLocator::default(),
        }
    }
}

impl OrchestratorOpts {
    /// Load options from a JSON file.
    pub fn from_path(path: &Path) -> ChartResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read orchestrator config '{}'", path.display()))?;
        let opts = serde_json::from_str(&text)
            .with_context(|| format!("parse orchestrator config '{}'", path.display()))?;
        Ok(opts)
    }

    /// Pipeline timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Directory receiving output artifacts.
    pub fn output_dir(&self) -> PathBuf {
        self.output_root.join(self.output_subdir.trim_matches('/'))
    }

    /// Locator for an output artifact of job `id`.
    pub fn locator_for(&self, id: Uuid) -> String {
        format!(
            "{}/{}/{id}.png",
            self.locator_prefix.trim_end_matches('/'),
            self.output_subdir.trim_matches('/')
        )
    }
}

/// A successfully rendered chart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedChart {
    /// Caller-facing reference, e.g. `/storage/charts/<uuid>.png`.
    pub locator: String,
    /// Absolute path of the PNG.
    pub path: PathBuf,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

/// Runs the chart pipeline in an isolated, time-bounded child process per request.
///
/// Holds configuration only, so one value can serve any number of threads.
#[derive(Clone, Debug, Default)]
pub struct RenderOrchestrator {
    opts: OrchestratorOpts,
}

impl RenderOrchestrator {
    /// Orchestrator with the given options.
    pub fn new(opts: OrchestratorOpts) -> Self {
        Self { opts }
    }

    /// Active options.
    pub fn opts(&self) -> &OrchestratorOpts {
        &self.opts
    }

    /// Render `spec_text` at `width` pixels (800 by default) and return where the PNG landed.
    #[tracing::instrument(skip(self, spec_text), fields(bytes = spec_text.len()))]
    pub fn render(&self, spec_text: &str, width: Option<u32>) -> ChartResult<RenderedChart> {
        let width = width.unwrap_or(DEFAULT_OUTPUT_WIDTH);
        parse_spec_text(spec_text)?;
        if width < self.opts.min_width || width > self.opts.max_width {
            return Err(ChartError::invalid_input(format!(
                "width {width} is outside {}..={}",
                self.opts.min_width, self.opts.max_width
            )));
        }

        let output_dir = self.opts.output_dir();
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("create output directory '{}'", output_dir.display()))?;
        let temp_dir = self
            .opts
            .temp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        std::fs::create_dir_all(&temp_dir)
            .with_context(|| format!("create temp directory '{}'", temp_dir.display()))?;

        let mut job = RenderJob::create(spec_text, width, &temp_dir, &output_dir)?;
        let locator = self.opts.locator_for(job.id());
        let outcome = self.run_job(&mut job);
        let ((width, height), path) = job.finish(outcome)?;
        tracing::info!(job = %job.id(), %locator, width, height, "chart rendered");
        Ok(RenderedChart {
            locator,
            path,
            width,
            height,
        })
    }

    fn run_job(&self, job: &mut RenderJob) -> ChartResult<(u32, u32)> {
        let inherited = std::env::var_os("PATH");
        let pipeline = self.opts.locator.resolve(inherited.as_deref())?;

        let mut dirs = default_path_dirs();
        dirs.extend(self.opts.extra_path_dirs.iter().cloned());
        let search_path = augmented_search_path(inherited.as_deref(), &dirs);

        let mut cmd = Command::new(&pipeline.program);
        if let Some(script) = &pipeline.script {
            cmd.arg(script);
        }
        cmd.arg(job.input_path())
            .arg(job.output_path())
            .arg(job.width().to_string())
            .env("PATH", search_path);

        job.dispatch(self.opts.timeout());
        let output = run_with_timeout(&mut cmd, self.opts.timeout())?;
        if !output.status.success() {
            return Err(ChartError::from_pipeline_diagnostic(&output.diagnostic()));
        }
        verify_output(job.output_path())
    }
}

fn verify_output(path: &Path) -> ChartResult<(u32, u32)> {
    let len = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if len == 0 {
        return Err(ChartError::EmptyOutput(format!(
            "'{}' is missing or empty",
            path.display()
        )));
    }
    image::image_dimensions(path)
        .map_err(|e| ChartError::render(format!("pipeline output is not a readable png: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/orchestrator.rs"]
mod tests;
