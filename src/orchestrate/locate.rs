use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ChartError, ChartResult};

/// File name of the native pipeline binary.
pub const PIPELINE_BINARY: &str = "chartrender-pipeline";

/// Search path used when the environment has no `PATH`.
pub const FALLBACK_SEARCH_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// Where to look for the pipeline program, and for its script when it is interpreter-hosted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineLocator {
    /// Name resolved through the search path when no candidate exists.
    pub binary_name: String,
    /// Well-known install locations, tried in order.
    pub binary_candidates: Vec<PathBuf>,
    /// Script locations (primary first). Empty for the native pipeline.
    pub script_candidates: Vec<PathBuf>,
}

impl Default for PipelineLocator {
    fn default() -> Self {
        Self {
            binary_name: PIPELINE_BINARY.to_string(),
            binary_candidates: vec![
                PathBuf::from("/usr/local/bin").join(PIPELINE_BINARY),
                PathBuf::from("/opt/homebrew/bin").join(PIPELINE_BINARY),
            ],
            script_candidates: Vec::new(),
        }
    }
}

/// A resolved pipeline invocation prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPipeline {
    /// Program to execute.
    pub program: PathBuf,
    /// Script passed as the first argument, if any.
    pub script: Option<PathBuf>,
}

impl PipelineLocator {
    /// Locator for a specific binary path only.
    pub fn at(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        Self {
            binary_name: program
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| PIPELINE_BINARY.to_string()),
            binary_candidates: vec![program],
            script_candidates: Vec::new(),
        }
    }

    /// Resolve the program and script.
    ///
    /// Program: the candidates in order, then next to the current executable, then `search_path`.
    /// Script: the candidates in order; only required when any are configured.
    pub fn resolve(&self, search_path: Option<&OsStr>) -> ChartResult<ResolvedPipeline> {
        let program = first_existing(&self.binary_candidates)
            .or_else(|| sibling_of_current_exe(&self.binary_name))
            .or_else(|| {
                find_on_search_path(
                    &self.binary_name,
                    search_path.unwrap_or(OsStr::new(FALLBACK_SEARCH_PATH)),
                )
            })
            .ok_or_else(|| {
                ChartError::BinaryNotFound(format!(
                    "'{}' not found in {} or on the search path",
                    self.binary_name,
                    display_list(&self.binary_candidates)
                ))
            })?;

        let script = if self.script_candidates.is_empty() {
            None
        } else {
            Some(first_existing(&self.script_candidates).ok_or_else(|| {
                ChartError::ScriptNotFound(format!(
                    "none of {} exist",
                    display_list(&self.script_candidates)
                ))
            })?)
        };
        Ok(ResolvedPipeline { program, script })
    }
}

fn display_list(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "[]".to_string();
    }
    let items: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// First candidate that exists as a regular file.
pub fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.is_file()).cloned()
}

/// Resolve `name` through a `PATH`-style list. Names containing a separator are taken as paths.
pub fn find_on_search_path(name: &str, search_path: &OsStr) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    let direct = Path::new(name);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|p| p.is_file())
}

/// `name` in the directory of the running executable, if it exists there.
pub fn sibling_of_current_exe(name: &str) -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let candidate = exe.parent()?.join(name);
    candidate.is_file().then_some(candidate)
}

/// Directories prepended to the child's search path when present on disk.
pub fn default_path_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/opt/homebrew/bin"),
        PathBuf::from("/usr/local/bin"),
    ];
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(dir);
    }
    dirs
}

/// Prepend each existing directory in `extra` that `current` lacks.
///
/// `current` defaults to [`FALLBACK_SEARCH_PATH`]. Order of `extra` is preserved.
pub fn augmented_search_path(current: Option<&OsStr>, extra: &[PathBuf]) -> OsString {
    let base = current
        .filter(|p| !p.is_empty())
        .unwrap_or(OsStr::new(FALLBACK_SEARCH_PATH));
    let existing: Vec<PathBuf> = std::env::split_paths(base).collect();
    let mut prefix: Vec<PathBuf> = Vec::new();
    for dir in extra {
        if dir.is_dir() && !existing.contains(dir) && !prefix.contains(dir) {
            prefix.push(dir.clone());
        }
    }
    if prefix.is_empty() {
        return base.to_os_string();
    }
    match std::env::join_paths(prefix.iter().chain(existing.iter())) {
        Ok(joined) => joined,
        Err(e) => {
            tracing::warn!(error = %e, "search path not augmented");
            base.to_os_string()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/locate.rs"]
mod tests;
