use std::time::Duration;

/// Convenience result type used across chartrender.
pub type ChartResult<T> = Result<T, ChartError>;

/// Top-level error taxonomy for one render invocation.
///
/// Every variant is local to a single invocation; none is fatal to the host process.
#[derive(thiserror::Error, Debug)]
pub enum ChartError {
    /// The spec text is empty, not well-formed JSON, or the request violates the width policy.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The spec does not satisfy the chart grammar (unknown mark, malformed encoding, ...).
    #[error("compilation failure: {0}")]
    Compilation(String),

    /// Vector image generation failed, or the isolated unit failed with an untyped diagnostic.
    #[error("render failure: {0}")]
    Render(String),

    /// The vector to raster step failed.
    #[error("rasterization failure: {0}")]
    Rasterization(String),

    /// The pipeline executable could not be resolved.
    #[error("pipeline binary not found: {0}")]
    BinaryNotFound(String),

    /// The pipeline script could not be resolved.
    #[error("pipeline script not found: {0}")]
    ScriptNotFound(String),

    /// The isolated unit exceeded its wall-clock budget and was terminated.
    #[error("render timed out after {}ms", .0.as_millis())]
    TimeoutExceeded(Duration),

    /// The isolated unit exited successfully but left no (or an empty) output artifact.
    #[error("pipeline produced no output: {0}")]
    EmptyOutput(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Fieldless discriminant of [`ChartError`], used for job bookkeeping and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`ChartError::InvalidInput`].
    InvalidInput,
    /// See [`ChartError::Compilation`].
    Compilation,
    /// See [`ChartError::Render`].
    Render,
    /// See [`ChartError::Rasterization`].
    Rasterization,
    /// See [`ChartError::BinaryNotFound`].
    BinaryNotFound,
    /// See [`ChartError::ScriptNotFound`].
    ScriptNotFound,
    /// See [`ChartError::TimeoutExceeded`].
    TimeoutExceeded,
    /// See [`ChartError::EmptyOutput`].
    EmptyOutput,
    /// See [`ChartError::Other`].
    Other,
}

impl ChartError {
    /// Build a [`ChartError::InvalidInput`] value.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build a [`ChartError::Compilation`] value.
    pub fn compilation(msg: impl Into<String>) -> Self {
        Self::Compilation(msg.into())
    }

    /// Build a [`ChartError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ChartError::Rasterization`] value.
    pub fn rasterization(msg: impl Into<String>) -> Self {
        Self::Rasterization(msg.into())
    }

    /// Return the fieldless kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Compilation(_) => ErrorKind::Compilation,
            Self::Render(_) => ErrorKind::Render,
            Self::Rasterization(_) => ErrorKind::Rasterization,
            Self::BinaryNotFound(_) => ErrorKind::BinaryNotFound,
            Self::ScriptNotFound(_) => ErrorKind::ScriptNotFound,
            Self::TimeoutExceeded(_) => ErrorKind::TimeoutExceeded,
            Self::EmptyOutput(_) => ErrorKind::EmptyOutput,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Re-type a diagnostic captured from a failed pipeline process.
    ///
    /// The native pipeline prints errors through their `Display` impl, so the stable prefixes
    /// survive the process boundary. Anything else becomes a [`ChartError::Render`] carrying the
    /// text verbatim.
    pub fn from_pipeline_diagnostic(text: &str) -> Self {
        let text = text.trim();
        let typed: [(&str, fn(String) -> Self); 4] = [
            ("compilation failure:", Self::Compilation),
            ("rasterization failure:", Self::Rasterization),
            ("invalid input:", Self::InvalidInput),
            ("render failure:", Self::Render),
        ];
        for (prefix, build) in typed {
            if let Some(rest) = text.strip_prefix(prefix) {
                return build(rest.trim().to_string());
            }
        }
        Self::Render(text.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
