//! chartrender turns Vega-Lite-style chart specifications into PNG images.
//!
//! # Pipeline overview
//!
//! 1. **Normalize**: spec text → [`NormalizedSpec`] (JSON syntax check, default 500×350 panel)
//! 2. **Compile**: [`NormalizedSpec`] → [`Scene`] (scales, axes, legends, marks, layout)
//! 3. **Render**: [`Scene`] → [`SvgDocument`] (self-contained, byte-stable SVG)
//! 4. **Rasterize**: [`SvgDocument`] → [`RasterImage`] (PNG scaled to the requested width)
//!
//! Steps 1-4 form the in-process chain exposed as [`render_chart`]. The
//! [`RenderOrchestrator`] runs that chain in a separate `chartrender-pipeline` process per
//! request, with a wall-clock timeout and guaranteed cleanup of its temporary files.
//!
//! - **Minimal unsafe**: `unsafe` is denied crate-wide; the only exception signals a timed-out
//!   pipeline's process group.
//! - **Deterministic**: the same spec compiles to the same scene and the same SVG bytes.
//! - **Inline data only**: external data references are rejected, never fetched.
#![deny(unsafe_code)]
#![deny(missing_docs)]

/// Chart grammar → scene lowering.
pub mod compile;
/// Shared geometry, color and error types.
pub mod foundation;
/// Isolated pipeline execution.
pub mod orchestrate;
/// The in-process pipeline.
pub mod pipeline;
/// Scene serialization and rasterization.
pub mod render;
/// Chart spec parsing, typed model and normalization.
pub mod spec;

pub use compile::compiler::compile_chart;
pub use compile::scene::{GroupRole, Primitive, Scene, SceneGroup};
pub use foundation::core::{Color, Size};
pub use foundation::error::{ChartError, ChartResult, ErrorKind};
pub use orchestrate::job::{JobState, OutputArtifact, RenderJob};
pub use orchestrate::locate::{PipelineLocator, ResolvedPipeline};
pub use orchestrate::orchestrator::{OrchestratorOpts, RenderOrchestrator, RenderedChart};
pub use pipeline::{DEFAULT_OUTPUT_WIDTH, render_chart, render_chart_svg, run_pipeline_files};
pub use render::raster::{RasterImage, Rasterizer};
pub use render::svg::{SvgDocument, render_svg};
pub use spec::model::{ChartSpec, MarkType};
pub use spec::normalize::{DEFAULT_HEIGHT, DEFAULT_WIDTH, NormalizedSpec, normalize, normalize_text};
