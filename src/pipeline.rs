//! The in-process compile → render → rasterize chain.
//!
//! Every function here is free of global state, so the chain is reentrant. The isolated
//! `chartrender-pipeline` binary is a thin wrapper around [`run_pipeline_files`].

use std::path::Path;

use anyhow::Context;

use crate::compile::compiler::compile_chart;
use crate::foundation::error::ChartResult;
use crate::render::raster::{RasterImage, Rasterizer};
use crate::render::svg::{SvgDocument, render_svg};
use crate::spec::normalize::normalize_text;

/// Output width used when the caller does not ask for one.
pub const DEFAULT_OUTPUT_WIDTH: u32 = 800;

/// Compile spec text into an SVG document at its natural size.
pub fn render_chart_svg(spec_text: &str) -> ChartResult<SvgDocument> {
    let spec = normalize_text(spec_text)?;
    let scene = compile_chart(&spec)?;
    render_svg(&scene)
}

/// Run the whole chain: spec text in, PNG out at exactly `width` pixels wide.
#[tracing::instrument(skip(rasterizer, spec_text), fields(bytes = spec_text.len()))]
pub fn render_chart(
    rasterizer: &Rasterizer,
    spec_text: &str,
    width: u32,
) -> ChartResult<RasterImage> {
    let doc = render_chart_svg(spec_text)?;
    rasterizer.rasterize(&doc, width)
}

/// File-to-file variant used by the pipeline binary.
pub fn run_pipeline_files(input: &Path, output: &Path, width: u32) -> ChartResult<RasterImage> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("read chart spec from '{}'", input.display()))?;
    let image = render_chart(&Rasterizer::new(), &text, width)?;
    std::fs::write(output, &image.png)
        .with_context(|| format!("write png to '{}'", output.display()))?;
    Ok(image)
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
