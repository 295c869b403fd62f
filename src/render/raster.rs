use std::sync::Arc;

use image::ImageEncoder as _;
use image::codecs::png::PngEncoder;

use crate::foundation::error::{ChartError, ChartResult};
use crate::render::svg::SvgDocument;

/// Largest raster edge we are willing to allocate.
pub const MAX_DIMENSION: u32 = 16_384;

/// A rasterized chart, PNG-encoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// PNG bytes.
    pub png: Vec<u8>,
}

/// SVG rasterizer with a font database loaded once.
#[derive(Clone)]
pub struct Rasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for Rasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rasterizer")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    /// Rasterizer using the system fonts.
    pub fn new() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system fonts");
        Self::with_fontdb(Arc::new(db))
    }

    /// Rasterizer with a caller-provided font database.
    pub fn with_fontdb(fontdb: Arc<usvg::fontdb::Database>) -> Self {
        Self { fontdb }
    }

    /// Rasterize `doc` scaled uniformly so the output is exactly `width` pixels wide.
    ///
    /// Height follows the document's aspect ratio, rounded to the nearest pixel.
    #[tracing::instrument(skip(self, doc), fields(svg_width = doc.width, svg_height = doc.height))]
    pub fn rasterize(&self, doc: &SvgDocument, width: u32) -> ChartResult<RasterImage> {
        if width == 0 || width > MAX_DIMENSION {
            return Err(ChartError::rasterization(format!(
                "output width {width} is outside 1..={MAX_DIMENSION}"
            )));
        }
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&doc.svg, &opts)
            .map_err(|e| ChartError::rasterization(format!("parse svg: {e}")))?;

        let size = tree.size();
        if !(size.width() > 0.0 && size.height() > 0.0) {
            return Err(ChartError::rasterization("svg has an empty size"));
        }
        let scale = width as f32 / size.width();
        let height = (size.height() * scale).round().max(1.0) as u32;
        if height > MAX_DIMENSION {
            return Err(ChartError::rasterization(format!(
                "raster size too large: {width}x{height} (max {MAX_DIMENSION}x{MAX_DIMENSION})"
            )));
        }

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| ChartError::rasterization("failed to allocate pixmap"))?;
        let xform = resvg::tiny_skia::Transform::from_scale(scale, scale);
        resvg::render(&tree, xform, &mut pixmap.as_mut());

        let mut rgba = pixmap.take();
        demultiply_rgba8_in_place(&mut rgba);
        let png = encode_png(&rgba, width, height)?;
        tracing::debug!(width, height, bytes = png.len(), "rasterized chart");
        Ok(RasterImage { width, height, png })
    }
}

fn demultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

fn encode_png(rgba: &[u8], width: u32, height: u32) -> ChartResult<Vec<u8>> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(rgba, width, height, image::ExtendedColorType::Rgba8)
        .map_err(|e| ChartError::rasterization(format!("encode png: {e}")))?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
