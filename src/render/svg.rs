//! Scene to SVG serialization.
//!
//! Output is a self-contained SVG 1.1 document: no external references, no scripts, numbers
//! written with at most two decimals. Gradient ids are numbered in paint order so the same scene
//! always serializes to the same bytes.

use std::fmt::Write as _;

use kurbo::PathEl;

use crate::compile::scene::{
    Anchor, Baseline, Paint, Primitive, Scene, SceneGroup, Stroke, TextStyle,
};
use crate::foundation::core::{Affine, BezPath, Color};
use crate::foundation::error::{ChartError, ChartResult};

/// Font stack used for all chart text.
pub const FONT_FAMILY: &str = "sans-serif";

/// A serialized chart.
#[derive(Clone, Debug, PartialEq)]
pub struct SvgDocument {
    /// SVG markup.
    pub svg: String,
    /// Intrinsic width in user units.
    pub width: f64,
    /// Intrinsic height in user units.
    pub height: f64,
}

/// Serialize a scene.
#[tracing::instrument(skip_all)]
pub fn render_svg(scene: &Scene) -> ChartResult<SvgDocument> {
    let width = scene.size.width.ceil();
    let height = scene.size.height.ceil();
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(ChartError::render(format!(
            "scene has an invalid size {}x{}",
            scene.size.width, scene.size.height
        )));
    }

    let mut w = SvgWriter::default();
    for group in scene.ordered_groups() {
        w.group(group);
    }

    let mut out = String::with_capacity(w.body.len() + w.defs.len() + 256);
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{0}" height="{1}" viewBox="0 0 {0} {1}">"#,
        num(width),
        num(height)
    );
    out.push('\n');
    if !w.defs.is_empty() {
        out.push_str("<defs>\n");
        out.push_str(&w.defs);
        out.push_str("</defs>\n");
    }
    let _ = writeln!(
        out,
        r#"<rect class="background" x="0" y="0" width="{}" height="{}"{}/>"#,
        num(width),
        num(height),
        fill_attrs(Some(Paint::solid(scene.background)))
    );
    out.push_str(&w.body);
    out.push_str("</svg>\n");

    tracing::debug!(bytes = out.len(), gradients = w.gradients, "serialized svg");
    Ok(SvgDocument {
        svg: out,
        width,
        height,
    })
}

#[derive(Default)]
struct SvgWriter {
    defs: String,
    body: String,
    gradients: usize,
}

impl SvgWriter {
    fn group(&mut self, group: &SceneGroup) {
        let _ = write!(
            self.body,
            r#"<g class="{}"{}>"#,
            escape_xml(&group.role.class_name()),
            transform_attr(group.transform)
        );
        self.body.push('\n');
        for item in &group.items {
            self.primitive(item);
        }
        self.body.push_str("</g>\n");
    }

    fn primitive(&mut self, item: &Primitive) {
        let _ = match item {
            Primitive::Rect { rect, fill, stroke } => writeln!(
                self.body,
                r#"<rect x="{}" y="{}" width="{}" height="{}"{}{}/>"#,
                num(rect.x0),
                num(rect.y0),
                num(rect.width()),
                num(rect.height()),
                fill_attrs(*fill),
                stroke_attrs(*stroke)
            ),
            Primitive::Path { path, fill, stroke } => writeln!(
                self.body,
                r#"<path d="{}"{}{}/>"#,
                path_data(path),
                fill_attrs(*fill),
                stroke_attrs(*stroke)
            ),
            Primitive::Circle {
                center,
                radius,
                fill,
                stroke,
            } => writeln!(
                self.body,
                r#"<circle cx="{}" cy="{}" r="{}"{}{}/>"#,
                num(center.x),
                num(center.y),
                num(*radius),
                fill_attrs(*fill),
                stroke_attrs(*stroke)
            ),
            Primitive::Line { from, to, stroke } => writeln!(
                self.body,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}"{}/>"#,
                num(from.x),
                num(from.y),
                num(to.x),
                num(to.y),
                stroke_attrs(Some(*stroke))
            ),
            Primitive::Text { pos, text, style } => writeln!(
                self.body,
                r#"<text x="{}" y="{}"{}>{}</text>"#,
                num(pos.x),
                num(pos.y),
                text_attrs(style, pos.x, pos.y),
                escape_xml(text)
            ),
            Primitive::GradientRect {
                rect,
                stops,
                vertical,
            } => {
                let id = self.gradient(stops, *vertical);
                writeln!(
                    self.body,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="url(#{id})"/>"#,
                    num(rect.x0),
                    num(rect.y0),
                    num(rect.width()),
                    num(rect.height()),
                )
            }
        };
    }

    fn gradient(&mut self, stops: &[Color], vertical: bool) -> String {
        let id = format!("gradient-{}", self.gradients);
        self.gradients += 1;
        let (x2, y1) = if vertical { ("0", "1") } else { ("1", "0") };
        let _ = writeln!(
            self.defs,
            r#"<linearGradient id="{id}" x1="0" y1="{y1}" x2="{x2}" y2="0">"#
        );
        let last = stops.len().saturating_sub(1).max(1) as f64;
        for (i, c) in stops.iter().enumerate() {
            let _ = writeln!(
                self.defs,
                r#"<stop offset="{}" stop-color="{}"{}/>"#,
                num(i as f64 / last),
                c.to_hex(),
                opacity_attr("stop-opacity", c.alpha_f64())
            );
        }
        self.defs.push_str("</linearGradient>\n");
        id
    }
}

/// Format a number with at most two decimals and no trailing zeros.
pub fn num(v: f64) -> String {
    let r = (v * 100.0).round() / 100.0;
    if r == 0.0 || !r.is_finite() {
        return "0".to_string();
    }
    let s = format!("{r:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

/// Escape text for use in element content and attribute values.
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}

fn transform_attr(t: Affine) -> String {
    let [a, b, c, d, e, f] = t.as_coeffs();
    if t == Affine::IDENTITY {
        String::new()
    } else if (a, b, c, d) == (1.0, 0.0, 0.0, 1.0) {
        format!(r#" transform="translate({},{})""#, num(e), num(f))
    } else {
        format!(
            r#" transform="matrix({} {} {} {} {} {})""#,
            num(a),
            num(b),
            num(c),
            num(d),
            num(e),
            num(f)
        )
    }
}

fn opacity_attr(name: &str, opacity: f64) -> String {
    if opacity >= 1.0 {
        String::new()
    } else {
        format!(r#" {name}="{}""#, num(opacity.max(0.0)))
    }
}

fn fill_attrs(fill: Option<Paint>) -> String {
    match fill {
        None => r#" fill="none""#.to_string(),
        Some(p) => format!(
            r#" fill="{}"{}"#,
            p.color.to_hex(),
            opacity_attr("fill-opacity", p.opacity * p.color.alpha_f64())
        ),
    }
}

fn stroke_attrs(stroke: Option<Stroke>) -> String {
    match stroke {
        None => String::new(),
        Some(s) => format!(
            r#" stroke="{}" stroke-width="{}"{}"#,
            s.paint.color.to_hex(),
            num(s.width),
            opacity_attr("stroke-opacity", s.paint.opacity * s.paint.color.alpha_f64())
        ),
    }
}

fn text_attrs(style: &TextStyle, x: f64, y: f64) -> String {
    let mut out = format!(
        r#" font-family="{FONT_FAMILY}" font-size="{}" fill="{}""#,
        num(style.size),
        style.color.to_hex()
    );
    if style.bold {
        out.push_str(r#" font-weight="bold""#);
    }
    let anchor = match style.anchor {
        Anchor::Start => None,
        Anchor::Middle => Some("middle"),
        Anchor::End => Some("end"),
    };
    if let Some(a) = anchor {
        let _ = write!(out, r#" text-anchor="{a}""#);
    }
    let baseline = match style.baseline {
        Baseline::Top => Some("hanging"),
        Baseline::Middle => Some("central"),
        Baseline::Alphabetic => None,
    };
    if let Some(b) = baseline {
        let _ = write!(out, r#" dominant-baseline="{b}""#);
    }
    if style.angle != 0.0 {
        let _ = write!(
            out,
            r#" transform="rotate({} {} {})""#,
            num(style.angle),
            num(x),
            num(y)
        );
    }
    out
}

/// SVG path data for a Bézier path.
pub fn path_data(path: &BezPath) -> String {
    let mut d = String::new();
    for el in path.elements() {
        if !d.is_empty() {
            d.push(' ');
        }
        let _ = match el {
            PathEl::MoveTo(p) => write!(d, "M{},{}", num(p.x), num(p.y)),
            PathEl::LineTo(p) => write!(d, "L{},{}", num(p.x), num(p.y)),
            PathEl::QuadTo(a, p) => {
                write!(d, "Q{},{} {},{}", num(a.x), num(a.y), num(p.x), num(p.y))
            }
            PathEl::CurveTo(a, b, p) => write!(
                d,
                "C{},{} {},{} {},{}",
                num(a.x),
                num(a.y),
                num(b.x),
                num(b.y),
                num(p.x),
                num(p.y)
            ),
            PathEl::ClosePath => write!(d, "Z"),
        };
    }
    d
}

#[cfg(test)]
#[path = "../../tests/unit/render/svg.rs"]
mod tests;
