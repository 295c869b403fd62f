//! Mark geometry.
//!
//! Every mark instance becomes one [`SceneGroup`] in plot coordinates. Series marks (line,
//! trail, area) produce one instance per color series; boxplots one per group; everything else
//! one per record.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use kurbo::Arc as ArcShape;

use crate::compile::data::{Datum, Record, field_value};
use crate::compile::encode::{Channel, STACK_HI, STACK_LO, quantile_sorted};
use crate::compile::scale::{ColorScale, LinearScale, PositionScale};
use crate::compile::scene::{
    Anchor, Baseline, GroupRole, Paint, Primitive, SceneGroup, Stroke, TextStyle,
};
use crate::foundation::core::{BezPath, Color, Point, Rect, Size, Vec2};
use crate::spec::model::MarkType;

/// Symbol area used when no size is encoded.
pub const DEFAULT_SYMBOL_AREA: f64 = 30.0;
/// Opacity of point-like and area marks when none is given.
pub const DEFAULT_TRANSLUCENT_OPACITY: f64 = 0.7;
/// Bar thickness on continuous axes.
pub const CONTINUOUS_BAND_SIZE: f64 = 5.0;
const BOX_WIDTH: f64 = 14.0;
const TICK_LENGTH: f64 = 18.0;
const OUTLIER_RADIUS: f64 = 3.0;
const FONT_SIZE: f64 = 11.0;

/// A positional channel bound to its scale.
#[derive(Clone, Copy, Debug)]
pub struct Positional<'a> {
    /// Channel definition.
    pub channel: &'a Channel,
    /// Resolved scale.
    pub scale: &'a PositionScale,
}

/// Constant mark properties.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkStyle {
    /// Color when no color field is encoded.
    pub color: Color,
    /// Opacity override.
    pub opacity: Option<f64>,
    /// Fill override for point-like marks.
    pub filled: Option<bool>,
    /// Constant size (symbol area, text size, trail width).
    pub size: Option<f64>,
    /// Stroke width override.
    pub stroke_width: Option<f64>,
    /// Inner radius for arcs.
    pub inner_radius: f64,
}

/// Everything needed to lay out the marks of one panel.
#[derive(Clone, Debug)]
pub struct MarkInput<'a> {
    /// Mark type.
    pub mark: MarkType,
    /// Constant properties.
    pub style: MarkStyle,
    /// Records to draw.
    pub rows: &'a [Record],
    /// Plot area size.
    pub plot: Size,
    /// `x` with scale.
    pub x: Option<Positional<'a>>,
    /// `y` with scale.
    pub y: Option<Positional<'a>>,
    /// `x2` (uses the `x` scale).
    pub x2: Option<&'a Channel>,
    /// `y2` (uses the `y` scale).
    pub y2: Option<&'a Channel>,
    /// Measure values are read from the stack interval.
    pub stacked: bool,
    /// Color field with scale.
    pub color: Option<(&'a Channel, &'a ColorScale)>,
    /// Size field with scale.
    pub size: Option<(&'a Channel, LinearScale)>,
    /// Opacity field with scale.
    pub opacity: Option<(&'a Channel, LinearScale)>,
    /// Text content.
    pub text: Option<&'a Channel>,
    /// Arc angle.
    pub theta: Option<&'a Channel>,
}

/// Which axis carries the measure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orient {
    /// Measure on `y`; categories along `x`.
    Vertical,
    /// Measure on `x`; categories along `y`.
    Horizontal,
}

fn is_linear(p: Option<Positional<'_>>) -> bool {
    matches!(p.map(|p| p.scale), Some(PositionScale::Linear(_)))
}

impl MarkInput<'_> {
    /// Orientation inferred from which positional scale is quantitative.
    pub fn orient(&self) -> Orient {
        if is_linear(self.x) && !is_linear(self.y) {
            Orient::Horizontal
        } else {
            Orient::Vertical
        }
    }

    fn color_of(&self, r: &Record) -> Color {
        match self.color {
            Some((ch, scale)) if ch.is_field() => scale.map(&ch.datum(r)),
            _ => self.style.color,
        }
    }

    fn opacity_of(&self, r: &Record, default: f64) -> f64 {
        match self.opacity {
            Some((ch, scale)) if ch.is_field() => ch
                .datum(r)
                .as_f64()
                .map(|v| scale.map(v))
                .unwrap_or(default),
            _ => self.style.opacity.unwrap_or(default),
        }
    }

    fn paint(&self, r: &Record, default_opacity: f64) -> Paint {
        Paint::with_opacity(self.color_of(r), self.opacity_of(r, default_opacity))
    }

    fn size_of(&self, r: &Record, default: f64) -> f64 {
        match self.size {
            Some((ch, scale)) if ch.is_field() => ch
                .datum(r)
                .as_f64()
                .map(|v| scale.map(v))
                .unwrap_or(default),
            _ => self.style.size.unwrap_or(default),
        }
    }

    fn pos(&self, p: Option<Positional<'_>>, r: &Record, fallback: f64) -> Option<f64> {
        match p {
            Some(p) => p.scale.map(&p.channel.datum(r)),
            None => Some(fallback),
        }
    }

    fn pos_x(&self, r: &Record) -> Option<f64> {
        self.pos(self.x, r, self.plot.width / 2.0)
    }

    fn pos_y(&self, r: &Record) -> Option<f64> {
        self.pos(self.y, r, self.plot.height / 2.0)
    }

    fn axes(&self, orient: Orient) -> Axes<'_> {
        match orient {
            Orient::Vertical => Axes {
                category: self.x,
                measure: self.y,
                measure2: self.y2,
                category2: self.x2,
                category_extent: self.plot.width,
                measure_extent: self.plot.height,
            },
            Orient::Horizontal => Axes {
                category: self.y,
                measure: self.x,
                measure2: self.x2,
                category2: self.y2,
                category_extent: self.plot.height,
                measure_extent: self.plot.width,
            },
        }
    }

    /// Measure interval `(from, to)` in plot coordinates.
    fn measure_span(&self, axes: &Axes<'_>, r: &Record) -> Option<(f64, f64)> {
        let m = axes.measure?;
        if self.stacked {
            let lo = field_value(r, STACK_LO).as_f64()?;
            let hi = field_value(r, STACK_HI).as_f64()?;
            return Some((m.scale.map_number(lo)?, m.scale.map_number(hi)?));
        }
        let to = m.scale.map(&m.channel.datum(r))?;
        let from = match axes.measure2 {
            Some(c2) => m.scale.map(&c2.datum(r))?,
            None => m.scale.baseline(),
        };
        Some((from, to))
    }

    /// Category interval `(from, to)` in plot coordinates.
    fn category_span(&self, axes: &Axes<'_>, r: &Record, thickness: f64) -> Option<(f64, f64)> {
        let Some(c) = axes.category else {
            let pad = axes.category_extent * 0.05;
            return Some((pad, axes.category_extent - pad));
        };
        match c.scale {
            PositionScale::Band(b) if b.bandwidth() > 0.0 => {
                let start = b.start(&c.channel.datum(r))?;
                Some((start, start + b.bandwidth()))
            }
            scale => {
                if let Some(c2) = axes.category2 {
                    return Some((scale.map(&c.channel.datum(r))?, scale.map(&c2.datum(r))?));
                }
                let center = scale.map(&c.channel.datum(r))?;
                Some((center - thickness / 2.0, center + thickness / 2.0))
            }
        }
    }
}

struct Axes<'a> {
    category: Option<Positional<'a>>,
    measure: Option<Positional<'a>>,
    measure2: Option<&'a Channel>,
    category2: Option<&'a Channel>,
    category_extent: f64,
    measure_extent: f64,
}

fn oriented_rect(orient: Orient, cat: (f64, f64), measure: (f64, f64)) -> Rect {
    let (c0, c1) = (cat.0.min(cat.1), cat.0.max(cat.1));
    let (m0, m1) = (measure.0.min(measure.1), measure.0.max(measure.1));
    match orient {
        Orient::Vertical => Rect::new(c0, m0, c1, m1),
        Orient::Horizontal => Rect::new(m0, c0, m1, c1),
    }
}

fn oriented_point(orient: Orient, cat: f64, measure: f64) -> Point {
    match orient {
        Orient::Vertical => Point::new(cat, measure),
        Orient::Horizontal => Point::new(measure, cat),
    }
}

fn mark_group(mark: MarkType) -> SceneGroup {
    SceneGroup::new(GroupRole::Mark(mark))
}

/// Lay out all mark instances for one panel.
pub fn build_marks(input: &MarkInput<'_>) -> Vec<SceneGroup> {
    match input.mark {
        MarkType::Bar => bars(input),
        MarkType::Rect => rects(input),
        MarkType::Point | MarkType::Circle | MarkType::Square => symbols(input),
        MarkType::Text => texts(input),
        MarkType::Tick => ticks(input),
        MarkType::Rule => rules(input),
        MarkType::Line => series(input).into_iter().map(|s| line(input, s)).collect(),
        MarkType::Trail => series(input).into_iter().map(|s| trail(input, s)).collect(),
        MarkType::Area => series(input).into_iter().map(|s| area(input, s)).collect(),
        MarkType::Arc => arcs(input),
        MarkType::Boxplot => boxplots(input),
    }
}

fn bars(input: &MarkInput<'_>) -> Vec<SceneGroup> {
    let orient = input.orient();
    let axes = input.axes(orient);
    input
        .rows
        .iter()
        .filter_map(|r| {
            let cat = input.category_span(&axes, r, CONTINUOUS_BAND_SIZE)?;
            let measure = match axes.measure {
                Some(_) => input.measure_span(&axes, r)?,
                None => (0.0, axes.measure_extent),
            };
            let rect = oriented_rect(orient, cat, measure);
            Some(mark_group(MarkType::Bar).with(Primitive::Rect {
                rect,
                fill: Some(input.paint(r, 1.0)),
                stroke: None,
            }))
        })
        .collect()
}

fn rects(input: &MarkInput<'_>) -> Vec<SceneGroup> {
    let cells_x = distinct(input.rows, input.x).max(1) as f64;
    let cells_y = distinct(input.rows, input.y).max(1) as f64;
    let span = |p: Option<Positional<'_>>, p2: Option<&Channel>, r: &Record, extent: f64, n: f64| {
        let Some(p) = p else {
            return Some((0.0, extent));
        };
        match p.scale {
            PositionScale::Band(b) => {
                let s = b.start(&p.channel.datum(r))?;
                Some((s, s + b.bandwidth()))
            }
            scale => {
                let a = scale.map(&p.channel.datum(r))?;
                match p2 {
                    Some(c2) => Some((a, scale.map(&c2.datum(r))?)),
                    None => {
                        let half = extent / n / 2.0;
                        Some((a - half, a + half))
                    }
                }
            }
        }
    };
    input
        .rows
        .iter()
        .filter_map(|r| {
            let (x0, x1) = span(input.x, input.x2, r, input.plot.width, cells_x)?;
            let (y0, y1) = span(input.y, input.y2, r, input.plot.height, cells_y)?;
            let rect = Rect::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1));
            Some(mark_group(MarkType::Rect).with(Primitive::Rect {
                rect,
                fill: Some(input.paint(r, 1.0)),
                stroke: None,
            }))
        })
        .collect()
}

fn distinct(rows: &[Record], p: Option<Positional<'_>>) -> usize {
    let Some(p) = p else {
        return 1;
    };
    let mut seen: Vec<Datum> = Vec::new();
    for r in rows {
        let d = p.channel.datum(r).into_owned();
        if !seen.contains(&d) {
            seen.push(d);
        }
    }
    seen.len()
}

fn symbols(input: &MarkInput<'_>) -> Vec<SceneGroup> {
    let filled_default = input.mark != MarkType::Point;
    let filled = input.style.filled.unwrap_or(filled_default);
    input
        .rows
        .iter()
        .filter_map(|r| {
            let center = Point::new(input.pos_x(r)?, input.pos_y(r)?);
            let area = input.size_of(r, DEFAULT_SYMBOL_AREA).max(0.0);
            let paint = input.paint(r, DEFAULT_TRANSLUCENT_OPACITY);
            let (fill, stroke) = if filled {
                (Some(paint), None)
            } else {
                let width = input.style.stroke_width.unwrap_or(2.0);
                (None, Some(Stroke { paint, width }))
            };
            let prim = if input.mark == MarkType::Square {
                let half = area.sqrt() / 2.0;
                Primitive::Rect {
                    rect: Rect::from_center_size(center, (half * 2.0, half * 2.0)),
                    fill,
                    stroke,
                }
            } else {
                Primitive::Circle {
                    center,
                    radius: (area / PI).sqrt(),
                    fill,
                    stroke,
                }
            };
            Some(mark_group(input.mark).with(prim))
        })
        .collect()
}

fn texts(input: &MarkInput<'_>) -> Vec<SceneGroup> {
    let Some(text) = input.text else {
        return Vec::new();
    };
    let default_color = if input.color.is_some_and(|(c, _)| c.is_field()) {
        None
    } else {
        Some(input.style.color)
    };
    input
        .rows
        .iter()
        .filter_map(|r| {
            let label = text.datum(r);
            if label.is_null() {
                return None;
            }
            let pos = Point::new(input.pos_x(r)?, input.pos_y(r)?);
            let style = TextStyle {
                size: input.size_of(r, FONT_SIZE),
                bold: false,
                color: default_color.unwrap_or_else(|| input.color_of(r)),
                anchor: Anchor::Middle,
                baseline: Baseline::Middle,
                angle: 0.0,
            };
            Some(mark_group(MarkType::Text).with(Primitive::Text {
                pos,
                text: label.label(),
                style,
            }))
        })
        .collect()
}

fn ticks(input: &MarkInput<'_>) -> Vec<SceneGroup> {
    // Ticks run across the category axis, so a quantitative `y` with a discrete `x`
    // gives horizontal ticks.
    let along_x = is_linear(input.y) && !is_linear(input.x);
    let cross = if along_x { input.x } else { input.y };
    let length = match cross.map(|p| p.scale) {
        Some(PositionScale::Band(b)) if b.bandwidth() > 0.0 => b.bandwidth() * 0.75,
        _ => TICK_LENGTH,
    };
    let width = input.style.stroke_width.unwrap_or(1.0);
    input
        .rows
        .iter()
        .filter_map(|r| {
            let (x, y) = (input.pos_x(r)?, input.pos_y(r)?);
            let half = length / 2.0;
            let (from, to) = if along_x {
                (Point::new(x - half, y), Point::new(x + half, y))
            } else {
                (Point::new(x, y - half), Point::new(x, y + half))
            };
            let stroke = Stroke {
                paint: input.paint(r, DEFAULT_TRANSLUCENT_OPACITY),
                width,
            };
            Some(mark_group(MarkType::Tick).with(Primitive::Line { from, to, stroke }))
        })
        .collect()
}

fn rules(input: &MarkInput<'_>) -> Vec<SceneGroup> {
    let (w, h) = (input.plot.width, input.plot.height);
    let width = input.style.stroke_width.unwrap_or(1.0);
    input
        .rows
        .iter()
        .filter_map(|r| {
            let x = input.x.map(|p| p.scale.map(&p.channel.datum(r)));
            let y = input.y.map(|p| p.scale.map(&p.channel.datum(r)));
            let x2 = match (input.x, input.x2) {
                (Some(p), Some(c2)) => p.scale.map(&c2.datum(r)),
                _ => None,
            };
            let y2 = match (input.y, input.y2) {
                (Some(p), Some(c2)) => p.scale.map(&c2.datum(r)),
                _ => None,
            };
            let (from, to) = match (x, y) {
                (Some(x), None) => {
                    let x = x?;
                    match x2 {
                        Some(x2) => (Point::new(x, h / 2.0), Point::new(x2, h / 2.0)),
                        None => (Point::new(x, 0.0), Point::new(x, h)),
                    }
                }
                (None, Some(y)) => {
                    let y = y?;
                    match y2 {
                        Some(y2) => (Point::new(w / 2.0, y), Point::new(w / 2.0, y2)),
                        None => (Point::new(0.0, y), Point::new(w, y)),
                    }
                }
                (Some(x), Some(y)) => {
                    let (x, y) = (x?, y?);
                    match (x2, y2) {
                        (Some(x2), _) => (Point::new(x, y), Point::new(x2, y)),
                        (None, Some(y2)) => (Point::new(x, y), Point::new(x, y2)),
                        (None, None) => {
                            let base = input.y.map(|p| p.scale.baseline()).unwrap_or(h);
                            (Point::new(x, y), Point::new(x, base))
                        }
                    }
                }
                (None, None) => return None,
            };
            let stroke = Stroke {
                paint: input.paint(r, 1.0),
                width,
            };
            Some(mark_group(MarkType::Rule).with(Primitive::Line { from, to, stroke }))
        })
        .collect()
}

/// One color series: its color and records.
struct Series<'a> {
    color: Color,
    rows: Vec<&'a Record>,
}

fn series<'a>(input: &MarkInput<'a>) -> Vec<Series<'a>> {
    if input.rows.is_empty() {
        return Vec::new();
    }
    if let Some((ch, scale)) = input.color
        && ch.is_field()
        && let ColorScale::Ordinal { domain } = scale
    {
        let mut out: Vec<Series<'a>> = domain
            .iter()
            .map(|d| Series {
                color: scale.map(d),
                rows: Vec::new(),
            })
            .collect();
        for r in input.rows {
            let d = ch.datum(r);
            if let Some(i) = domain.iter().position(|v| *v == *d) {
                out[i].rows.push(r);
            }
        }
        out.retain(|s| !s.rows.is_empty());
        return out;
    }
    let color = input
        .rows
        .first()
        .map(|r| input.color_of(r))
        .unwrap_or(input.style.color);
    vec![Series {
        color,
        rows: input.rows.iter().collect(),
    }]
}

/// Points of a series sorted along the category axis, with the record they came from.
fn series_points<'a>(
    input: &MarkInput<'_>,
    orient: Orient,
    rows: &[&'a Record],
) -> Vec<(Point, &'a Record)> {
    let mut pts: Vec<(Point, &Record)> = rows
        .iter()
        .filter_map(|r| Some((Point::new(input.pos_x(r)?, input.pos_y(r)?), *r)))
        .collect();
    match orient {
        Orient::Vertical => pts.sort_by(|a, b| a.0.x.total_cmp(&b.0.x)),
        Orient::Horizontal => pts.sort_by(|a, b| a.0.y.total_cmp(&b.0.y)),
    }
    pts
}

fn polyline(points: impl IntoIterator<Item = Point>) -> BezPath {
    let mut path = BezPath::new();
    for (i, p) in points.into_iter().enumerate() {
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path
}

fn line(input: &MarkInput<'_>, s: Series<'_>) -> SceneGroup {
    let pts = series_points(input, input.orient(), &s.rows);
    let opacity = input.style.opacity.unwrap_or(1.0);
    mark_group(MarkType::Line).with(Primitive::Path {
        path: polyline(pts.into_iter().map(|(p, _)| p)),
        fill: None,
        stroke: Some(Stroke {
            paint: Paint::with_opacity(s.color, opacity),
            width: input.style.stroke_width.unwrap_or(2.0),
        }),
    })
}

fn trail(input: &MarkInput<'_>, s: Series<'_>) -> SceneGroup {
    let pts = series_points(input, input.orient(), &s.rows);
    let widths: Vec<f64> = pts.iter().map(|(_, r)| input.size_of(r, 2.0).max(0.0)).collect();
    let n = pts.len();
    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);
    for i in 0..n {
        let prev = pts[i.saturating_sub(1)].0;
        let next = pts[(i + 1).min(n - 1)].0;
        let dir: Vec2 = next - prev;
        let len = dir.hypot();
        let normal = if len > 0.0 {
            Vec2::new(-dir.y / len, dir.x / len)
        } else {
            Vec2::new(0.0, 1.0)
        };
        let off = normal * (widths[i] / 2.0);
        left.push(pts[i].0 + off);
        right.push(pts[i].0 - off);
    }
    let mut path = polyline(left.into_iter().chain(right.into_iter().rev()));
    if n > 0 {
        path.close_path();
    }
    let opacity = input.style.opacity.unwrap_or(1.0);
    mark_group(MarkType::Trail).with(Primitive::Path {
        path,
        fill: Some(Paint::with_opacity(s.color, opacity)),
        stroke: None,
    })
}

fn area(input: &MarkInput<'_>, s: Series<'_>) -> SceneGroup {
    let orient = input.orient();
    let axes = input.axes(orient);
    let mut top = Vec::new();
    let mut bottom = Vec::new();
    for (p, r) in series_points(input, orient, &s.rows) {
        let cat = match orient {
            Orient::Vertical => p.x,
            Orient::Horizontal => p.y,
        };
        let (from, to) = match axes.measure {
            Some(_) => match input.measure_span(&axes, r) {
                Some(span) => span,
                None => continue,
            },
            None => (axes.measure_extent, 0.0),
        };
        top.push(oriented_point(orient, cat, to));
        bottom.push(oriented_point(orient, cat, from));
    }
    let mut path = polyline(top.into_iter().chain(bottom.into_iter().rev()));
    path.close_path();
    let opacity = input.style.opacity.unwrap_or(DEFAULT_TRANSLUCENT_OPACITY);
    mark_group(MarkType::Area).with(Primitive::Path {
        path,
        fill: Some(Paint::with_opacity(s.color, opacity)),
        stroke: None,
    })
}

fn arcs(input: &MarkInput<'_>) -> Vec<SceneGroup> {
    let weights: Vec<f64> = input
        .rows
        .iter()
        .map(|r| match input.theta {
            Some(t) => t.datum(r).as_f64().unwrap_or(0.0).max(0.0),
            None => 1.0,
        })
        .collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }
    let center = Point::new(input.plot.width / 2.0, input.plot.height / 2.0);
    let outer = input.plot.width.min(input.plot.height) / 2.0;
    let inner = input.style.inner_radius.clamp(0.0, outer);
    let mut start = -FRAC_PI_2;
    let mut out = Vec::new();
    for (r, w) in input.rows.iter().zip(weights) {
        if w <= 0.0 {
            continue;
        }
        let sweep = w / total * TAU;
        let path = sector(center, inner, outer, start, sweep);
        start += sweep;
        out.push(mark_group(MarkType::Arc).with(Primitive::Path {
            path,
            fill: Some(input.paint(r, 1.0)),
            stroke: Some(Stroke::new(Color::WHITE, 1.0)),
        }));
    }
    out
}

/// Annular sector from `start` sweeping clockwise (screen coordinates) by `sweep` radians.
fn sector(center: Point, inner: f64, outer: f64, start: f64, sweep: f64) -> BezPath {
    let at = |radius: f64, angle: f64| center + Vec2::from_angle(angle) * radius;
    let mut path = BezPath::new();
    path.move_to(at(outer, start));
    path.extend(ArcShape::new(center, (outer, outer), start, sweep, 0.0).append_iter(0.1));
    if inner > 0.0 {
        path.line_to(at(inner, start + sweep));
        path.extend(
            ArcShape::new(center, (inner, inner), start + sweep, -sweep, 0.0).append_iter(0.1),
        );
    } else {
        path.line_to(center);
    }
    path.close_path();
    path
}

/// Five-number summary with 1.5×IQR whiskers.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxSummary {
    /// Lower whisker end.
    pub lower: f64,
    /// First quartile.
    pub q1: f64,
    /// Median.
    pub median: f64,
    /// Third quartile.
    pub q3: f64,
    /// Upper whisker end.
    pub upper: f64,
    /// Values beyond the whiskers.
    pub outliers: Vec<f64>,
}

impl BoxSummary {
    /// Summarize values; `None` when there are none.
    pub fn from_values(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        let q1 = quantile_sorted(&values, 0.25);
        let median = quantile_sorted(&values, 0.5);
        let q3 = quantile_sorted(&values, 0.75);
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
        let inside = values.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
        let lower = inside.clone().fold(f64::INFINITY, f64::min).min(q1);
        let upper = inside.fold(f64::NEG_INFINITY, f64::max).max(q3);
        let outliers = values
            .iter()
            .copied()
            .filter(|v| *v < lo_fence || *v > hi_fence)
            .collect();
        Some(Self {
            lower,
            q1,
            median,
            q3,
            upper,
            outliers,
        })
    }
}

fn boxplots(input: &MarkInput<'_>) -> Vec<SceneGroup> {
    let orient = input.orient();
    let axes = input.axes(orient);
    let Some(measure) = axes.measure else {
        return Vec::new();
    };

    let mut groups: Vec<(Option<Datum>, Vec<f64>)> = Vec::new();
    for r in input.rows {
        let Some(v) = measure.channel.datum(r).as_f64() else {
            continue;
        };
        let key = axes.category.map(|c| c.channel.datum(r).into_owned());
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, vals)) => vals.push(v),
            None => groups.push((key, vec![v])),
        }
    }
    if let Some(PositionScale::Band(b)) = axes.category.map(|c| c.scale) {
        groups.sort_by_key(|(k, _)| k.as_ref().and_then(|d| b.index_of(d)));
    }

    let color = input.style.color;
    let opacity = input.style.opacity.unwrap_or(1.0);
    let ink = Stroke::new(Color::BLACK, 1.0);
    let mut out = Vec::new();
    for (key, values) in groups {
        let Some(summary) = BoxSummary::from_values(values) else {
            continue;
        };
        let (center, band) = match (axes.category, &key) {
            (Some(c), Some(d)) => match c.scale {
                PositionScale::Band(b) => match b.center(d) {
                    Some(center) => (center, b.bandwidth()),
                    None => continue,
                },
                scale => match scale.map(d) {
                    Some(center) => (center, 0.0),
                    None => continue,
                },
            },
            _ => (axes.category_extent / 2.0, 0.0),
        };
        let width = if band > 0.0 { band.min(BOX_WIDTH) } else { BOX_WIDTH };
        let m = |v: f64| measure.scale.map_number(v).unwrap_or(0.0);
        let pt = |c: f64, v: f64| oriented_point(orient, c, m(v));

        let mut g = mark_group(MarkType::Boxplot);
        g.push(Primitive::Line {
            from: pt(center, summary.lower),
            to: pt(center, summary.q1),
            stroke: ink,
        });
        g.push(Primitive::Line {
            from: pt(center, summary.q3),
            to: pt(center, summary.upper),
            stroke: ink,
        });
        for cap in [summary.lower, summary.upper] {
            g.push(Primitive::Line {
                from: pt(center - width / 4.0, cap),
                to: pt(center + width / 4.0, cap),
                stroke: ink,
            });
        }
        g.push(Primitive::Rect {
            rect: oriented_rect(
                orient,
                (center - width / 2.0, center + width / 2.0),
                (m(summary.q1), m(summary.q3)),
            ),
            fill: Some(Paint::with_opacity(color, opacity)),
            stroke: None,
        });
        g.push(Primitive::Line {
            from: pt(center - width / 2.0, summary.median),
            to: pt(center + width / 2.0, summary.median),
            stroke: Stroke::new(Color::WHITE, 1.0),
        });
        for o in &summary.outliers {
            g.push(Primitive::Circle {
                center: pt(center, *o),
                radius: OUTLIER_RADIUS,
                fill: None,
                stroke: Some(Stroke::new(color, 1.0)),
            });
        }
        out.push(g);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/compile/marks.rs"]
mod tests;
