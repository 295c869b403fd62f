use crate::compile::layout::{
    GUIDE_PADDING, GUIDE_TITLE_FONT_SIZE, LABEL_FONT_SIZE, guide_title_style, label_style,
    max_label_width, measure_text,
};
use crate::compile::scale::{LinearScale, RAMP_HIGH, RAMP_LOW};
use crate::compile::scene::{Anchor, Baseline, GroupRole, Paint, Primitive, SceneGroup};
use crate::foundation::core::{Color, Point, Rect, Size};

/// Height of one symbol legend row.
pub const ROW_HEIGHT: f64 = 16.0;
const SYMBOL_SIZE: f64 = 10.0;
const GRADIENT_WIDTH: f64 = 12.0;
const GRADIENT_LENGTH: f64 = 120.0;

/// Swatch shape for symbol legends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolShape {
    /// Circle swatch (point-like and line-like marks).
    Circle,
    /// Square swatch (area-like marks).
    Square,
}

/// Legend contents.
#[derive(Clone, Debug, PartialEq)]
pub enum LegendKind {
    /// One swatch per discrete value.
    Symbol {
        /// Label/color pairs in domain order.
        entries: Vec<(String, Color)>,
        /// Swatch shape.
        shape: SymbolShape,
    },
    /// Continuous color ramp.
    Gradient {
        /// Numeric domain of the ramp.
        domain: (f64, f64),
        /// Label per tick value.
        labels: Vec<(f64, String)>,
    },
}

/// A color legend.
#[derive(Clone, Debug, PartialEq)]
pub struct LegendSpec {
    /// Title text.
    pub title: Option<String>,
    /// Contents.
    pub kind: LegendKind,
}

impl LegendSpec {
    fn title_height(&self) -> f64 {
        if self.title.is_some() {
            GUIDE_TITLE_FONT_SIZE + GUIDE_PADDING
        } else {
            0.0
        }
    }

    /// Estimated extent of the legend.
    pub fn size(&self) -> Size {
        let title_w = self
            .title
            .as_deref()
            .map(|t| measure_text(t, GUIDE_TITLE_FONT_SIZE).0)
            .unwrap_or(0.0);
        let (body_w, body_h) = match &self.kind {
            LegendKind::Symbol { entries, .. } => (
                SYMBOL_SIZE
                    + GUIDE_PADDING
                    + max_label_width(entries.iter().map(|(l, _)| l.as_str()), LABEL_FONT_SIZE),
                entries.len() as f64 * ROW_HEIGHT,
            ),
            LegendKind::Gradient { labels, .. } => (
                GRADIENT_WIDTH
                    + GUIDE_PADDING
                    + max_label_width(labels.iter().map(|(_, l)| l.as_str()), LABEL_FONT_SIZE),
                GRADIENT_LENGTH,
            ),
        };
        Size::new(title_w.max(body_w), self.title_height() + body_h)
    }

    /// Build the legend group with its origin at the legend's top-left corner.
    pub fn arrange(&self) -> SceneGroup {
        let mut group = SceneGroup::new(GroupRole::Legend);
        if let Some(title) = &self.title {
            group.push(Primitive::Text {
                pos: Point::new(0.0, 0.0),
                text: title.clone(),
                style: guide_title_style(Anchor::Start, Baseline::Top),
            });
        }
        let top = self.title_height();
        match &self.kind {
            LegendKind::Symbol { entries, shape } => {
                for (i, (label, color)) in entries.iter().enumerate() {
                    let cy = top + ROW_HEIGHT * i as f64 + ROW_HEIGHT / 2.0;
                    let half = SYMBOL_SIZE / 2.0;
                    group.push(match shape {
                        SymbolShape::Circle => Primitive::Circle {
                            center: Point::new(half, cy),
                            radius: half,
                            fill: Some(Paint::solid(*color)),
                            stroke: None,
                        },
                        SymbolShape::Square => Primitive::Rect {
                            rect: Rect::new(0.0, cy - half, SYMBOL_SIZE, cy + half),
                            fill: Some(Paint::solid(*color)),
                            stroke: None,
                        },
                    });
                    group.push(Primitive::Text {
                        pos: Point::new(SYMBOL_SIZE + GUIDE_PADDING, cy),
                        text: label.clone(),
                        style: label_style(Anchor::Start, Baseline::Middle),
                    });
                }
            }
            LegendKind::Gradient { domain, labels } => {
                group.push(Primitive::GradientRect {
                    rect: Rect::new(0.0, top, GRADIENT_WIDTH, top + GRADIENT_LENGTH),
                    stops: vec![RAMP_LOW, RAMP_HIGH],
                    vertical: true,
                });
                let scale = LinearScale::new(*domain, (top + GRADIENT_LENGTH, top));
                for (value, label) in labels {
                    group.push(Primitive::Text {
                        pos: Point::new(GRADIENT_WIDTH + GUIDE_PADDING, scale.map(*value)),
                        text: label.clone(),
                        style: label_style(Anchor::Start, Baseline::Middle),
                    });
                }
            }
        }
        group
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/legend.rs"]
mod tests;
