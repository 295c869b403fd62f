//! Guide styling constants and heuristic text metrics.
//!
//! Guide layout runs before rasterization, so text extents are estimated rather than shaped:
//! an average glyph is ~0.6em wide and 1em tall.

use crate::compile::scene::{Anchor, Baseline, TextStyle};
use crate::foundation::core::Color;

/// Tick label font size.
pub const LABEL_FONT_SIZE: f64 = 10.0;
/// Axis and legend title font size.
pub const GUIDE_TITLE_FONT_SIZE: f64 = 11.0;
/// Chart title font size.
pub const TITLE_FONT_SIZE: f64 = 13.0;
/// Tick length.
pub const TICK_SIZE: f64 = 5.0;
/// Gap between guide parts (tick to label, label to title).
pub const GUIDE_PADDING: f64 = 5.0;
/// Outer padding around a chart.
pub const CHART_PADDING: f64 = 5.0;
/// Gap between the plot and a legend.
pub const LEGEND_OFFSET: f64 = 18.0;
/// Gap between composite panels.
pub const COMPOSITE_SPACING: f64 = 20.0;
/// Panel extent per category for composite panels without an explicit size.
pub const STEP_PER_CATEGORY: f64 = 20.0;
/// Panel extent for continuous scales in composite panels without an explicit size.
pub const CONTINUOUS_PANEL_EXTENT: f64 = 200.0;

/// Guide ink (labels, ticks, domain lines).
pub const GUIDE_COLOR: Color = Color::rgb(0x88, 0x88, 0x88);
/// Guide text color.
pub const GUIDE_TEXT_COLOR: Color = Color::rgb(0x33, 0x33, 0x33);
/// Gridline color.
pub const GRID_COLOR: Color = Color::rgb(0xdd, 0xdd, 0xdd);

/// Estimated `(width, height)` of a single line of text.
pub fn measure_text(text: &str, font_size: f64) -> (f64, f64) {
    (0.6 * font_size * text.chars().count() as f64, font_size)
}

/// Widest estimated extent among `labels`.
pub fn max_label_width<'a>(labels: impl IntoIterator<Item = &'a str>, font_size: f64) -> f64 {
    labels
        .into_iter()
        .map(|l| measure_text(l, font_size).0)
        .fold(0.0, f64::max)
}

/// Text style for tick and legend labels.
pub fn label_style(anchor: Anchor, baseline: Baseline) -> TextStyle {
    TextStyle {
        size: LABEL_FONT_SIZE,
        bold: false,
        color: GUIDE_TEXT_COLOR,
        anchor,
        baseline,
        angle: 0.0,
    }
}

/// Text style for axis and legend titles.
pub fn guide_title_style(anchor: Anchor, baseline: Baseline) -> TextStyle {
    TextStyle {
        size: GUIDE_TITLE_FONT_SIZE,
        bold: true,
        ..label_style(anchor, baseline)
    }
}

/// Text style for chart titles.
pub fn title_style() -> TextStyle {
    TextStyle {
        size: TITLE_FONT_SIZE,
        bold: true,
        color: Color::BLACK,
        anchor: Anchor::Middle,
        baseline: Baseline::Top,
        angle: 0.0,
    }
}

/// Margins reserved around a panel's plot area.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Margins {
    /// Left margin.
    pub left: f64,
    /// Top margin.
    pub top: f64,
    /// Right margin.
    pub right: f64,
    /// Bottom margin.
    pub bottom: f64,
}

#[cfg(test)]
#[path = "../../tests/unit/compile/layout.rs"]
mod tests;
