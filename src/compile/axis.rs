//! Axis and gridline generation.
//!
//! Axes are measured first (to reserve margins) and then arranged in plot coordinates, with
//! the plot origin at the top-left corner.

use crate::compile::layout::{
    GRID_COLOR, GUIDE_COLOR, GUIDE_PADDING, GUIDE_TITLE_FONT_SIZE, LABEL_FONT_SIZE, TICK_SIZE,
    guide_title_style, label_style, max_label_width,
};
use crate::compile::scale::{PositionScale, Tick};
use crate::compile::scene::{Anchor, Baseline, GroupRole, Primitive, SceneGroup, Stroke};
use crate::foundation::core::{Point, Size};

/// Axis placement relative to the plot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisOrient {
    /// Below the plot (x channel).
    Bottom,
    /// Left of the plot (y channel).
    Left,
}

/// Resolved axis options.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisSpec {
    /// Placement.
    pub orient: AxisOrient,
    /// Title text, if any.
    pub title: Option<String>,
    /// Gridline override; continuous scales draw gridlines by default.
    pub grid: Option<bool>,
    /// Label rotation in degrees; automatic when `None`.
    pub label_angle: Option<f64>,
}

/// Ticks and label orientation for an axis, computed once for measuring and arranging.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisLayout {
    ticks: Vec<Tick>,
    angle: f64,
    label_extent: f64,
}

/// Number of ticks requested for a continuous axis of the given length.
pub fn tick_count(length: f64) -> usize {
    ((length / 40.0).round() as usize).clamp(2, 10)
}

impl AxisSpec {
    /// Resolve ticks and label orientation against a scale.
    pub fn layout(&self, scale: &PositionScale, length: f64) -> AxisLayout {
        let ticks = scale.ticks(tick_count(length));
        let widest = max_label_width(ticks.iter().map(|t| t.label.as_str()), LABEL_FONT_SIZE);
        let angle = match (self.label_angle, self.orient, scale) {
            (Some(a), _, _) => normalize_angle(a),
            (None, AxisOrient::Bottom, PositionScale::Band(b)) if widest > b.step() => -90.0,
            _ => 0.0,
        };
        let rad = angle.to_radians();
        let label_extent = match self.orient {
            AxisOrient::Bottom => {
                rad.sin().abs() * widest + rad.cos().abs() * LABEL_FONT_SIZE
            }
            AxisOrient::Left => rad.cos().abs() * widest + rad.sin().abs() * LABEL_FONT_SIZE,
        };
        AxisLayout {
            ticks,
            angle,
            label_extent,
        }
    }

    /// Space the axis occupies perpendicular to the plot edge.
    pub fn extent(&self, layout: &AxisLayout) -> f64 {
        let title = if self.title.is_some() {
            GUIDE_PADDING + GUIDE_TITLE_FONT_SIZE
        } else {
            0.0
        };
        TICK_SIZE + GUIDE_PADDING + layout.label_extent + title
    }

    /// Build the axis group and, for continuous scales, the gridline group.
    pub fn arrange(
        &self,
        scale: &PositionScale,
        layout: &AxisLayout,
        plot: Size,
    ) -> (SceneGroup, Option<SceneGroup>) {
        let ink = Stroke::new(GUIDE_COLOR, 1.0);
        let mut axis = SceneGroup::new(GroupRole::Axis);
        let draw_grid = self.grid.unwrap_or_else(|| scale.is_continuous());
        let mut grid = draw_grid.then(|| SceneGroup::new(GroupRole::Grid));
        let grid_ink = Stroke::new(GRID_COLOR, 1.0);
        let label_gap = TICK_SIZE + GUIDE_PADDING;

        match self.orient {
            AxisOrient::Bottom => {
                let y = plot.height;
                axis.push(Primitive::Line {
                    from: Point::new(0.0, y),
                    to: Point::new(plot.width, y),
                    stroke: ink,
                });
                for t in &layout.ticks {
                    axis.push(Primitive::Line {
                        from: Point::new(t.pos, y),
                        to: Point::new(t.pos, y + TICK_SIZE),
                        stroke: ink,
                    });
                    let (anchor, baseline) = if layout.angle == 0.0 {
                        (Anchor::Middle, Baseline::Top)
                    } else if layout.angle < 0.0 {
                        (Anchor::End, Baseline::Middle)
                    } else {
                        (Anchor::Start, Baseline::Middle)
                    };
                    let mut style = label_style(anchor, baseline);
                    style.angle = layout.angle;
                    axis.push(Primitive::Text {
                        pos: Point::new(t.pos, y + label_gap),
                        text: t.label.clone(),
                        style,
                    });
                    if let Some(grid) = grid.as_mut() {
                        grid.push(Primitive::Line {
                            from: Point::new(t.pos, 0.0),
                            to: Point::new(t.pos, plot.height),
                            stroke: grid_ink,
                        });
                    }
                }
                if let Some(title) = &self.title {
                    axis.push(Primitive::Text {
                        pos: Point::new(
                            plot.width / 2.0,
                            y + label_gap + layout.label_extent + GUIDE_PADDING,
                        ),
                        text: title.clone(),
                        style: guide_title_style(Anchor::Middle, Baseline::Top),
                    });
                }
            }
            AxisOrient::Left => {
                axis.push(Primitive::Line {
                    from: Point::new(0.0, 0.0),
                    to: Point::new(0.0, plot.height),
                    stroke: ink,
                });
                for t in &layout.ticks {
                    axis.push(Primitive::Line {
                        from: Point::new(-TICK_SIZE, t.pos),
                        to: Point::new(0.0, t.pos),
                        stroke: ink,
                    });
                    let mut style = label_style(Anchor::End, Baseline::Middle);
                    style.angle = layout.angle;
                    axis.push(Primitive::Text {
                        pos: Point::new(-label_gap, t.pos),
                        text: t.label.clone(),
                        style,
                    });
                    if let Some(grid) = grid.as_mut() {
                        grid.push(Primitive::Line {
                            from: Point::new(0.0, t.pos),
                            to: Point::new(plot.width, t.pos),
                            stroke: grid_ink,
                        });
                    }
                }
                if let Some(title) = &self.title {
                    let mut style = guide_title_style(Anchor::Middle, Baseline::Alphabetic);
                    style.angle = -90.0;
                    axis.push(Primitive::Text {
                        pos: Point::new(
                            -(label_gap + layout.label_extent + GUIDE_PADDING),
                            plot.height / 2.0,
                        ),
                        text: title.clone(),
                        style,
                    });
                }
            }
        }

        if grid.as_ref().is_some_and(|g| g.items.is_empty()) {
            grid = None;
        }
        (axis, grid)
    }
}

// Map any angle into (-180, 180].
fn normalize_angle(a: f64) -> f64 {
    let a = a.rem_euclid(360.0);
    if a > 180.0 { a - 360.0 } else { a }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/axis.rs"]
mod tests;
