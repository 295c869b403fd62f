use crate::foundation::core::{Affine, BezPath, Color, Point, Rect, Size, Vec2};
use crate::spec::model::MarkType;

/// Fully resolved chart geometry, ready for serialization.
///
/// A scene is owned by one render invocation; nothing in it is shared or cached.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Natural (unscaled) size of the whole chart.
    pub size: Size,
    /// Background fill.
    pub background: Color,
    groups: Vec<SceneGroup>,
}

/// What a group draws; determines its paint order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupRole {
    /// Panel backgrounds.
    Background,
    /// Gridlines.
    Grid,
    /// Axis domain, ticks, labels and title.
    Axis,
    /// One mark instance.
    Mark(MarkType),
    /// Legend swatches and labels.
    Legend,
    /// Facet headers.
    Header,
    /// Chart titles.
    Title,
}

impl GroupRole {
    /// Paint layer; lower layers draw first.
    pub fn layer(self) -> u8 {
        match self {
            Self::Background => 0,
            Self::Grid => 1,
            Self::Axis => 2,
            Self::Mark(_) => 3,
            Self::Legend => 4,
            Self::Header | Self::Title => 5,
        }
    }

    /// CSS class emitted for the group.
    pub fn class_name(self) -> String {
        match self {
            Self::Background => "background".to_string(),
            Self::Grid => "grid".to_string(),
            Self::Axis => "axis".to_string(),
            Self::Mark(m) => format!("mark mark-{}", m.as_str()),
            Self::Legend => "legend".to_string(),
            Self::Header => "header".to_string(),
            Self::Title => "title".to_string(),
        }
    }
}

/// A positioned group of primitives.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneGroup {
    /// Group role.
    pub role: GroupRole,
    /// Placement in scene coordinates.
    pub transform: Affine,
    /// Primitives, in paint order.
    pub items: Vec<Primitive>,
}

impl SceneGroup {
    /// Group at the origin.
    pub fn new(role: GroupRole) -> Self {
        Self {
            role,
            transform: Affine::IDENTITY,
            items: Vec::new(),
        }
    }

    /// Builder-style translation.
    pub fn at(mut self, offset: Vec2) -> Self {
        self.transform = Affine::translate(offset) * self.transform;
        self
    }

    /// Builder-style push.
    pub fn with(mut self, item: Primitive) -> Self {
        self.items.push(item);
        self
    }

    /// Append a primitive.
    pub fn push(&mut self, item: Primitive) {
        self.items.push(item);
    }
}

/// Fill color with opacity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    /// Color.
    pub color: Color,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

impl Paint {
    /// Opaque paint.
    pub fn solid(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
        }
    }

    /// Paint with explicit opacity.
    pub fn with_opacity(color: Color, opacity: f64) -> Self {
        Self {
            color,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }
}

/// Stroke style.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    /// Stroke paint.
    pub paint: Paint,
    /// Stroke width in user units.
    pub width: f64,
}

impl Stroke {
    /// Opaque stroke.
    pub fn new(color: Color, width: f64) -> Self {
        Self {
            paint: Paint::solid(color),
            width,
        }
    }
}

/// Horizontal text anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    /// Left-aligned.
    Start,
    /// Centered.
    Middle,
    /// Right-aligned.
    End,
}

/// Vertical text baseline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Baseline {
    /// Text hangs below the anchor point.
    Top,
    /// Centered on the anchor point.
    Middle,
    /// Alphabetic baseline at the anchor point.
    Alphabetic,
}

/// Text styling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in user units.
    pub size: f64,
    /// Bold weight.
    pub bold: bool,
    /// Color.
    pub color: Color,
    /// Horizontal anchor.
    pub anchor: Anchor,
    /// Vertical baseline.
    pub baseline: Baseline,
    /// Rotation in degrees around the anchor point.
    pub angle: f64,
}

/// Drawing primitives.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// Axis-aligned rectangle.
    Rect {
        /// Geometry.
        rect: Rect,
        /// Fill.
        fill: Option<Paint>,
        /// Outline.
        stroke: Option<Stroke>,
    },
    /// Arbitrary path.
    Path {
        /// Geometry.
        path: BezPath,
        /// Fill.
        fill: Option<Paint>,
        /// Outline.
        stroke: Option<Stroke>,
    },
    /// Circle.
    Circle {
        /// Center.
        center: Point,
        /// Radius.
        radius: f64,
        /// Fill.
        fill: Option<Paint>,
        /// Outline.
        stroke: Option<Stroke>,
    },
    /// Straight line segment.
    Line {
        /// Start point.
        from: Point,
        /// End point.
        to: Point,
        /// Stroke.
        stroke: Stroke,
    },
    /// Single-line text.
    Text {
        /// Anchor point.
        pos: Point,
        /// Content.
        text: String,
        /// Style.
        style: TextStyle,
    },
    /// Rectangle filled with a linear gradient through evenly spaced stops.
    GradientRect {
        /// Geometry.
        rect: Rect,
        /// Color stops, first to last.
        stops: Vec<Color>,
        /// Gradient runs bottom-to-top when `true`, left-to-right otherwise.
        vertical: bool,
    },
}

impl Scene {
    /// Empty scene.
    pub fn new(size: Size, background: Color) -> Self {
        Self {
            size,
            background,
            groups: Vec::new(),
        }
    }

    /// Append a group (insertion order breaks paint-layer ties).
    pub fn push(&mut self, group: SceneGroup) {
        self.groups.push(group);
    }

    /// Groups in insertion order.
    pub fn groups(&self) -> &[SceneGroup] {
        &self.groups
    }

    /// Groups in paint order: background, grid, axes, marks, legends, titles.
    pub fn ordered_groups(&self) -> Vec<&SceneGroup> {
        let mut out: Vec<&SceneGroup> = self.groups.iter().collect();
        out.sort_by_key(|g| g.role.layer());
        out
    }

    /// Number of mark instances.
    pub fn mark_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| matches!(g.role, GroupRole::Mark(_)))
            .count()
    }

    /// Move every group of `child` into this scene, offset by `offset`.
    pub fn place(&mut self, child: Scene, offset: Vec2) {
        for g in child.groups {
            self.groups.push(g.at(offset));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/scene.rs"]
mod tests;
