use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// A declarative chart specification (Vega-Lite flavored subset).
///
/// Unknown top-level keys (`config`, `padding`, `autosize`, ...) are accepted and ignored. The
/// grammar is checked by the compiler, not by deserialization.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChartSpec {
    /// Mark definition for unit specs.
    #[serde(default)]
    pub mark: Option<MarkDef>,
    /// Encoding channels for unit specs.
    #[serde(default)]
    pub encoding: Option<Encoding>,
    /// Inline data source.
    #[serde(default)]
    pub data: Option<DataSource>,
    /// Plot width.
    #[serde(default)]
    pub width: Option<SizeDef>,
    /// Plot height.
    #[serde(default)]
    pub height: Option<SizeDef>,
    /// Chart title.
    #[serde(default)]
    pub title: Option<TitleDef>,
    /// Facet composition header.
    #[serde(default)]
    pub facet: Option<FacetDef>,
    /// Inner spec repeated per facet cell.
    #[serde(default)]
    pub spec: Option<Box<ChartSpec>>,
    /// Column wrap count for single-field facets.
    #[serde(default)]
    pub columns: Option<u32>,
    /// Horizontal concatenation.
    #[serde(default)]
    pub hconcat: Option<Vec<ChartSpec>>,
    /// Vertical concatenation.
    #[serde(default)]
    pub vconcat: Option<Vec<ChartSpec>>,
    /// Layer composition (rejected by the compiler).
    #[serde(default)]
    pub layer: Option<serde_json::Value>,
    /// Repeat composition (rejected by the compiler).
    #[serde(default)]
    pub repeat: Option<serde_json::Value>,
    /// Background color of the whole chart.
    #[serde(default)]
    pub background: Option<String>,
}

impl ChartSpec {
    /// Return `true` when this spec is a facet or concat composition.
    pub fn is_composite(&self) -> bool {
        self.facet.is_some() || self.hconcat.is_some() || self.vconcat.is_some()
    }
}

/// Plot width or height: a number, `{"step": n}` or `"container"`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SizeDef {
    /// Fixed length in user units.
    Fixed(f64),
    /// Length of one discrete step; the panel spans `step` per category.
    Step {
        /// Step length in user units.
        step: f64,
    },
    /// A sizing keyword. Only `"container"` is understood.
    Keyword(String),
}

/// Mark as a bare type name or as an object with properties.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum MarkDef {
    /// `"mark": "bar"`.
    Type(String),
    /// `"mark": {"type": "bar", ...}`.
    Props(MarkProps),
}

impl MarkDef {
    /// The raw mark type string.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Type(t) => t,
            Self::Props(p) => &p.ty,
        }
    }

    /// Mark properties, if given in object form.
    pub fn props(&self) -> Option<&MarkProps> {
        match self {
            Self::Type(_) => None,
            Self::Props(p) => Some(p),
        }
    }
}

/// Mark properties in object form.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkProps {
    /// Mark type name.
    #[serde(rename = "type")]
    pub ty: String,
    /// Constant mark color.
    #[serde(default)]
    pub color: Option<String>,
    /// Constant mark opacity.
    #[serde(default)]
    pub opacity: Option<f64>,
    /// Whether point-like marks are filled.
    #[serde(default)]
    pub filled: Option<bool>,
    /// Constant symbol area (point marks) or thickness.
    #[serde(default)]
    pub size: Option<f64>,
    /// Stroke width for line-like marks.
    #[serde(default)]
    pub stroke_width: Option<f64>,
    /// Inner radius for arc marks (donut charts).
    #[serde(default)]
    pub inner_radius: Option<f64>,
}

/// The fixed set of supported mark types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkType {
    /// Bars.
    Bar,
    /// Polyline per series.
    Line,
    /// Hollow symbols.
    Point,
    /// Filled area per series.
    Area,
    /// Rectangles / heatmap cells.
    Rect,
    /// Filled circles.
    Circle,
    /// Filled squares.
    Square,
    /// Pie/donut sectors.
    Arc,
    /// Text labels.
    Text,
    /// Short ticks.
    Tick,
    /// Rules (lines).
    Rule,
    /// Variable-width lines.
    Trail,
    /// Box-and-whisker summaries.
    Boxplot,
}

impl MarkType {
    /// All supported mark types, in documentation order.
    pub const ALL: [Self; 13] = [
        Self::Bar,
        Self::Line,
        Self::Point,
        Self::Area,
        Self::Rect,
        Self::Circle,
        Self::Square,
        Self::Arc,
        Self::Text,
        Self::Tick,
        Self::Rule,
        Self::Trail,
        Self::Boxplot,
    ];

    /// Parse a mark type name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }

    /// Grammar name of the mark type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Point => "point",
            Self::Area => "area",
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Square => "square",
            Self::Arc => "arc",
            Self::Text => "text",
            Self::Tick => "tick",
            Self::Rule => "rule",
            Self::Trail => "trail",
            Self::Boxplot => "boxplot",
        }
    }
}

/// Encoding channels.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Encoding {
    /// Horizontal position.
    #[serde(default)]
    pub x: Option<ChannelDef>,
    /// Vertical position.
    #[serde(default)]
    pub y: Option<ChannelDef>,
    /// Secondary horizontal position (ranged marks).
    #[serde(default)]
    pub x2: Option<ChannelDef>,
    /// Secondary vertical position (ranged marks).
    #[serde(default)]
    pub y2: Option<ChannelDef>,
    /// Color.
    #[serde(default)]
    pub color: Option<ChannelDef>,
    /// Symbol area / trail width.
    #[serde(default)]
    pub size: Option<ChannelDef>,
    /// Opacity.
    #[serde(default)]
    pub opacity: Option<ChannelDef>,
    /// Text content for text marks.
    #[serde(default)]
    pub text: Option<ChannelDef>,
    /// Angle for arc marks.
    #[serde(default)]
    pub theta: Option<ChannelDef>,
    /// Channels that carry no visual meaning in a static image.
    #[serde(default)]
    pub tooltip: Option<serde_json::Value>,
    /// Grouping-only channel.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    /// Hyperlink channel.
    #[serde(default)]
    pub href: Option<serde_json::Value>,
    /// Identity channel.
    #[serde(default)]
    pub key: Option<serde_json::Value>,
    /// Anything else; reported as an unsupported channel.
    #[serde(flatten)]
    pub unsupported: BTreeMap<String, serde_json::Value>,
}

/// A single channel definition (field or constant value).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChannelDef {
    /// Data field name.
    #[serde(default)]
    pub field: Option<String>,
    /// Semantic type name.
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
    /// Aggregate operation name.
    #[serde(default)]
    pub aggregate: Option<String>,
    /// Title override for axis/legend.
    #[serde(default)]
    pub title: Option<String>,
    /// Constant value (instead of a field).
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    /// Axis options; explicit `null` hides the axis.
    #[serde(default, deserialize_with = "explicit")]
    pub axis: Option<Option<AxisDef>>,
    /// Legend options; explicit `null` hides the legend.
    #[serde(default, deserialize_with = "explicit")]
    pub legend: Option<Option<LegendDef>>,
    /// Scale options.
    #[serde(default)]
    pub scale: Option<ScaleDef>,
    /// Sort order; explicit `null` keeps data order.
    #[serde(default, deserialize_with = "explicit")]
    pub sort: Option<Option<SortDef>>,
}

/// Axis options.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisDef {
    /// Axis title override.
    #[serde(default)]
    pub title: Option<String>,
    /// Show gridlines.
    #[serde(default)]
    pub grid: Option<bool>,
    /// Label rotation in degrees.
    #[serde(default)]
    pub label_angle: Option<f64>,
}

/// Legend options.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LegendDef {
    /// Legend title override.
    #[serde(default)]
    pub title: Option<String>,
}

/// Scale options.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScaleDef {
    /// Include zero in continuous domains.
    #[serde(default)]
    pub zero: Option<bool>,
    /// Explicit domain (`[min, max]` for continuous, value list for discrete).
    #[serde(default)]
    pub domain: Option<Vec<serde_json::Value>>,
}

/// Sort definition for discrete domains.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum SortDef {
    /// `"ascending"` or `"descending"`.
    Order(String),
    /// Explicit value order.
    Values(Vec<serde_json::Value>),
    /// Sort-by-field objects; treated as ascending.
    Other(serde_json::Value),
}

/// Inline data source.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DataSource {
    /// Inline records.
    #[serde(default)]
    pub values: Option<Vec<serde_json::Value>>,
    /// External reference (rejected).
    #[serde(default)]
    pub url: Option<String>,
    /// Named dataset reference (rejected).
    #[serde(default)]
    pub name: Option<String>,
}

/// Title as plain text or as an object.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum TitleDef {
    /// `"title": "Sales"`.
    Text(String),
    /// `"title": {"text": "Sales"}`.
    Props {
        /// Title text.
        text: String,
    },
}

impl TitleDef {
    /// Title text.
    pub fn text(&self) -> &str {
        match self {
            Self::Text(t) => t,
            Self::Props { text } => text,
        }
    }
}

/// Facet header: `{row, column}` or a single wrapped field definition.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FacetDef {
    /// Row facet field.
    #[serde(default)]
    pub row: Option<ChannelDef>,
    /// Column facet field.
    #[serde(default)]
    pub column: Option<ChannelDef>,
    /// Wrapped facet field (`"facet": {"field": ..., "type": ...}`).
    #[serde(flatten)]
    pub wrapped: ChannelDef,
}

fn explicit<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[path = "../../tests/unit/spec/model.rs"]
mod tests;
