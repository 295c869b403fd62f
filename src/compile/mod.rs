/// Axis and gridline generation.
pub mod axis;
/// Chart spec → [`scene::Scene`] lowering, including composition.
pub mod compiler;
/// Inline data records and temporal parsing.
pub mod data;
/// Encoding channels, aggregation, stacking and domains.
pub mod encode;
/// Guide styling constants and text metrics.
pub mod layout;
/// Symbol and gradient legends.
pub mod legend;
/// Mark geometry.
pub mod marks;
/// Positional and color scales.
pub mod scale;
/// The compiled scene representation.
pub mod scene;
