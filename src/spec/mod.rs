/// Typed chart grammar.
pub mod model;
/// Syntax check and default sizing.
pub mod normalize;
