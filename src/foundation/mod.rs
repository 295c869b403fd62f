/// Geometry and color primitives.
pub mod core;
/// Error taxonomy.
pub mod error;
