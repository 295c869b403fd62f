/// PNG rasterization through resvg.
pub mod raster;
/// Scene to SVG serialization.
pub mod svg;
