//! Core data models: coordinates, administrative levels, polygon layers.

pub mod coords;
pub mod layer;
pub mod level;

pub use coords::GeoCoords;
pub use layer::{LayerRow, PolygonLayer, RegionInfo, DEFAULT_CRS};
pub use level::{GeoLevel, Quality};
