//! Point-in-polygon resolution of administrative regions.
//!
//! Layers come from a [`LayerSource`](crate::ibge::LayerSource), are indexed
//! with an R-tree, and are memoized per resolver instance.

mod cache;
mod index;
mod locator;

pub use cache::LayerCache;
pub use index::LayerIndex;
pub use locator::{GeoLocator, Resolution};
