//! Jacaranda - resolve the Brazilian administrative regions containing a point.
//!
//! Given a geographic coordinate, [`GeoLocator`] determines the municipality,
//! state, immediate region, intermediate region, and macro-region whose
//! boundary polygons contain it, using mesh and locality data from the IBGE
//! territorial-data service.
//!
//! ```no_run
//! use jacaranda::{GeoCoords, GeoLevel, GeoLocator, Quality};
//!
//! # async fn run() -> jacaranda::Result<()> {
//! let brasilia = GeoCoords::new(-15.7801, -47.9292)?;
//! let mut locator = GeoLocator::new(brasilia, Quality::Low);
//!
//! let resolution = locator.resolve().await?;
//! let state = resolution.get(GeoLevel::State).unwrap();
//! assert_eq!(state.abbreviation.as_deref(), Some("DF"));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod ibge;
pub mod models;
pub mod pip;

pub use error::{Error, Result};
pub use ibge::{IbgeClient, LayerSource};
pub use models::{GeoCoords, GeoLevel, LayerRow, PolygonLayer, Quality, RegionInfo};
pub use pip::{GeoLocator, LayerCache, LayerIndex, Resolution};
