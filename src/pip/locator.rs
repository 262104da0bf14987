//! Resolver mapping a geographic point to its administrative regions.

use std::collections::BTreeMap;

use geo::Point;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::ibge::{IbgeClient, LayerSource};
use crate::models::{GeoCoords, GeoLevel, Quality, RegionInfo};
use crate::pip::LayerCache;

/// Per-level resolution outcome.
///
/// Contains exactly the levels that were asked for; `None` at a level means
/// no polygon there contains the point (offshore, or outside Brazil) and is
/// a first-class outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resolution {
    levels: BTreeMap<GeoLevel, Option<RegionInfo>>,
}

impl Resolution {
    pub fn set(&mut self, level: GeoLevel, info: Option<RegionInfo>) {
        self.levels.insert(level, info);
    }

    /// The matched unit at a level, `None` when there was no covering
    /// polygon or the level was not resolved.
    pub fn get(&self, level: GeoLevel) -> Option<&RegionInfo> {
        self.levels.get(&level).and_then(|info| info.as_ref())
    }

    /// Whether the level was resolved at all (regardless of outcome).
    pub fn contains_level(&self, level: GeoLevel) -> bool {
        self.levels.contains_key(&level)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GeoLevel, Option<&RegionInfo>)> {
        self.levels.iter().map(|(level, info)| (*level, info.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Locates the administrative regions containing a geographic point.
///
/// Layers are fetched lazily through a private per-instance cache, so
/// resolving several levels (or the same level repeatedly) for one point
/// costs at most one fetch per level.
pub struct GeoLocator<S: LayerSource = IbgeClient> {
    coords: GeoCoords,
    point: Point<f64>,
    source: S,
    cache: LayerCache,
}

impl GeoLocator<IbgeClient> {
    /// Locator backed by the public IBGE endpoints.
    pub fn new(coords: GeoCoords, quality: Quality) -> Self {
        Self::with_source(coords, quality, IbgeClient::new())
    }
}

impl<S: LayerSource> GeoLocator<S> {
    /// Locator backed by an arbitrary layer source.
    pub fn with_source(coords: GeoCoords, quality: Quality, source: S) -> Self {
        Self {
            coords,
            point: coords.to_point(),
            source,
            cache: LayerCache::new(quality),
        }
    }

    pub fn coords(&self) -> GeoCoords {
        self.coords
    }

    pub fn quality(&self) -> Quality {
        self.cache.quality()
    }

    /// Resolve a single level for this point.
    ///
    /// Returns `Ok(None)` when no polygon at the level contains the point.
    /// The country level is rejected: the dataset is already scoped to
    /// Brazil, so country membership is implicit.
    pub async fn locate(&mut self, level: GeoLevel) -> Result<Option<RegionInfo>> {
        if level == GeoLevel::Country {
            return Err(Error::CountryNotResolvable);
        }

        let index = self.cache.get_or_fetch(&self.source, level).await?;
        let found = index.lookup(self.point).map(RegionInfo::from_row);

        debug!(
            "{:?} lookup at {}: {:?}",
            level,
            self.coords,
            found.as_ref().map(|info| info.name.as_str())
        );
        Ok(found)
    }

    /// Resolve every per-point level (all but country).
    pub async fn resolve(&mut self) -> Result<Resolution> {
        self.resolve_levels(GeoLevel::resolvable()).await
    }

    /// Resolve the requested levels, prefetching their layers concurrently.
    ///
    /// Fail-fast: the first layer fetch error aborts the whole resolution.
    /// Callers wanting partial results can drive [`locate`](Self::locate)
    /// per level instead and skip failures.
    pub async fn resolve_levels(&mut self, levels: &[GeoLevel]) -> Result<Resolution> {
        if levels.contains(&GeoLevel::Country) {
            return Err(Error::CountryNotResolvable);
        }

        self.cache.prefetch(&self.source, levels).await?;

        let mut resolution = Resolution::default();
        for &level in levels {
            let info = self.locate(level).await?;
            resolution.set(level, info);
        }
        Ok(resolution)
    }
}
