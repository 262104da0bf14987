//! Per-resolver memoization of polygon layers.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ibge::LayerSource;
use crate::models::{GeoLevel, Quality};
use crate::pip::LayerIndex;

/// Caches one indexed layer per administrative level.
///
/// The quality tier is fixed for the cache's lifetime, so the key is the
/// level alone. The cache is owned by a single resolver instance and is
/// never shared, so no locking is involved; a layer is fetched at most once
/// per instance.
pub struct LayerCache {
    quality: Quality,
    layers: HashMap<GeoLevel, Arc<LayerIndex>>,
}

impl LayerCache {
    pub fn new(quality: Quality) -> Self {
        Self {
            quality,
            layers: HashMap::new(),
        }
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn contains(&self, level: GeoLevel) -> bool {
        self.layers.contains_key(&level)
    }

    /// Number of cached layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Return the layer for a level, fetching and indexing it on first use.
    pub async fn get_or_fetch<S: LayerSource>(
        &mut self,
        source: &S,
        level: GeoLevel,
    ) -> Result<Arc<LayerIndex>> {
        if let Some(index) = self.layers.get(&level) {
            return Ok(Arc::clone(index));
        }

        debug!("Layer cache miss for {:?}", level);
        let layer = source.fetch_layer(level, self.quality).await?;
        let index = Arc::new(LayerIndex::build(layer));
        self.layers.insert(level, Arc::clone(&index));
        Ok(index)
    }

    /// Fetch all missing layers among `levels` concurrently and join the
    /// results before inserting. Levels are independent, so the fetches
    /// fan out instead of paying per-level latency in sequence. Fails on
    /// the first fetch error without caching any of the batch.
    pub async fn prefetch<S: LayerSource>(
        &mut self,
        source: &S,
        levels: &[GeoLevel],
    ) -> Result<()> {
        let mut missing: Vec<GeoLevel> = Vec::new();
        for &level in levels {
            if !self.layers.contains_key(&level) && !missing.contains(&level) {
                missing.push(level);
            }
        }

        if missing.is_empty() {
            return Ok(());
        }

        debug!("Prefetching {} layers: {:?}", missing.len(), missing);

        let quality = self.quality;
        let fetched = future::try_join_all(missing.into_iter().map(|level| async move {
            let layer = source.fetch_layer(level, quality).await?;
            Ok::<_, Error>((level, LayerIndex::build(layer)))
        }))
        .await?;

        for (level, index) in fetched {
            self.layers.insert(level, Arc::new(index));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pip::fixtures::StubSource;

    #[tokio::test]
    async fn second_request_hits_the_cache() {
        let source = StubSource::brazil();
        let mut cache = LayerCache::new(Quality::Low);

        let first = cache.get_or_fetch(&source, GeoLevel::State).await.unwrap();
        let second = cache.get_or_fetch(&source, GeoLevel::State).await.unwrap();

        assert_eq!(source.fetch_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn distinct_levels_fetch_independently() {
        let source = StubSource::brazil();
        let mut cache = LayerCache::new(Quality::Low);

        cache.get_or_fetch(&source, GeoLevel::State).await.unwrap();
        cache
            .get_or_fetch(&source, GeoLevel::Municipality)
            .await
            .unwrap();

        assert_eq!(source.fetch_count(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn prefetch_fetches_each_level_once() {
        let source = StubSource::brazil();
        let mut cache = LayerCache::new(Quality::Low);

        let levels = [GeoLevel::State, GeoLevel::Municipality, GeoLevel::Region];
        cache.prefetch(&source, &levels).await.unwrap();
        assert_eq!(source.fetch_count(), 3);

        // Already cached: no further fetches
        cache.prefetch(&source, &levels).await.unwrap();
        cache.get_or_fetch(&source, GeoLevel::State).await.unwrap();
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn prefetch_dedupes_requested_levels() {
        let source = StubSource::brazil();
        let mut cache = LayerCache::new(Quality::Low);

        cache
            .prefetch(&source, &[GeoLevel::State, GeoLevel::State])
            .await
            .unwrap();
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn prefetch_failure_surfaces_the_error() {
        // Stub with no layers at all: every fetch fails
        let source = StubSource::new(vec![]);
        let mut cache = LayerCache::new(Quality::Low);

        let result = cache.prefetch(&source, &[GeoLevel::State]).await;
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
