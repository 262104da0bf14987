//! HTTP client for the IBGE mesh (malhas) and locality (localidades) APIs.
//!
//! A polygon layer is assembled from two requests: the mesh endpoint supplies
//! GeoJSON boundaries keyed by area code, the locality endpoint supplies a
//! flat metadata table. Both are normalized and joined on the numeric id.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use geo::MultiPolygon;
use geojson::FeatureCollection;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{GeoLevel, LayerRow, PolygonLayer, Quality, DEFAULT_CRS};

pub const DEFAULT_MALHAS_URL: &str = "https://servicodados.ibge.gov.br/api/v3/malhas";
pub const DEFAULT_LOCALIDADES_URL: &str = "https://servicodados.ibge.gov.br/api/v1/localidades";

/// The mesh endpoint returns no area code at the country level; the single
/// country row is keyed with this synthetic id.
const COUNTRY_ID: i64 = 1;

/// Source of polygon layers, one per (level, quality) pair.
///
/// The seam between the resolver and the network: tests substitute a stub
/// that serves synthetic layers and counts fetches.
pub trait LayerSource {
    /// Fetch and assemble the polygon layer for one level at one quality
    /// tier. Must never yield a partially merged layer: any failure along
    /// the way aborts the whole build.
    fn fetch_layer(
        &self,
        level: GeoLevel,
        quality: Quality,
    ) -> impl Future<Output = Result<PolygonLayer>> + Send;
}

/// Client for the IBGE territorial-data service.
pub struct IbgeClient {
    client: reqwest::Client,
    malhas_url: String,
    localidades_url: String,
}

impl IbgeClient {
    /// Client against the public IBGE endpoints.
    pub fn new() -> Self {
        Self::with_base_urls(DEFAULT_MALHAS_URL, DEFAULT_LOCALIDADES_URL)
    }

    /// Client against alternative endpoint bases (mirrors, test servers).
    pub fn with_base_urls(
        malhas_url: impl Into<String>,
        localidades_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("jacaranda/", env!("CARGO_PKG_VERSION")))
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to create HTTP client"),
            malhas_url: malhas_url.into(),
            localidades_url: localidades_url.into(),
        }
    }

    /// Fetch the GeoJSON mesh for a level, returning `(id, boundary)` pairs
    /// and the layer CRS.
    async fn fetch_polygons(
        &self,
        level: GeoLevel,
        quality: Quality,
    ) -> Result<(Vec<(i64, MultiPolygon<f64>)>, String)> {
        let url = format!("{}/paises/BR", self.malhas_url);

        // The country mesh is the whole dataset; intrarregiao only applies
        // to subdivisions.
        let mut params: Vec<(&str, &str)> = Vec::with_capacity(3);
        if level != GeoLevel::Country {
            params.push(("intrarregiao", level.spatial_token()));
        }
        params.push(("qualidade", quality.token()));
        params.push(("formato", "application/vnd.geo+json"));

        debug!("Fetching {:?} mesh at {:?} quality", level, quality);

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::Fetch {
                url: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus {
                url,
                status: response.status(),
            });
        }

        let collection: FeatureCollection =
            response.json().await.map_err(|e| Error::MalformedResponse {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let crs = layer_crs(&collection);

        let mut geometries = Vec::with_capacity(collection.features.len());
        for feature in collection.features {
            let id = if level == GeoLevel::Country {
                COUNTRY_ID
            } else {
                feature_id(&feature).ok_or_else(|| Error::MalformedResponse {
                    url: url.clone(),
                    reason: "feature without an integer area code".to_string(),
                })?
            };

            let Some(geometry) = feature.geometry else {
                return Err(Error::MalformedResponse {
                    url,
                    reason: format!("feature {id} has no geometry"),
                });
            };

            let geometry = geo_types::Geometry::<f64>::try_from(geometry).map_err(|e| {
                Error::MalformedResponse {
                    url: url.clone(),
                    reason: e.to_string(),
                }
            })?;

            let boundary = match geometry {
                geo_types::Geometry::Polygon(polygon) => MultiPolygon(vec![polygon]),
                geo_types::Geometry::MultiPolygon(multi) => multi,
                _ => {
                    return Err(Error::MalformedResponse {
                        url,
                        reason: format!("feature {id} is not a polygon or multipolygon"),
                    })
                }
            };

            geometries.push((id, boundary));
        }

        Ok((geometries, crs))
    }

    /// Fetch the flat metadata table for a level, with columns normalized
    /// to uniform `id`/`nome`/`sigla` names.
    async fn fetch_metadata(&self, level: GeoLevel) -> Result<Vec<MetadataRow>> {
        let url = format!("{}/{}", self.localidades_url, level.metadata_token());

        debug!("Fetching {:?} metadata", level);

        let response = self
            .client
            .get(&url)
            .query(&[("view", "nivelado")])
            .send()
            .await
            .map_err(|e| Error::Fetch {
                url: url.clone(),
                source: e,
            })?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus {
                url,
                status: response.status(),
            });
        }

        let raw: Vec<Map<String, Value>> =
            response.json().await.map_err(|e| Error::MalformedResponse {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let prefix = level.column_prefix();
        raw.iter()
            .map(|row| {
                normalize_row(row, prefix).ok_or_else(|| Error::MalformedResponse {
                    url: url.clone(),
                    reason: "metadata row without an integer id column".to_string(),
                })
            })
            .collect()
    }
}

impl LayerSource for IbgeClient {
    async fn fetch_layer(&self, level: GeoLevel, quality: Quality) -> Result<PolygonLayer> {
        // The country endpoint has no metadata counterpart
        if level == GeoLevel::Country {
            let (geometries, crs) = self.fetch_polygons(level, quality).await?;
            let rows = geometries
                .into_iter()
                .map(|(id, geometry)| LayerRow {
                    id,
                    name: String::new(),
                    abbreviation: None,
                    attributes: BTreeMap::new(),
                    geometry,
                })
                .collect();
            return Ok(PolygonLayer { level, crs, rows });
        }

        let ((geometries, crs), metadata) = tokio::try_join!(
            self.fetch_polygons(level, quality),
            self.fetch_metadata(level)
        )?;

        let layer = merge_layer(level, crs, geometries, metadata);
        info!("Built {:?} layer with {} rows", level, layer.len());
        Ok(layer)
    }
}

impl Default for IbgeClient {
    fn default() -> Self {
        Self::new()
    }
}

/// A normalized metadata row before the geometry join.
#[derive(Debug, Clone)]
struct MetadataRow {
    id: i64,
    name: String,
    abbreviation: Option<String>,
    attributes: BTreeMap<String, String>,
}

/// Normalize one raw `view=nivelado` row.
///
/// Columns prefixed with the level's own prefix lose it (`UF-sigla` →
/// `sigla`); other columns ending in `id` are parent identifiers from
/// sibling levels and are dropped; remaining columns lose a `-nome` suffix.
/// Returns `None` when the row has no coercible integer id.
fn normalize_row(raw: &Map<String, Value>, prefix: &str) -> Option<MetadataRow> {
    let mut id = None;
    let mut name = String::new();
    let mut abbreviation = None;
    let mut attributes = BTreeMap::new();

    for (key, value) in raw {
        if let Some(field) = key
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('-'))
        {
            match field {
                "id" => id = coerce_id(value),
                "nome" => name = value_to_string(value).unwrap_or_default(),
                "sigla" => abbreviation = value_to_string(value),
                other => {
                    if let Some(text) = value_to_string(value) {
                        attributes.insert(other.to_string(), text);
                    }
                }
            }
        } else if key.ends_with("id") {
            continue;
        } else if let Some(text) = value_to_string(value) {
            let renamed = key.strip_suffix("-nome").unwrap_or(key);
            attributes.insert(renamed.to_string(), text);
        }
    }

    Some(MetadataRow {
        id: id?,
        name,
        abbreviation,
        attributes,
    })
}

/// Inner join of metadata onto geometry by id, preserving metadata row
/// order. A key mismatch produces an empty layer, not an error.
fn merge_layer(
    level: GeoLevel,
    crs: String,
    geometries: Vec<(i64, MultiPolygon<f64>)>,
    metadata: Vec<MetadataRow>,
) -> PolygonLayer {
    let mut by_id: HashMap<i64, MultiPolygon<f64>> = geometries.into_iter().collect();

    let rows = metadata
        .into_iter()
        .filter_map(|meta| {
            by_id.remove(&meta.id).map(|geometry| LayerRow {
                id: meta.id,
                name: meta.name,
                abbreviation: meta.abbreviation,
                attributes: meta.attributes,
                geometry,
            })
        })
        .collect();

    PolygonLayer { level, crs, rows }
}

/// The area code carried on a mesh feature, coerced to an integer.
fn feature_id(feature: &geojson::Feature) -> Option<i64> {
    let properties = feature.properties.as_ref()?;
    let value = properties
        .get("codarea")
        .or_else(|| properties.values().next())?;
    coerce_id(value)
}

fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// CRS tag of a feature collection, falling back to SIRGAS 2000 when the
/// response carries none.
fn layer_crs(collection: &FeatureCollection) -> String {
    collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.pointer("/properties/name"))
        .and_then(|name| name.as_str())
        .and_then(parse_crs_name)
        .unwrap_or_else(|| DEFAULT_CRS.to_string())
}

/// Accepts both `EPSG:4674` and URN forms like `urn:ogc:def:crs:EPSG::4674`.
fn parse_crs_name(name: &str) -> Option<String> {
    let code = name.rsplit(':').find(|part| !part.is_empty())?;
    if code.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("EPSG:{code}"))
    } else {
        None
    }
}
