//! Polygon layer data model: all units of one administrative level.

use std::collections::BTreeMap;

use geo::{BoundingRect, MultiPolygon};
use serde::{Deserialize, Serialize};

use crate::models::GeoLevel;

/// CRS assumed when an upstream response carries none (SIRGAS 2000).
pub const DEFAULT_CRS: &str = "EPSG:4674";

/// One administrative unit: merged geometry and metadata.
#[derive(Debug, Clone)]
pub struct LayerRow {
    /// IBGE numeric code of the unit
    pub id: i64,
    /// Display name (`nome`)
    pub name: String,
    /// Abbreviation (`sigla`), present for states and macro-regions
    pub abbreviation: Option<String>,
    /// Remaining normalized metadata columns (parent names and siglas)
    pub attributes: BTreeMap<String, String>,
    /// Boundary in geographic degrees
    pub geometry: MultiPolygon<f64>,
}

impl LayerRow {
    /// Bounding box as (min_x, min_y, max_x, max_y), `None` for empty
    /// geometry.
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.geometry
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}

/// All polygons of one administrative level at one quality tier.
///
/// Built once per (level, quality) pair and immutable afterwards. Row order
/// is the order returned by the upstream metadata service and is the
/// tie-break order for containment queries.
#[derive(Debug, Clone)]
pub struct PolygonLayer {
    pub level: GeoLevel,
    pub crs: String,
    pub rows: Vec<LayerRow>,
}

impl PolygonLayer {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The name/abbreviation pair extracted for a matched administrative unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub name: String,
    pub abbreviation: Option<String>,
}

impl RegionInfo {
    pub fn from_row(row: &LayerRow) -> Self {
        Self {
            name: row.name.clone(),
            abbreviation: row.abbreviation.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Polygon::new(
            LineString::from(vec![
                (min_x, min_y),
                (max_x, min_y),
                (max_x, max_y),
                (min_x, max_y),
                (min_x, min_y),
            ]),
            vec![],
        )])
    }

    #[test]
    fn bbox_of_square() {
        let row = LayerRow {
            id: 53,
            name: "Distrito Federal".to_string(),
            abbreviation: Some("DF".to_string()),
            attributes: BTreeMap::new(),
            geometry: square(-48.0, -16.0, -47.0, -15.0),
        };
        assert_eq!(row.bbox(), Some((-48.0, -16.0, -47.0, -15.0)));
    }

    #[test]
    fn empty_geometry_has_no_bbox() {
        let row = LayerRow {
            id: 1,
            name: String::new(),
            abbreviation: None,
            attributes: BTreeMap::new(),
            geometry: MultiPolygon(vec![]),
        };
        assert_eq!(row.bbox(), None);
    }
}
