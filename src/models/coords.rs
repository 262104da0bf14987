//! Validated geographic coordinates with geodesic helpers.

use std::fmt;

use geo::Point;
use proj4rs::proj::Proj;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Geographic CRS used for point queries and as the UTM round-trip anchor.
const GEOGRAPHIC_EPSG: u16 = 4326;

/// A validated WGS-84 latitude/longitude pair.
///
/// Construction enforces latitude in [-90, 90] and longitude in [-180, 180];
/// an invalid pair never reaches a spatial query. Deserialization goes
/// through the same validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoords")]
pub struct GeoCoords {
    lat: f64,
    lon: f64,
}

/// Unvalidated wire shape, only used as a serde intermediate.
#[derive(Deserialize)]
struct RawCoords {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawCoords> for GeoCoords {
    type Error = Error;

    fn try_from(raw: RawCoords) -> Result<Self> {
        GeoCoords::new(raw.lat, raw.lon)
    }
}

impl GeoCoords {
    /// Create a coordinate pair, validating both components.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(Error::InvalidLatitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(Error::InvalidLongitude(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Create from a `(latitude, longitude)` tuple.
    pub fn from_tuple(coords: (f64, f64)) -> Result<Self> {
        Self::new(coords.0, coords.1)
    }

    /// Create from projected coordinates in the given EPSG-coded CRS
    /// (e.g. `"EPSG:32722"` for WGS-84 / UTM zone 22S).
    pub fn from_utm(easting: f64, northing: f64, source_crs: &str) -> Result<Self> {
        let from = epsg_proj(source_crs)?;
        let to = epsg_proj(&format!("EPSG:{GEOGRAPHIC_EPSG}"))?;

        let mut point = (easting, northing, 0.0);
        proj4rs::transform::transform(&from, &to, &mut point).map_err(|e| Error::Transform {
            crs: source_crs.to_string(),
            reason: e.to_string(),
        })?;

        // Geographic output from proj4rs is in radians
        Self::new(point.1.to_degrees(), point.0.to_degrees())
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// As a `(latitude, longitude)` tuple.
    pub fn to_tuple(self) -> (f64, f64) {
        (self.lat, self.lon)
    }

    /// Planar view used for containment queries: x = longitude, y = latitude.
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// Project into the given EPSG-coded CRS, returning `(easting, northing)`.
    pub fn to_utm(&self, target_crs: &str) -> Result<(f64, f64)> {
        let from = epsg_proj(&format!("EPSG:{GEOGRAPHIC_EPSG}"))?;
        let to = epsg_proj(target_crs)?;

        let mut point = (self.lon.to_radians(), self.lat.to_radians(), 0.0);
        proj4rs::transform::transform(&from, &to, &mut point).map_err(|e| Error::Transform {
            crs: target_crs.to_string(),
            reason: e.to_string(),
        })?;

        Ok((point.0, point.1))
    }

    /// Great-circle distance to another point in kilometres (haversine).
    pub fn distance_to(&self, other: &GeoCoords) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }

    /// Initial bearing (forward azimuth) to another point, in degrees
    /// measured clockwise from north, normalized to [0, 360).
    pub fn bearing_to(&self, other: &GeoCoords) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let x = dlon.sin() * lat2.cos();
        let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        (x.atan2(y).to_degrees() + 360.0) % 360.0
    }
}

impl fmt::Display for GeoCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.lat >= 0.0 { 'N' } else { 'S' };
        let ew = if self.lon >= 0.0 { 'E' } else { 'W' };
        write!(
            f,
            "{:.6}°{}, {:.6}°{}",
            self.lat.abs(),
            ns,
            self.lon.abs(),
            ew
        )
    }
}

/// Resolve an `"EPSG:nnnn"` identifier to a projection definition.
fn epsg_proj(crs: &str) -> Result<Proj> {
    let code = crs
        .strip_prefix("EPSG:")
        .or_else(|| crs.strip_prefix("epsg:"))
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or_else(|| Error::InvalidCrs(crs.to_string()))?;

    Proj::from_epsg_code(code).map_err(|_| Error::InvalidCrs(crs.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn brasilia() -> GeoCoords {
        GeoCoords::new(-15.7801, -47.9292).unwrap()
    }

    fn manaus() -> GeoCoords {
        GeoCoords::new(-3.1190, -60.0217).unwrap()
    }

    #[test]
    fn accepts_full_valid_range() {
        assert!(GeoCoords::new(90.0, 180.0).is_ok());
        assert!(GeoCoords::new(-90.0, -180.0).is_ok());
        assert!(GeoCoords::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(matches!(
            GeoCoords::new(90.0001, 0.0),
            Err(Error::InvalidLatitude(_))
        ));
        assert!(matches!(
            GeoCoords::new(f64::NAN, 0.0),
            Err(Error::InvalidLatitude(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        assert!(matches!(
            GeoCoords::new(0.0, -180.5),
            Err(Error::InvalidLongitude(_))
        ));
    }

    #[test]
    fn tuple_round_trip() {
        let coords = GeoCoords::from_tuple((-15.7801, -47.9292)).unwrap();
        assert_eq!(coords.to_tuple(), (-15.7801, -47.9292));
    }

    #[test]
    fn point_is_lon_lat() {
        let point = brasilia().to_point();
        assert_relative_eq!(point.x(), -47.9292);
        assert_relative_eq!(point.y(), -15.7801);
    }

    #[test]
    fn deserialization_validates() {
        let ok: GeoCoords = serde_json::from_str(r#"{"lat":-15.78,"lon":-47.93}"#).unwrap();
        assert_relative_eq!(ok.lat(), -15.78);

        let bad = serde_json::from_str::<GeoCoords>(r#"{"lat":200.0,"lon":0.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn display_uses_hemisphere_suffixes() {
        assert_eq!(brasilia().to_string(), "15.780100°S, 47.929200°W");
        let greenwich = GeoCoords::new(51.4769, 0.0).unwrap();
        assert_eq!(greenwich.to_string(), "51.476900°N, 0.000000°E");
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = brasilia();
        let b = manaus();
        assert_relative_eq!(a.distance_to(&b), b.distance_to(&a));
        assert_relative_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn distance_brasilia_manaus() {
        assert_relative_eq!(
            brasilia().distance_to(&manaus()),
            2689.6,
            max_relative = 1e-3
        );
    }

    #[test]
    fn bearing_known_values() {
        assert_relative_eq!(
            brasilia().bearing_to(&manaus()),
            322.0,
            max_relative = 1e-2
        );

        let origin = GeoCoords::new(0.0, 0.0).unwrap();
        let east = GeoCoords::new(0.0, 1.0).unwrap();
        assert_relative_eq!(origin.bearing_to(&east), 90.0, epsilon = 0.1);
    }

    #[test]
    fn utm_round_trip() {
        let coords = brasilia();
        let (easting, northing) = coords.to_utm("EPSG:32722").unwrap();
        let back = GeoCoords::from_utm(easting, northing, "EPSG:32722").unwrap();
        assert_relative_eq!(back.lat(), coords.lat(), epsilon = 1e-6);
        assert_relative_eq!(back.lon(), coords.lon(), epsilon = 1e-6);
    }

    #[test]
    fn invalid_crs_is_rejected() {
        assert!(matches!(
            brasilia().to_utm("not-a-crs"),
            Err(Error::InvalidCrs(_))
        ));
        assert!(matches!(
            GeoCoords::from_utm(0.0, 0.0, "EPSG:0"),
            Err(Error::InvalidCrs(_))
        ));
    }
}
