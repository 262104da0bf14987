//! Error types for the jacaranda crate.

use thiserror::Error;

/// Errors surfaced by coordinate validation, layer fetching, and
/// coordinate-system transforms.
///
/// A point that falls outside every polygon at a level is *not* an error;
/// lookups report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    /// Latitude outside [-90, 90] degrees
    #[error("latitude must be between -90 and 90 degrees, got {0}")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180] degrees
    #[error("longitude must be between -180 and 180 degrees, got {0}")]
    InvalidLongitude(f64),

    /// Transport-level failure talking to an IBGE endpoint
    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status from an IBGE endpoint
    #[error("{url} returned HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Response body that could not be decoded into the expected shape
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    /// CRS identifier that is not a known EPSG code
    #[error("invalid CRS identifier: {0}")]
    InvalidCrs(String),

    /// Projection failure during a coordinate transform
    #[error("coordinate transform involving {crs} failed: {reason}")]
    Transform { crs: String, reason: String },

    /// The country level is implicit (the dataset is already scoped to
    /// Brazil) and cannot be resolved per point
    #[error("the country level cannot be resolved per point")]
    CountryNotResolvable,
}

pub type Result<T> = std::result::Result<T, Error>;
