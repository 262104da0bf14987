//! Administrative levels of the Brazilian territorial hierarchy and the
//! polygon quality tiers offered by the IBGE mesh API.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One tier of the Brazilian administrative hierarchy.
///
/// Ordered from broadest to narrowest. Each level maps to two upstream
/// identifiers: the `intrarregiao` token of the mesh (malhas) endpoint and
/// the path segment of the localities (localidades) metadata endpoint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GeoLevel {
    /// Whole country (implicit in the dataset, not resolvable per point)
    Country,
    /// Macro-region (Norte, Nordeste, Centro-Oeste, Sudeste, Sul)
    Region,
    /// Intermediate region
    IntermediateRegion,
    /// Immediate region
    ImmediateRegion,
    /// Federative unit (state or federal district)
    State,
    /// Municipality
    Municipality,
}

impl GeoLevel {
    /// `intrarregiao` token understood by the mesh endpoint.
    pub fn spatial_token(&self) -> &'static str {
        match self {
            GeoLevel::Country => "paises",
            GeoLevel::Region => "regiao",
            GeoLevel::IntermediateRegion => "intermediaria",
            GeoLevel::ImmediateRegion => "imediata",
            GeoLevel::State => "UF",
            GeoLevel::Municipality => "municipio",
        }
    }

    /// Path segment of the metadata endpoint.
    pub fn metadata_token(&self) -> &'static str {
        match self {
            GeoLevel::Country => "paises",
            GeoLevel::Region => "regioes",
            GeoLevel::IntermediateRegion => "regioes-intermediarias",
            GeoLevel::ImmediateRegion => "regioes-imediatas",
            GeoLevel::State => "estados",
            GeoLevel::Municipality => "municipios",
        }
    }

    /// Column prefix used by the `view=nivelado` metadata payload for this
    /// level's own columns (`<prefix>-id`, `<prefix>-nome`, ...).
    ///
    /// Differs from [`spatial_token`](Self::spatial_token) for the two
    /// regional subdivisions, whose metadata columns carry the long
    /// `regiao-*` form.
    pub fn column_prefix(&self) -> &'static str {
        match self {
            GeoLevel::IntermediateRegion => "regiao-intermediaria",
            GeoLevel::ImmediateRegion => "regiao-imediata",
            other => other.spatial_token(),
        }
    }

    /// All levels in hierarchical order (country first).
    pub fn all() -> &'static [GeoLevel] {
        &[
            GeoLevel::Country,
            GeoLevel::Region,
            GeoLevel::IntermediateRegion,
            GeoLevel::ImmediateRegion,
            GeoLevel::State,
            GeoLevel::Municipality,
        ]
    }

    /// Levels that can be resolved for a point. Country is excluded: the
    /// dataset is already scoped to Brazil.
    pub fn resolvable() -> &'static [GeoLevel] {
        &[
            GeoLevel::Region,
            GeoLevel::IntermediateRegion,
            GeoLevel::ImmediateRegion,
            GeoLevel::State,
            GeoLevel::Municipality,
        ]
    }
}

/// Polygon simplification tier of the mesh endpoint.
///
/// Lower quality means smaller downloads; higher quality means more accurate
/// boundaries near coastlines and state borders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    #[default]
    Low,
    Medium,
    High,
}

impl Quality {
    /// `qualidade` token understood by the mesh endpoint.
    pub fn token(&self) -> &'static str {
        match self {
            Quality::Low => "minima",
            Quality::Medium => "intermediaria",
            Quality::High => "maxima",
        }
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Quality::Low),
            "medium" => Ok(Quality::Medium),
            "high" => Ok(Quality::High),
            other => Err(format!(
                "unknown quality '{other}', expected one of: low, medium, high"
            )),
        }
    }
}
