use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Geography
// ============================================================================

/// Geographic point in WGS84 decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Longitude in degrees (positive = east)
    pub longitude: f64,
    /// Latitude in degrees (positive = north)
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Planar distance in degrees, treating longitude/latitude as x/y.
    ///
    /// This is not a geodesic distance. Soiling reference selection is defined
    /// on this metric.
    pub fn planar_distance(&self, other: &GeoPoint) -> f64 {
        (self.longitude - other.longitude).hypot(self.latitude - other.latitude)
    }

    /// Check that latitude/longitude lie inside their valid ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

// ============================================================================
// Irradiance data source
// ============================================================================

/// Radiation database that served an irradiance time series
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum RadDatabase {
    #[serde(rename = "PVGIS-SARAH2")]
    #[strum(serialize = "PVGIS-SARAH2")]
    PvgisSarah2,
    #[serde(rename = "PVGIS-SARAH3")]
    #[strum(serialize = "PVGIS-SARAH3")]
    PvgisSarah3,
    #[serde(rename = "PVGIS-ERA5")]
    #[strum(serialize = "PVGIS-ERA5")]
    PvgisEra5,
    #[serde(rename = "PVGIS-NSRDB")]
    #[strum(serialize = "PVGIS-NSRDB")]
    PvgisNsrdb,
}

// ============================================================================
// Unit conversions
// ============================================================================

/// Watts per megawatt
pub const WATTS_PER_MW: f64 = 1_000_000.0;

/// Watts per kilowatt
pub const WATTS_PER_KW: f64 = 1_000.0;
