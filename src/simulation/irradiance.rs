//! Plane-of-array (POA) irradiance
//!
//! Horizontal modules (tilt 0) use global horizontal irradiance directly with
//! the solar zenith as angle of incidence. Tilted modules use the isotropic sky
//! transposition model with ground reflection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::solar::{solar_position, SolarPosition};
use crate::domain::{GeoPoint, ModuleParameters, RadDatabase, WeatherRecord, WeatherSeries};

/// Ground reflectance used for the ground-reflected component
pub const GROUND_ALBEDO: f64 = 0.25;

/// One hour of plane-of-array irradiance and weather
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoaRecord {
    pub timestamp: DateTime<Utc>,
    /// Global plane-of-array irradiance (W/m²)
    #[serde(rename = "poa_global_W/m2")]
    pub poa_global: f64,
    /// Ambient temperature (°C)
    #[serde(rename = "T2m")]
    pub temp_air_c: f64,
    /// Wind speed (m/s)
    #[serde(rename = "WS10m")]
    pub wind_speed_ms: f64,
    /// Angle of incidence (degrees)
    #[serde(rename = "aoi")]
    pub aoi_deg: f64,
}

/// POA series derived from one weather series
#[derive(Debug, Clone, PartialEq)]
pub struct PoaSeries {
    pub database: RadDatabase,
    pub records: Vec<PoaRecord>,
}

impl PoaSeries {
    pub fn poa_global(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.poa_global).collect()
    }
}

/// Isotropic-sky POA components (W/m²)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoaComponents {
    pub direct: f64,
    pub sky_diffuse: f64,
    pub ground_diffuse: f64,
}

impl PoaComponents {
    pub fn global(&self) -> f64 {
        self.direct + self.sky_diffuse + self.ground_diffuse
    }
}

/// Angle of incidence (degrees) between the sun and the surface normal
pub fn angle_of_incidence(
    tilt_deg: f64,
    surface_azimuth_deg: f64,
    zenith_deg: f64,
    solar_azimuth_deg: f64,
) -> f64 {
    let tilt = tilt_deg.to_radians();
    let zenith = zenith_deg.to_radians();
    let projection = tilt.cos() * zenith.cos()
        + tilt.sin() * zenith.sin() * (solar_azimuth_deg - surface_azimuth_deg).to_radians().cos();
    projection.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Isotropic sky transposition of horizontal irradiance onto a tilted plane
pub fn isotropic_transposition(
    tilt_deg: f64,
    aoi_deg: f64,
    dni: f64,
    ghi: f64,
    dhi: f64,
) -> PoaComponents {
    let cos_tilt = tilt_deg.to_radians().cos();
    PoaComponents {
        direct: (dni * aoi_deg.to_radians().cos()).max(0.0),
        sky_diffuse: dhi * (1.0 + cos_tilt) / 2.0,
        ground_diffuse: ghi * GROUND_ALBEDO * (1.0 - cos_tilt) / 2.0,
    }
}

fn poa_record(
    params: &ModuleParameters,
    weather: &WeatherRecord,
    sun: &SolarPosition,
) -> PoaRecord {
    let (poa_global, aoi_deg) = if params.tilt_deg == 0.0 {
        (weather.ghi, sun.zenith_deg)
    } else {
        let aoi = angle_of_incidence(
            params.tilt_deg,
            params.azimuth_deg,
            sun.apparent_zenith_deg,
            sun.azimuth_deg,
        );
        let components =
            isotropic_transposition(params.tilt_deg, aoi, weather.dni, weather.ghi, weather.dhi);
        (components.global(), aoi)
    };

    PoaRecord {
        timestamp: weather.timestamp,
        poa_global,
        temp_air_c: weather.temp_air_c,
        wind_speed_ms: weather.wind_speed_ms,
        aoi_deg,
    }
}

/// Plane-of-array irradiance for every hour of `weather` at `location`
pub fn plane_of_array(
    location: GeoPoint,
    params: &ModuleParameters,
    weather: &WeatherSeries,
) -> PoaSeries {
    let records = weather
        .records()
        .iter()
        .map(|w| {
            let sun = solar_position(location.latitude, location.longitude, w.timestamp);
            poa_record(params, w, &sun)
        })
        .collect();

    PoaSeries {
        database: weather.database(),
        records,
    }
}
