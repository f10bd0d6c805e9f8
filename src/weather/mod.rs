//! Weather and irradiance retrieval
//!
//! Typical meteorological year (TMY) profiles come from the PVGIS API through
//! [`PvgisClient`], optionally wrapped in the file-backed
//! [`CachedWeatherSource`]. The simulation only depends on the
//! [`WeatherSource`] trait, so tests can plug in synthetic profiles.

pub mod cache;
pub mod pvgis;

pub use cache::CachedWeatherSource;
pub use pvgis::PvgisClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{GeoPoint, RadDatabase, TimeSeriesError, WeatherSeries};

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Request to {database} failed: {source}")]
    Http {
        database: RadDatabase,
        #[source]
        source: reqwest::Error,
    },

    #[error("{database} returned status {status}: {body}")]
    Status {
        database: RadDatabase,
        status: u16,
        body: String,
    },

    #[error("Invalid {database} payload: {message}")]
    Parse {
        database: RadDatabase,
        message: String,
    },

    #[error("Invalid timestamp '{0}'")]
    Timestamp(String),

    #[error("Primary database failed ({primary}); fallback failed ({fallback})")]
    AllSourcesFailed {
        primary: Box<WeatherError>,
        fallback: Box<WeatherError>,
    },

    #[error(transparent)]
    TimeSeries(#[from] TimeSeriesError),

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache payload error: {0}")]
    Cache(#[from] serde_json::Error),
}

/// Source of hourly TMY weather profiles
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch the TMY profile for `location`
    async fn fetch_tmy(&self, location: GeoPoint) -> Result<WeatherSeries, WeatherError>;
}
