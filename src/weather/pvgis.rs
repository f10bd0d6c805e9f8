//! PVGIS typical meteorological year client
//!
//! Requests the TMY profile from the primary radiation database and retries
//! exactly once against the fallback database when the primary request fails
//! for any reason (transport error, non-success status, invalid payload).

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{WeatherError, WeatherSource};
use crate::config::PvgisConfig;
use crate::domain::{GeoPoint, RadDatabase, WeatherRecord, WeatherSeries};

const TIME_FORMAT: &str = "%Y%m%d:%H%M";

/// PVGIS API client
pub struct PvgisClient {
    client: Client,
    base_url: String,
    primary: RadDatabase,
    fallback: RadDatabase,
    use_horizon: bool,
}

impl PvgisClient {
    pub fn new(config: &PvgisConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.timeout())
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            primary: config.primary_database,
            fallback: config.fallback_database,
            use_horizon: config.use_horizon,
        }
    }

    /// Fetch the TMY profile from a single database
    pub async fn fetch_from(
        &self,
        location: GeoPoint,
        database: RadDatabase,
    ) -> Result<WeatherSeries, WeatherError> {
        let url = format!("{}/tmy", self.base_url);
        debug!(%url, %location, %database, "requesting PVGIS TMY profile");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", format!("{:.6}", location.latitude)),
                ("lon", format!("{:.6}", location.longitude)),
                ("usehorizon", if self.use_horizon { "1" } else { "0" }.to_string()),
                ("raddatabase", database.to_string()),
                ("outputformat", "json".to_string()),
            ])
            .send()
            .await
            .map_err(|source| WeatherError::Http { database, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::Status {
                database,
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| WeatherError::Http { database, source })?;
        parse_tmy(&body, database)
    }
}

#[async_trait]
impl WeatherSource for PvgisClient {
    async fn fetch_tmy(&self, location: GeoPoint) -> Result<WeatherSeries, WeatherError> {
        let primary = match self.fetch_from(location, self.primary).await {
            Ok(series) => return Ok(series),
            Err(e) => e,
        };

        warn!(
            %location,
            database = %self.primary,
            error = %primary,
            "primary radiation database failed"
        );
        info!(%location, database = %self.fallback, "retrying with fallback radiation database");

        self.fetch_from(location, self.fallback)
            .await
            .map_err(|fallback| WeatherError::AllSourcesFailed {
                primary: Box::new(primary),
                fallback: Box::new(fallback),
            })
    }
}

/// Parse a PVGIS TMY JSON payload into a validated series
pub fn parse_tmy(body: &str, database: RadDatabase) -> Result<WeatherSeries, WeatherError> {
    let response: TmyResponse = serde_json::from_str(body).map_err(|e| WeatherError::Parse {
        database,
        message: e.to_string(),
    })?;

    let records = response
        .outputs
        .tmy_hourly
        .into_iter()
        .map(TmyHour::into_record)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(WeatherSeries::try_new(database, records)?)
}

// PVGIS API response structures
#[derive(Debug, Deserialize)]
struct TmyResponse {
    outputs: TmyOutputs,
}

#[derive(Debug, Deserialize)]
struct TmyOutputs {
    tmy_hourly: Vec<TmyHour>,
}

#[derive(Debug, Deserialize)]
struct TmyHour {
    #[serde(rename = "time(UTC)")]
    time: String,
    #[serde(rename = "T2m")]
    t2m: f64,
    #[serde(rename = "G(h)")]
    ghi: f64,
    #[serde(rename = "Gb(n)")]
    dni: f64,
    #[serde(rename = "Gd(h)")]
    dhi: f64,
    #[serde(rename = "WS10m")]
    ws10m: f64,
}

impl TmyHour {
    fn into_record(self) -> Result<WeatherRecord, WeatherError> {
        let timestamp = NaiveDateTime::parse_from_str(&self.time, TIME_FORMAT)
            .map_err(|_| WeatherError::Timestamp(self.time.clone()))?
            .and_utc();
        Ok(WeatherRecord {
            timestamp,
            ghi: self.ghi,
            dni: self.dni,
            dhi: self.dhi,
            temp_air_c: self.t2m,
            wind_speed_ms: self.ws10m,
        })
    }
}
