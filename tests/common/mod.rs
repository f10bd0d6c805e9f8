#![allow(dead_code)]
//! Shared fixtures for integration tests

use async_trait::async_trait;
use chrono::{Datelike, Duration, TimeZone, Timelike, Utc};
use std::time::Duration as StdDuration;

use fpv_simulation::domain::{GeoPoint, RadDatabase, WeatherRecord, WeatherSeries};
use fpv_simulation::weather::{WeatherError, WeatherSource};

/// Source years per month, as PVGIS picks them for a TMY (no leap years)
pub const TMY_YEARS: [i32; 12] = [2007, 2011, 2009, 2014, 2010, 2006, 2013, 2005, 2015, 2007, 2010, 2009];

/// Hourly TMY profile spliced from different years, one month per source year
pub fn tmy_records(peak_ghi: f64) -> Vec<WeatherRecord> {
    let mut records = Vec::with_capacity(8760);
    for (month0, year) in TMY_YEARS.iter().enumerate() {
        let month = month0 as u32 + 1;
        let start = Utc.with_ymd_and_hms(*year, month, 1, 0, 0, 0).unwrap();
        let mut t = start;
        while t.month() == month {
            let daylight = ((t.hour() as f64 - 6.0) / 12.0 * std::f64::consts::PI).sin().max(0.0);
            let season = 0.55 + 0.45 * (2.0 * std::f64::consts::PI * (t.ordinal() as f64 - 172.0) / 365.0).cos();
            let ghi = peak_ghi * daylight * season;
            records.push(WeatherRecord {
                timestamp: t,
                ghi,
                dni: 0.7 * ghi,
                dhi: 0.3 * ghi,
                temp_air_c: 2.0 + 12.0 * daylight * season,
                wind_speed_ms: 3.0,
            });
            t += Duration::hours(1);
        }
    }
    records
}

/// PVGIS-shaped JSON payload for `records`
pub fn pvgis_payload(records: &[WeatherRecord]) -> serde_json::Value {
    let hours: Vec<_> = records
        .iter()
        .map(|r| {
            serde_json::json!({
                "time(UTC)": r.timestamp.format("%Y%m%d:%H%M").to_string(),
                "T2m": r.temp_air_c,
                "RH": 75.0,
                "G(h)": r.ghi,
                "Gb(n)": r.dni,
                "Gd(h)": r.dhi,
                "IR(h)": 280.0,
                "WS10m": r.wind_speed_ms,
                "WD10m": 180.0,
                "SP": 100_000.0
            })
        })
        .collect();
    serde_json::json!({ "inputs": {}, "outputs": { "tmy_hourly": hours }, "meta": {} })
}

/// In-memory weather source with per-location delays and failures
pub struct SyntheticSource {
    pub database: RadDatabase,
    /// Locations north of this latitude fail
    pub fail_north_of: f64,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self {
            database: RadDatabase::PvgisSarah2,
            fail_north_of: 90.0,
        }
    }
}

#[async_trait]
impl WeatherSource for SyntheticSource {
    async fn fetch_tmy(&self, location: GeoPoint) -> Result<WeatherSeries, WeatherError> {
        // Earlier-registered (southern) systems answer last
        let delay_ms = (70.0 - location.latitude).clamp(0.0, 20.0) as u64 * 5;
        tokio::time::sleep(StdDuration::from_millis(delay_ms)).await;

        if location.latitude > self.fail_north_of {
            return Err(WeatherError::Status {
                database: self.database,
                status: 400,
                body: "Location over the sea".to_string(),
            });
        }
        Ok(WeatherSeries::try_new(self.database, tmy_records(850.0))?)
    }
}
