//! Hourly meteorological time series
//!
//! Rows are one hour apart. Typical meteorological year (TMY) data splices
//! whole months taken from different source years, so the only other step
//! accepted is a jump to the start of the following calendar month in a
//! different year.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RadDatabase;

/// Rows in a regular year
pub const HOURS_PER_YEAR: usize = 8760;

/// Rows in a leap-aligned year
pub const HOURS_PER_LEAP_YEAR: usize = 8784;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimeSeriesError {
    #[error("Empty time series")]
    Empty,

    #[error("Time series is not hourly at row {index}: {previous} -> {current}")]
    Discontinuity {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("Expected a full year of hourly rows (8760 or 8784), got {rows}")]
    IncompleteYear { rows: usize },

    #[error("Column length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// One hour of weather and irradiance data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// Start of the hour (UTC)
    pub timestamp: DateTime<Utc>,
    /// Global horizontal irradiance (W/m²)
    #[serde(rename = "G(h)")]
    pub ghi: f64,
    /// Direct normal irradiance (W/m²)
    #[serde(rename = "Gb(n)")]
    pub dni: f64,
    /// Diffuse horizontal irradiance (W/m²)
    #[serde(rename = "Gd(h)")]
    pub dhi: f64,
    /// Air temperature at 2 m (°C)
    #[serde(rename = "T2m")]
    pub temp_air_c: f64,
    /// Wind speed at 10 m (m/s)
    #[serde(rename = "WS10m")]
    pub wind_speed_ms: f64,
}

/// Validated hourly weather series together with its source database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSeries {
    database: RadDatabase,
    records: Vec<WeatherRecord>,
}

impl WeatherSeries {
    pub fn try_new(
        database: RadDatabase,
        records: Vec<WeatherRecord>,
    ) -> Result<Self, TimeSeriesError> {
        validate_hourly(records.iter().map(|r| r.timestamp))?;
        Ok(Self { database, records })
    }

    pub fn database(&self) -> RadDatabase {
        self.database
    }

    pub fn records(&self) -> &[WeatherRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full_year(&self) -> bool {
        matches!(self.records.len(), HOURS_PER_YEAR | HOURS_PER_LEAP_YEAR)
    }

    pub fn ensure_full_year(&self) -> Result<(), TimeSeriesError> {
        if self.is_full_year() {
            Ok(())
        } else {
            Err(TimeSeriesError::IncompleteYear {
                rows: self.records.len(),
            })
        }
    }
}

/// Check that timestamps advance one hour at a time.
///
/// A TMY month splice is accepted: the row following the last hour of a month
/// may come from another year as long as it is 00:00 on the first day of the
/// next calendar month.
pub fn validate_hourly<I>(timestamps: I) -> Result<(), TimeSeriesError>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut iter = timestamps.into_iter();
    let mut previous = iter.next().ok_or(TimeSeriesError::Empty)?;

    for (offset, current) in iter.enumerate() {
        let expected = previous + Duration::hours(1);
        if current != expected && !is_month_splice(expected, current) {
            return Err(TimeSeriesError::Discontinuity {
                index: offset + 1,
                previous,
                current,
            });
        }
        previous = current;
    }
    Ok(())
}

fn is_month_splice(expected: DateTime<Utc>, current: DateTime<Utc>) -> bool {
    let month_start = |t: DateTime<Utc>| {
        t.day() == 1 && t.hour() == 0 && t.minute() == 0 && t.second() == 0
    };
    month_start(expected) && month_start(current) && expected.month() == current.month()
}
