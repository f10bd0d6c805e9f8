use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs::{create_dir_all, read_to_string, remove_file, rename, write};
use tracing::{debug, warn};

use super::{WeatherError, WeatherSource};
use crate::domain::{validate_hourly, GeoPoint, WeatherSeries};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Weather source that keeps TMY profiles as JSON files keyed by location
pub struct CachedWeatherSource<S> {
    inner: S,
    cache_dir: PathBuf,
}

impl<S> CachedWeatherSource<S> {
    pub fn new(inner: S, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: WeatherSource> WeatherSource for CachedWeatherSource<S> {
    async fn fetch_tmy(&self, location: GeoPoint) -> Result<WeatherSeries, WeatherError> {
        if let Some(series) = read_cache_data(&self.cache_dir, location).await? {
            debug!(%location, database = %series.database(), "TMY cache hit");
            return Ok(series);
        }

        let series = self.inner.fetch_tmy(location).await?;
        if let Err(e) = store_cache_data(&self.cache_dir, location, &series).await {
            warn!(%location, error = %e, "failed to write TMY cache");
        }
        Ok(series)
    }
}

/// Cache file for a location, coordinates rounded to 1e-6 degrees
pub fn cache_path(cache_dir: &Path, location: GeoPoint) -> PathBuf {
    cache_dir.join(format!(
        "tmy_{:.6}_{:.6}.json",
        location.latitude, location.longitude
    ))
}

/// Writes a TMY profile to the cache directory
pub async fn store_cache_data(
    cache_dir: &Path,
    location: GeoPoint,
    series: &WeatherSeries,
) -> Result<(), WeatherError> {
    create_dir_all(cache_dir).await?;
    let json = serde_json::to_string(series)?;

    // Readers only ever see a complete file
    let path = cache_path(cache_dir, location);
    let temp = cache_dir.join(format!(
        ".tmy-{}-{}.tmp",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    write(&temp, json).await?;
    if let Err(e) = rename(&temp, &path).await {
        let _ = remove_file(&temp).await;
        return Err(e.into());
    }
    Ok(())
}

/// Tries to read a TMY profile from the cache directory
///
/// A file that does not parse as an hourly profile is treated as a miss and
/// removed so the next fetch rewrites it.
pub async fn read_cache_data(
    cache_dir: &Path,
    location: GeoPoint,
) -> Result<Option<WeatherSeries>, WeatherError> {
    let path = cache_path(cache_dir, location);
    let json = match read_to_string(&path).await {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let parsed = serde_json::from_str::<WeatherSeries>(&json)
        .map_err(WeatherError::from)
        .and_then(|series| {
            validate_hourly(series.records().iter().map(|r| r.timestamp))?;
            Ok(series)
        });

    match parsed {
        Ok(series) => Ok(Some(series)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "discarding unreadable TMY cache file");
            if let Err(e) = remove_file(&path).await {
                debug!(path = %path.display(), error = %e, "failed to remove TMY cache file");
            }
            Ok(None)
        }
    }
}
