//! # Solar Position
//!
//! NOAA general solar position equations (fractional-year series for the
//! equation of time and declination), evaluated in UTC. Accuracy is a small
//! fraction of a degree, which is sufficient for hourly energy yield.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Sun position for one instant and location (all angles in degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarPosition {
    /// Geometric zenith angle
    pub zenith_deg: f64,
    /// Zenith angle corrected for atmospheric refraction
    pub apparent_zenith_deg: f64,
    /// Azimuth clockwise from north (180 = south)
    pub azimuth_deg: f64,
}

impl SolarPosition {
    /// Elevation above the horizon, uncorrected
    pub fn elevation_deg(&self) -> f64 {
        90.0 - self.zenith_deg
    }

    pub fn is_above_horizon(&self) -> bool {
        self.apparent_zenith_deg < 90.0
    }
}

/// Solar position at `time` for a site at `latitude_deg`, `longitude_deg`
pub fn solar_position(latitude_deg: f64, longitude_deg: f64, time: DateTime<Utc>) -> SolarPosition {
    let days_in_year = if is_leap_year(time.year()) { 366.0 } else { 365.0 };
    let hour = time.hour() as f64 + time.minute() as f64 / 60.0 + time.second() as f64 / 3600.0;

    // Fractional year (radians)
    let gamma = 2.0 * PI / days_in_year * (time.ordinal() as f64 - 1.0 + (hour - 12.0) / 24.0);

    // Equation of time (minutes)
    let eqtime = 229.18
        * (0.000075 + 0.001868 * gamma.cos()
            - 0.032077 * gamma.sin()
            - 0.014615 * (2.0 * gamma).cos()
            - 0.040849 * (2.0 * gamma).sin());

    // Declination (radians)
    let decl = 0.006918 - 0.399912 * gamma.cos() + 0.070257 * gamma.sin()
        - 0.006758 * (2.0 * gamma).cos()
        + 0.000907 * (2.0 * gamma).sin()
        - 0.002697 * (3.0 * gamma).cos()
        + 0.00148 * (3.0 * gamma).sin();

    // True solar time (minutes) and hour angle
    let true_solar_time = hour * 60.0 + eqtime + 4.0 * longitude_deg;
    let hour_angle = (true_solar_time / 4.0 - 180.0).to_radians();

    let lat = latitude_deg.to_radians();
    let cos_zenith = (lat.sin() * decl.sin() + lat.cos() * decl.cos() * hour_angle.cos())
        .clamp(-1.0, 1.0);
    let zenith_deg = cos_zenith.acos().to_degrees();

    // Azimuth from south (west positive), shifted to clockwise from north
    let azimuth_from_south = hour_angle
        .sin()
        .atan2(hour_angle.cos() * lat.sin() - decl.tan() * lat.cos());
    let azimuth_deg = (azimuth_from_south.to_degrees() + 180.0).rem_euclid(360.0);

    let apparent_zenith_deg = zenith_deg - refraction_deg(90.0 - zenith_deg);

    SolarPosition {
        zenith_deg,
        apparent_zenith_deg,
        azimuth_deg,
    }
}

/// Approximate atmospheric refraction (degrees) for a given true elevation
fn refraction_deg(elevation_deg: f64) -> f64 {
    if elevation_deg > 85.0 {
        return 0.0;
    }
    let te = elevation_deg.to_radians().tan();
    let arcsec = if elevation_deg > 5.0 {
        58.1 / te - 0.07 / te.powi(3) + 0.000086 / te.powi(5)
    } else if elevation_deg > -0.575 {
        1735.0
            + elevation_deg
                * (-518.2 + elevation_deg * (103.4 + elevation_deg * (-12.79 + elevation_deg * 0.711)))
    } else {
        -20.772 / te
    };
    arcsec / 3600.0
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_solar_noon_summer_solstice_oslo() {
        // Solar noon in Oslo is around 11:17 UTC; maximum elevation ~53.5°
        let time = Utc.with_ymd_and_hms(2019, 6, 21, 11, 17, 0).unwrap();
        let pos = solar_position(59.91, 10.75, time);

        assert!((pos.elevation_deg() - 53.5).abs() < 0.5, "{pos:?}");
        assert!((pos.azimuth_deg - 180.0).abs() < 3.0, "{pos:?}");
        assert!(pos.is_above_horizon());
    }

    #[test]
    fn test_winter_midnight_below_horizon() {
        let time = Utc.with_ymd_and_hms(2019, 12, 21, 0, 0, 0).unwrap();
        let pos = solar_position(59.91, 10.75, time);
        assert!(pos.zenith_deg > 90.0);
        assert!(!pos.is_above_horizon());
    }

    #[test]
    fn test_morning_east_afternoon_west() {
        let morning = solar_position(59.91, 10.75, Utc.with_ymd_and_hms(2019, 6, 21, 6, 0, 0).unwrap());
        let evening = solar_position(59.91, 10.75, Utc.with_ymd_and_hms(2019, 6, 21, 16, 0, 0).unwrap());
        assert!(morning.azimuth_deg > 45.0 && morning.azimuth_deg < 135.0, "{morning:?}");
        assert!(evening.azimuth_deg > 225.0 && evening.azimuth_deg < 315.0, "{evening:?}");
    }

    #[test]
    fn test_refraction_lifts_sun_near_horizon() {
        assert!(refraction_deg(0.0) > 0.4 && refraction_deg(0.0) < 0.6);
        assert!(refraction_deg(45.0) < 0.02);
        assert_eq!(refraction_deg(89.0), 0.0);
    }

    #[test]
    fn test_equinox_noon_at_equator_overhead() {
        // Near the March equinox the sun passes close to the zenith at the equator
        let time = Utc.with_ymd_and_hms(2019, 3, 20, 12, 7, 0).unwrap();
        let pos = solar_position(0.0, 0.0, time);
        assert!(pos.zenith_deg < 2.0, "{pos:?}");
    }
}
