//! # Power & Energy
//!
//! Converts irradiance and performance ratio into power, applies the rated
//! power cap, derives hourly energy and aggregates it per year and month.
//!
//! ## Area convention
//!
//! System areas are stored in the unit used by the registration data. Power is
//! computed as `power density (W/m²) × area × area_scale_m2`, where
//! `area_scale_m2` is the number of square metres per stored area unit. The
//! same factor is used everywhere power is derived from area, so a cap rescale
//! of the power series and of the stored area stay consistent.
//!
//! ## Power cap
//!
//! The cap is a pure function: it returns the adjusted area and the scaled
//! power series, and the caller decides whether to commit the new area to the
//! system. Once committed, re-running the simulation reaches the cap exactly
//! and no further rescale occurs.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::SimulationError;
use crate::domain::{TimeSeriesError, WATTS_PER_KW};

/// Default square metres per stored area unit
pub const DEFAULT_AREA_SCALE_M2: f64 = 1_000.0;

/// Power model settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerModel {
    /// Square metres per unit of `PvSystem::system_area`
    pub area_scale_m2: f64,
}

impl Default for PowerModel {
    fn default() -> Self {
        Self {
            area_scale_m2: DEFAULT_AREA_SCALE_M2,
        }
    }
}

/// Result of applying the rated power cap
#[derive(Debug, Clone, PartialEq)]
pub struct PowerCapOutcome {
    /// System area after the cap (unchanged when no rescale happened)
    pub system_area: f64,
    /// Power series (W) after the cap
    pub power_w: Vec<f64>,
    /// Scale factor applied, `None` when the peak did not exceed the cap
    pub scale: Option<f64>,
}

/// Power profile of one simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct PowerProfile {
    /// Power output per square metre (W/m²)
    pub power_density_w_m2: Vec<f64>,
    /// Power output (W), after the cap
    pub power_w: Vec<f64>,
    /// Energy per hourly row (kWh)
    pub energy_yield_kwh: Vec<f64>,
    /// System area after the cap
    pub system_area: f64,
    /// Cap scale factor, if a rescale happened
    pub cap_scale: Option<f64>,
}

impl PowerModel {
    pub fn new(area_scale_m2: f64) -> Self {
        Self { area_scale_m2 }
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.area_scale_m2.is_finite() && self.area_scale_m2 > 0.0 {
            Ok(())
        } else {
            Err(SimulationError::InvalidModel(self.area_scale_m2))
        }
    }

    /// Full power and energy profile for a system
    pub fn profile(
        &self,
        poa_global: &[f64],
        performance_ratio: &[f64],
        system_area: f64,
        max_power_w: Option<f64>,
    ) -> Result<PowerProfile, TimeSeriesError> {
        let power_density_w_m2 = power_density(poa_global, performance_ratio)?;
        let raw = raw_power(&power_density_w_m2, system_area, self.area_scale_m2);
        let capped = apply_power_cap(raw, system_area, max_power_w);
        let energy_yield_kwh = hourly_energy_kwh(&capped.power_w);

        Ok(PowerProfile {
            power_density_w_m2,
            power_w: capped.power_w,
            energy_yield_kwh,
            system_area: capped.system_area,
            cap_scale: capped.scale,
        })
    }
}

/// Power density (W/m²) = POA irradiance × performance ratio
pub fn power_density(
    poa_global: &[f64],
    performance_ratio: &[f64],
) -> Result<Vec<f64>, TimeSeriesError> {
    if poa_global.len() != performance_ratio.len() {
        return Err(TimeSeriesError::LengthMismatch {
            expected: poa_global.len(),
            actual: performance_ratio.len(),
        });
    }
    Ok(poa_global
        .iter()
        .zip(performance_ratio)
        .map(|(g, pr)| g * pr)
        .collect())
}

/// Raw power (W) before the cap
pub fn raw_power(power_density_w_m2: &[f64], system_area: f64, area_scale_m2: f64) -> Vec<f64> {
    let area_m2 = system_area * area_scale_m2;
    power_density_w_m2.iter().map(|p| p * area_m2).collect()
}

/// Scale power and area down so that peak power equals the cap
pub fn apply_power_cap(
    mut power_w: Vec<f64>,
    system_area: f64,
    max_power_w: Option<f64>,
) -> PowerCapOutcome {
    let Some(cap) = max_power_w else {
        return PowerCapOutcome {
            system_area,
            power_w,
            scale: None,
        };
    };

    let peak = power_w.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if peak > cap {
        let scale = cap / peak;
        power_w.iter_mut().for_each(|p| *p *= scale);
        PowerCapOutcome {
            system_area: system_area * scale,
            power_w,
            scale: Some(scale),
        }
    } else {
        PowerCapOutcome {
            system_area,
            power_w,
            scale: None,
        }
    }
}

/// Energy per hourly row (kWh); rows must be one hour long
pub fn hourly_energy_kwh(power_w: &[f64]) -> Vec<f64> {
    power_w.iter().map(|p| p / WATTS_PER_KW).collect()
}

/// Hourly power and energy, the input of the aggregations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyYield {
    pub timestamp: DateTime<Utc>,
    pub power_w: f64,
    pub energy_yield_kwh: f64,
}

/// Monthly aggregate of hourly yields
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    /// Calendar month (1-12)
    pub month: u32,
    #[serde(rename = "energy_yield_kWh_sum")]
    pub energy_yield_kwh_sum: f64,
    /// Largest single-hour energy yield
    #[serde(rename = "energy_yield_kWh_max")]
    pub energy_yield_kwh_max: f64,
    #[serde(rename = "Power_out_W_max")]
    pub power_w_max: f64,
    /// Mean over the month's days of each day's peak power
    #[serde(rename = "Power_out_W_avg_Ppeak")]
    pub power_w_avg_daily_peak: f64,
}

/// Annual energy yield (kWh)
pub fn annual_energy_yield(hourly: &[HourlyYield]) -> f64 {
    hourly.iter().map(|h| h.energy_yield_kwh).sum()
}

/// Monthly aggregates in ascending month order, for months present in `hourly`
pub fn monthly_aggregates(hourly: &[HourlyYield]) -> Vec<MonthlyAggregate> {
    struct Acc {
        sum: f64,
        max_energy: f64,
        max_power: f64,
    }

    let mut months: BTreeMap<u32, Acc> = BTreeMap::new();
    let mut daily_peaks: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for h in hourly {
        let acc = months.entry(h.timestamp.month()).or_insert(Acc {
            sum: 0.0,
            max_energy: f64::NEG_INFINITY,
            max_power: f64::NEG_INFINITY,
        });
        acc.sum += h.energy_yield_kwh;
        acc.max_energy = acc.max_energy.max(h.energy_yield_kwh);
        acc.max_power = acc.max_power.max(h.power_w);

        daily_peaks
            .entry(h.timestamp.date_naive())
            .and_modify(|peak| *peak = peak.max(h.power_w))
            .or_insert(h.power_w);
    }

    let mut peak_means: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for (date, peak) in &daily_peaks {
        let entry = peak_means.entry(date.month()).or_insert((0.0, 0));
        entry.0 += peak;
        entry.1 += 1;
    }

    months
        .into_iter()
        .map(|(month, acc)| {
            let (peak_sum, days) = peak_means.get(&month).copied().unwrap_or((0.0, 0));
            MonthlyAggregate {
                month,
                energy_yield_kwh_sum: acc.sum,
                energy_yield_kwh_max: acc.max_energy,
                power_w_max: acc.max_power,
                power_w_avg_daily_peak: if days > 0 {
                    peak_sum / days as f64
                } else {
                    0.0
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn hourly(start: DateTime<Utc>, power: &[f64]) -> Vec<HourlyYield> {
        power
            .iter()
            .enumerate()
            .map(|(i, p)| HourlyYield {
                timestamp: start + Duration::hours(i as i64),
                power_w: *p,
                energy_yield_kwh: p / 1000.0,
            })
            .collect()
    }

    #[test]
    fn test_single_hour_uncapped_scenario() {
        let model = PowerModel::default();
        let profile = model.profile(&[1000.0], &[0.15], 1.0, None).unwrap();

        assert!((profile.power_density_w_m2[0] - 150.0).abs() < 1e-9);
        assert!((profile.power_w[0] - 150_000.0).abs() < 1e-6);
        assert!((profile.energy_yield_kwh[0] - 150.0).abs() < 1e-9);
        assert_eq!(profile.system_area, 1.0);
        assert_eq!(profile.cap_scale, None);
    }

    #[test]
    fn test_single_hour_capped_scenario() {
        let model = PowerModel::default();
        let profile = model
            .profile(&[1000.0], &[0.15], 1.0, Some(0.05 * 1_000_000.0))
            .unwrap();

        let scale = profile.cap_scale.unwrap();
        assert!((scale - 1.0 / 3.0).abs() < 1e-12);
        assert!((profile.system_area - 1.0 / 3.0).abs() < 1e-12);
        assert!((profile.power_w[0] - 50_000.0).abs() < 1e-6);
        assert!((profile.energy_yield_kwh[0] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_cap_not_exceeded_leaves_everything() {
        let outcome = apply_power_cap(vec![10.0, 40.0, 20.0], 2.0, Some(50.0));
        assert_eq!(outcome.scale, None);
        assert_eq!(outcome.system_area, 2.0);
        assert_eq!(outcome.power_w, vec![10.0, 40.0, 20.0]);
    }

    #[test]
    fn test_cap_scales_every_timestep() {
        let outcome = apply_power_cap(vec![10.0, 100.0, 50.0], 4.0, Some(50.0));
        assert_eq!(outcome.scale, Some(0.5));
        assert_eq!(outcome.system_area, 2.0);
        assert_eq!(outcome.power_w, vec![5.0, 50.0, 25.0]);
    }

    #[test]
    fn test_cap_is_idempotent_after_commit() {
        let model = PowerModel::default();
        let poa = [0.0, 400.0, 950.0, 700.0];
        let pr = [0.0, 0.14, 0.15, 0.145];
        let cap = Some(80_000.0);

        let first = model.profile(&poa, &pr, 1.0, cap).unwrap();
        assert!(first.cap_scale.is_some());
        let peak = first.power_w.iter().copied().fold(f64::MIN, f64::max);
        assert!(peak <= 80_000.0 * (1.0 + 1e-12));

        // Second run with the committed area
        let second = model.profile(&poa, &pr, first.system_area, cap).unwrap();
        assert!(second.cap_scale.map_or(true, |s| (s - 1.0).abs() < 1e-12));
        assert!((second.system_area - first.system_area).abs() < 1e-12);
        let peak = second.power_w.iter().copied().fold(f64::MIN, f64::max);
        assert!(peak <= 80_000.0 * (1.0 + 1e-12));
    }

    #[test]
    fn test_area_scale_must_be_positive() {
        assert!(PowerModel::default().validate().is_ok());
        for scale in [0.0, -1000.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                PowerModel::new(scale).validate(),
                Err(SimulationError::InvalidModel(_))
            ));
        }
    }

    #[test]
    fn test_length_mismatch() {
        let err = power_density(&[1.0, 2.0], &[0.1]).unwrap_err();
        assert_eq!(
            err,
            TimeSeriesError::LengthMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_monthly_aggregates() {
        // Two days at the end of January and one day in February
        let start = Utc.with_ymd_and_hms(2019, 1, 30, 0, 0, 0).unwrap();
        let mut power = vec![0.0; 72];
        power[12] = 1000.0; // Jan 30
        power[13] = 3000.0;
        power[36] = 2000.0; // Jan 31
        power[60] = 5000.0; // Feb 1
        let rows = hourly(start, &power);

        let monthly = monthly_aggregates(&rows);
        assert_eq!(monthly.len(), 2);

        let jan = monthly[0];
        assert_eq!(jan.month, 1);
        assert!((jan.energy_yield_kwh_sum - 6.0).abs() < 1e-12);
        assert_eq!(jan.energy_yield_kwh_max, 3.0);
        assert_eq!(jan.power_w_max, 3000.0);
        assert!((jan.power_w_avg_daily_peak - 2500.0).abs() < 1e-12);

        let feb = monthly[1];
        assert_eq!(feb.month, 2);
        assert_eq!(feb.energy_yield_kwh_sum, 5.0);
        assert_eq!(feb.power_w_avg_daily_peak, 5000.0);
    }

    #[test]
    fn test_annual_equals_sum_of_months() {
        let start = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        let power: Vec<f64> = (0..8760)
            .map(|h| ((h % 24) as f64 - 12.0).abs().mul_add(-900.0, 10_000.0).max(0.0))
            .collect();
        let rows = hourly(start, &power);

        let annual = annual_energy_yield(&rows);
        let monthly: f64 = monthly_aggregates(&rows)
            .iter()
            .map(|m| m.energy_yield_kwh_sum)
            .sum();
        assert_eq!(monthly_aggregates(&rows).len(), 12);
        assert!((annual - monthly).abs() < 1e-6 * annual.max(1.0));
    }

    #[test]
    fn test_monthly_serialized_names() {
        let start = Utc.with_ymd_and_hms(2019, 5, 1, 0, 0, 0).unwrap();
        let json = serde_json::to_value(monthly_aggregates(&hourly(start, &[1.0]))[0]).unwrap();
        for key in [
            "month",
            "energy_yield_kWh_sum",
            "energy_yield_kWh_max",
            "Power_out_W_max",
            "Power_out_W_avg_Ppeak",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    proptest! {
        #[test]
        fn prop_power_linear_in_area(
            density in proptest::collection::vec(0.0f64..300.0, 1..48),
            area in 0.001f64..10.0,
        ) {
            let single = raw_power(&density, area, DEFAULT_AREA_SCALE_M2);
            let double = raw_power(&density, 2.0 * area, DEFAULT_AREA_SCALE_M2);
            for (s, d) in single.iter().zip(&double) {
                prop_assert!((d - 2.0 * s).abs() <= 1e-9 * d.abs().max(1.0));
            }
        }
    }
}
