//! # System Performance
//!
//! Combines module performance with monthly soiling losses and the system
//! derate factor into an overall performance ratio per timestep.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::irradiance::PoaRecord;
use super::module::{self, ModulePerformance};
use crate::domain::{GeoPoint, ModuleParameters};
use crate::soiling::SoilingTable;

/// System performance for one timestep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemPerformance {
    #[serde(flatten)]
    pub module: ModulePerformance,
    /// Soiling loss (%)
    #[serde(rename = "s_soiling")]
    pub soiling_loss_percent: f64,
    /// Overall performance ratio (unitless)
    #[serde(rename = "syst_perf")]
    pub performance_ratio: f64,
}

/// Overall performance ratio; negative module efficiency propagates unclamped
pub fn performance_ratio(
    module_efficiency_percent: f64,
    soiling_loss_percent: f64,
    system_derate_factor: f64,
) -> f64 {
    (module_efficiency_percent / 100.0) * (1.0 - soiling_loss_percent / 100.0) * system_derate_factor
}

/// Per-timestep system performance for a system at `location`
pub fn system_performance(
    params: &ModuleParameters,
    location: GeoPoint,
    poa: &[PoaRecord],
    soiling: &SoilingTable,
) -> Vec<SystemPerformance> {
    let (reference, distance) = soiling.nearest(location);
    debug!(
        municipality = %reference.municipality,
        distance_deg = distance,
        "resolved soiling reference"
    );
    let monthly_loss = reference.monthly_loss_percent;

    poa.iter()
        .map(|record| {
            let module = module::evaluate(params, record);
            let soiling_loss_percent = monthly_loss[record.timestamp.month0() as usize];
            SystemPerformance {
                module,
                soiling_loss_percent,
                performance_ratio: performance_ratio(
                    module.module_efficiency_percent,
                    soiling_loss_percent,
                    params.system_derate_factor,
                ),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soiling::SoilingReference;
    use chrono::{TimeZone, Utc};

    fn poa_at(month: u32, poa_global: f64, temp_air_c: f64) -> PoaRecord {
        PoaRecord {
            timestamp: Utc.with_ymd_and_hms(2019, month, 10, 12, 0, 0).unwrap(),
            poa_global,
            temp_air_c,
            wind_speed_ms: 1.0,
            aoi_deg: 0.0,
        }
    }

    fn table() -> SoilingTable {
        let mut monthly = [0.0; 12];
        for (i, m) in monthly.iter_mut().enumerate() {
            *m = (i + 1) as f64 * 5.0;
        }
        SoilingTable::from_references(vec![SoilingReference {
            municipality: "test".to_string(),
            location: GeoPoint::new(10.0, 60.0),
            monthly_loss_percent: monthly,
        }])
        .unwrap()
    }

    #[test]
    fn test_performance_ratio() {
        let pr = performance_ratio(19.0, 2.0, 0.837);
        assert!((pr - 0.19 * 0.98 * 0.837).abs() < 1e-12);
        assert_eq!(performance_ratio(19.0, 100.0, 0.837), 0.0);
    }

    #[test]
    fn test_negative_efficiency_propagates() {
        assert!(performance_ratio(-3.0, 10.0, 0.9) < 0.0);
    }

    #[test]
    fn test_soiling_applied_by_calendar_month() {
        let params = ModuleParameters::default();
        let poa = [poa_at(1, 500.0, 0.0), poa_at(7, 500.0, 0.0), poa_at(12, 500.0, 0.0)];
        let perf = system_performance(&params, GeoPoint::new(10.1, 60.1), &poa, &table());

        assert_eq!(perf[0].soiling_loss_percent, 5.0);
        assert_eq!(perf[1].soiling_loss_percent, 35.0);
        assert_eq!(perf[2].soiling_loss_percent, 60.0);

        for p in &perf {
            let expected = performance_ratio(
                p.module.module_efficiency_percent,
                p.soiling_loss_percent,
                params.system_derate_factor,
            );
            assert_eq!(p.performance_ratio, expected);
        }
    }

    #[test]
    fn test_ns3031_oslo_january() {
        let params = ModuleParameters::default();
        let poa = [poa_at(1, 300.0, -5.0)];
        let perf = system_performance(
            &params,
            GeoPoint::new(10.75, 59.91),
            &poa,
            SoilingTable::ns3031(),
        );
        assert_eq!(perf[0].soiling_loss_percent, 60.0);
    }

    #[test]
    fn test_serialized_columns_are_flat() {
        let params = ModuleParameters::default();
        let perf = system_performance(&params, GeoPoint::new(10.0, 60.0), &[poa_at(3, 1.0, 1.0)], &table());
        let json = serde_json::to_value(perf[0]).unwrap();
        assert!(json.get("module_efficiency").is_some());
        assert!(json.get("s_soiling").is_some());
        assert!(json.get("syst_perf").is_some());
    }
}
