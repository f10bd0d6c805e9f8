//! # Module Performance Model
//!
//! Per-timestep module temperature, temperature factor, incidence angle
//! modifier (IAM) and module efficiency. Stateless; the outputs are valid model
//! values even when they go negative at extreme temperatures.

use serde::{Deserialize, Serialize};

use super::irradiance::PoaRecord;
use crate::domain::ModuleParameters;

/// Standard test condition cell temperature (°C)
pub const T_STC: f64 = 25.0;

/// Module performance for one timestep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModulePerformance {
    /// Same value as `module_efficiency_percent`; kept for result-table parity
    #[serde(rename = "temperature_eff")]
    pub temperature_eff: f64,
    /// Temperature-only efficiency factor, 1 - beta * (T_module - 25)
    pub temperature_factor: f64,
    #[serde(rename = "IAM")]
    pub iam: f64,
    /// Module temperature (°C)
    #[serde(rename = "T_module")]
    pub module_temperature_c: f64,
    /// Module efficiency (%)
    #[serde(rename = "module_efficiency")]
    pub module_efficiency_percent: f64,
}

/// Module temperature (°C) from ambient temperature and POA irradiance
pub fn module_temperature(temp_air_c: f64, poa_global: f64, heat_transfer_u: f64) -> f64 {
    temp_air_c + poa_global / heat_transfer_u
}

/// Relative efficiency change with module temperature; not clamped
pub fn temperature_factor(module_temperature_c: f64, beta: f64) -> f64 {
    1.0 - beta * (module_temperature_c - T_STC)
}

/// ASHRAE incidence angle modifier, zero from 90° and floored at zero
pub fn incidence_angle_modifier(aoi_deg: f64, b0: f64) -> f64 {
    let iam = if aoi_deg < 90.0 {
        1.0 - b0 * (1.0 / aoi_deg.to_radians().cos() - 1.0)
    } else {
        0.0
    };
    iam.max(0.0)
}

/// Evaluate the model for a single POA record
pub fn evaluate(params: &ModuleParameters, poa: &PoaRecord) -> ModulePerformance {
    let module_temperature_c =
        module_temperature(poa.temp_air_c, poa.poa_global, params.heat_transfer_u);
    let temperature_factor = temperature_factor(module_temperature_c, params.beta);
    let iam = incidence_angle_modifier(poa.aoi_deg, params.iam_b0);
    let module_efficiency_percent = params.eff_nom_percent * iam * temperature_factor;

    ModulePerformance {
        temperature_eff: module_efficiency_percent,
        temperature_factor,
        iam,
        module_temperature_c,
        module_efficiency_percent,
    }
}

/// Evaluate the model over a POA series
pub fn module_performance(params: &ModuleParameters, poa: &[PoaRecord]) -> Vec<ModulePerformance> {
    poa.iter().map(|record| evaluate(params, record)).collect()
}
