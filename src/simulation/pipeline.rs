//! # Per-System Simulation Pipeline
//!
//! Runs weather → POA → module → system performance → power for one
//! [`PvSystem`] and returns the full hourly frame. Running is side-effect
//! free; [`PvSystem::commit`] applies the outcome (cap-adjusted area and the
//! serving radiation database) to the system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::irradiance::{plane_of_array, PoaRecord};
use super::power::{self, HourlyYield, MonthlyAggregate, PowerModel};
use super::system::{system_performance, SystemPerformance};
use super::SimulationError;
use crate::domain::{ModuleParameters, PvSystem, RadDatabase, WeatherSeries};
use crate::soiling::SoilingTable;
use crate::weather::WeatherSource;

/// One hour of the simulation frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationRow {
    #[serde(flatten)]
    pub poa: PoaRecord,
    #[serde(flatten)]
    pub performance: SystemPerformance,
    #[serde(rename = "Power_out_W/m2")]
    pub power_density_w_m2: f64,
    #[serde(rename = "Power_out_W")]
    pub power_w: f64,
    #[serde(rename = "energy_yield_kWh")]
    pub energy_yield_kwh: f64,
    pub raddatabase: RadDatabase,
}

impl SimulationRow {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.poa.timestamp
    }
}

/// Outcome of simulating one system over one weather series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSimulation {
    pub rows: Vec<SimulationRow>,
    /// System area after the power cap
    pub system_area: f64,
    /// Cap scale factor, `None` when the cap was not exceeded or not set
    pub cap_scale: Option<f64>,
    pub database: RadDatabase,
}

impl SystemSimulation {
    pub fn hourly(&self) -> Vec<HourlyYield> {
        self.rows
            .iter()
            .map(|r| HourlyYield {
                timestamp: r.timestamp(),
                power_w: r.power_w,
                energy_yield_kwh: r.energy_yield_kwh,
            })
            .collect()
    }

    pub fn annual_energy_yield(&self) -> f64 {
        power::annual_energy_yield(&self.hourly())
    }

    pub fn monthly_aggregates(&self) -> Vec<MonthlyAggregate> {
        power::monthly_aggregates(&self.hourly())
    }

    pub fn peak_power_w(&self) -> f64 {
        self.rows
            .iter()
            .map(|r| r.power_w)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

impl PvSystem {
    /// Simulate this system with the NS 3031 soiling table
    pub fn simulate(
        &self,
        params: &ModuleParameters,
        weather: &WeatherSeries,
        model: &PowerModel,
    ) -> Result<SystemSimulation, SimulationError> {
        self.simulate_with_soiling(params, weather, model, SoilingTable::ns3031())
    }

    pub fn simulate_with_soiling(
        &self,
        params: &ModuleParameters,
        weather: &WeatherSeries,
        model: &PowerModel,
        soiling: &SoilingTable,
    ) -> Result<SystemSimulation, SimulationError> {
        self.validate()?;
        params.validate()?;
        model.validate()?;

        let location = self.location();
        let poa = plane_of_array(location, params, weather);
        let performance = system_performance(params, location, &poa.records, soiling);
        let ratio: Vec<f64> = performance.iter().map(|p| p.performance_ratio).collect();

        let profile = model.profile(
            &poa.poa_global(),
            &ratio,
            self.system_area,
            self.max_power_w(),
        )?;

        if let Some(scale) = profile.cap_scale {
            info!(
                latitude = self.latitude,
                longitude = self.longitude,
                scale,
                previous_area = self.system_area,
                adjusted_area = profile.system_area,
                "peak power exceeds rated cap, rescaling system area"
            );
        }

        let database = weather.database();
        let rows = poa
            .records
            .into_iter()
            .zip(performance)
            .enumerate()
            .map(|(i, (poa, performance))| SimulationRow {
                poa,
                performance,
                power_density_w_m2: profile.power_density_w_m2[i],
                power_w: profile.power_w[i],
                energy_yield_kwh: profile.energy_yield_kwh[i],
                raddatabase: database,
            })
            .collect();

        Ok(SystemSimulation {
            rows,
            system_area: profile.system_area,
            cap_scale: profile.cap_scale,
            database,
        })
    }

    /// Apply a simulation outcome to this system
    pub fn commit(&mut self, simulation: &SystemSimulation) {
        self.system_area = simulation.system_area;
        self.raddatabase = Some(simulation.database);
    }

    /// Annual energy yield (kWh) over a full-year series; commits the outcome
    pub fn annual_energy_yield(
        &mut self,
        params: &ModuleParameters,
        weather: &WeatherSeries,
        model: &PowerModel,
    ) -> Result<f64, SimulationError> {
        weather.ensure_full_year()?;
        let simulation = self.simulate(params, weather, model)?;
        self.commit(&simulation);
        Ok(simulation.annual_energy_yield())
    }

    /// Monthly aggregates over a full-year series; commits the outcome
    pub fn monthly_aggregates(
        &mut self,
        params: &ModuleParameters,
        weather: &WeatherSeries,
        model: &PowerModel,
    ) -> Result<Vec<MonthlyAggregate>, SimulationError> {
        weather.ensure_full_year()?;
        let simulation = self.simulate(params, weather, model)?;
        self.commit(&simulation);
        Ok(simulation.monthly_aggregates())
    }

    /// Retrieve the TMY profile for this system and compute its annual yield
    pub async fn fetch_annual_energy_yield<S>(
        &mut self,
        source: &S,
        params: &ModuleParameters,
        model: &PowerModel,
    ) -> Result<f64, SimulationError>
    where
        S: WeatherSource + ?Sized,
    {
        self.validate()?;
        let weather = source.fetch_tmy(self.location()).await?;
        debug!(
            location = %self.location(),
            database = %weather.database(),
            rows = weather.len(),
            "weather profile retrieved"
        );
        self.annual_energy_yield(params, &weather, model)
    }
}
