//! # Lake Portfolio
//!
//! Bookkeeping for many floating PV systems spread over lakes, and the batch
//! runner that computes their annual energy yield.
//!
//! Systems are simulated concurrently through an order-preserving bounded
//! stream, so the result table follows lake insertion order and then system
//! registration order regardless of which retrieval finishes first. A failing
//! system is reported in [`PortfolioReport::failures`] and does not stop the
//! others.

use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{
    Lake, ModuleParameters, ParameterError, ParameterOverrides, PvSystem, RadDatabase,
    SystemError,
};
use crate::simulation::PowerModel;
use crate::weather::WeatherSource;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Registration row {row} (lake {lake_id}) rejected: {source}")]
pub struct RegistrationError {
    pub row: usize,
    pub lake_id: String,
    #[source]
    pub source: SystemError,
}

/// One registration input row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRow {
    #[serde(deserialize_with = "lake_id_from_any")]
    pub lake_id: String,
    /// Lake area (km²)
    pub lake_area: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Area selected for the system
    pub selected_area: f64,
    #[serde(rename = "max_power_MW", default)]
    pub max_power_mw: Option<f64>,
}

fn lake_id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LakeKey {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match LakeKey::deserialize(deserializer)? {
        LakeKey::Text(s) => s,
        LakeKey::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
            _ => n.to_string(),
        },
    })
}

/// Annual yield of one system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemYieldRow {
    pub lake_id: String,
    pub lake_area: f64,
    /// Area after any power cap rescale
    pub system_area: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "annual_energy_yield_kWh")]
    pub annual_energy_yield_kwh: f64,
    pub raddata: Option<RadDatabase>,
}

/// System that could not be simulated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemFailure {
    pub lake_id: String,
    /// Registration index of the system on its lake
    pub system_index: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub rows: Vec<SystemYieldRow>,
    pub failures: Vec<SystemFailure>,
}

impl PortfolioReport {
    pub fn total_energy_yield_kwh(&self) -> f64 {
        self.rows.iter().map(|r| r.annual_energy_yield_kwh).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn extend(&mut self, outcomes: Vec<Result<SystemYieldRow, SystemFailure>>) {
        for outcome in outcomes {
            match outcome {
                Ok(row) => self.rows.push(row),
                Err(failure) => self.failures.push(failure),
            }
        }
    }
}

/// Runner settings for a batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    /// Systems simulated concurrently
    pub workers: usize,
    pub model: PowerModel,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            model: PowerModel::default(),
        }
    }
}

struct SystemJob<'a> {
    lake_id: &'a str,
    lake_area: f64,
    index: usize,
    system: &'a mut PvSystem,
}

impl SystemJob<'_> {
    async fn run<S>(
        self,
        source: &S,
        params: &ModuleParameters,
        model: &PowerModel,
    ) -> Result<SystemYieldRow, SystemFailure>
    where
        S: WeatherSource + ?Sized,
    {
        match self
            .system
            .fetch_annual_energy_yield(source, params, model)
            .await
        {
            Ok(annual_energy_yield_kwh) => Ok(SystemYieldRow {
                lake_id: self.lake_id.to_string(),
                lake_area: self.lake_area,
                system_area: self.system.system_area,
                latitude: self.system.latitude,
                longitude: self.system.longitude,
                annual_energy_yield_kwh,
                raddata: self.system.raddatabase,
            }),
            Err(e) => {
                warn!(
                    lake_id = self.lake_id,
                    system_index = self.index,
                    latitude = self.system.latitude,
                    longitude = self.system.longitude,
                    error = %e,
                    "system simulation failed"
                );
                Err(SystemFailure {
                    lake_id: self.lake_id.to_string(),
                    system_index: self.index,
                    latitude: self.system.latitude,
                    longitude: self.system.longitude,
                    error: e.to_string(),
                })
            }
        }
    }
}

async fn run_jobs<'a, I, S>(
    jobs: I,
    source: &S,
    params: &ModuleParameters,
    options: &RunOptions,
) -> Vec<Result<SystemYieldRow, SystemFailure>>
where
    I: Iterator<Item = SystemJob<'a>>,
    S: WeatherSource + ?Sized,
{
    stream::iter(jobs)
        .map(|job| job.run(source, params, &options.model))
        .buffered(options.workers.max(1))
        .collect()
        .await
}

impl Lake {
    /// Annual energy yield for every system on the lake, in registration order
    pub async fn annual_energy_yield<S>(
        &mut self,
        source: &S,
        params: &ModuleParameters,
        options: &RunOptions,
    ) -> PortfolioReport
    where
        S: WeatherSource + ?Sized,
    {
        let lake_id = self.lake_id.as_str();
        let lake_area = self.lake_area;
        let jobs = self
            .systems
            .iter_mut()
            .enumerate()
            .map(|(index, system)| SystemJob {
                lake_id,
                lake_area,
                index,
                system,
            });

        let mut report = PortfolioReport::default();
        report.extend(run_jobs(jobs, source, params, options).await);
        report
    }
}

/// Portfolio of lakes sharing one set of module parameters
#[derive(Debug, Clone, Default)]
pub struct FpvSimulation {
    lakes: IndexMap<String, Lake>,
    parameters: ModuleParameters,
}

impl FpvSimulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameters(&self) -> &ModuleParameters {
        &self.parameters
    }

    /// Merge `overrides` onto the current parameters; rejected overrides leave
    /// the parameters untouched
    pub fn set_parameters(&mut self, overrides: &ParameterOverrides) -> Result<(), ParameterError> {
        self.parameters = self.parameters.merged(overrides)?;
        Ok(())
    }

    pub fn lakes(&self) -> impl Iterator<Item = &Lake> {
        self.lakes.values()
    }

    pub fn lake(&self, lake_id: &str) -> Option<&Lake> {
        self.lakes.get(lake_id)
    }

    pub fn system_count(&self) -> usize {
        self.lakes.values().map(|l| l.systems.len()).sum()
    }

    /// Register rows in order. A lake is created on first sight of its id;
    /// later rows for the same id keep the first lake area.
    pub fn register_lakes<I>(&mut self, rows: I) -> Result<(), RegistrationError>
    where
        I: IntoIterator<Item = RegistrationRow>,
    {
        let validated = rows
            .into_iter()
            .enumerate()
            .map(|(row_index, row)| {
                match PvSystem::new(
                    row.latitude,
                    row.longitude,
                    row.selected_area,
                    row.max_power_mw,
                ) {
                    Ok(system) => Ok((row, system)),
                    Err(source) => Err(RegistrationError {
                        row: row_index,
                        lake_id: row.lake_id,
                        source,
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Nothing is committed unless every row is valid
        for (row, system) in validated {
            self.lakes
                .entry(row.lake_id.clone())
                .or_insert_with(|| Lake::new(row.lake_id, row.lake_area))
                .add_system(system);
        }
        Ok(())
    }

    /// Annual energy yield for every registered system
    pub async fn annual_energy_yield<S>(&mut self, source: &S, options: &RunOptions) -> PortfolioReport
    where
        S: WeatherSource + ?Sized,
    {
        let lake_count = self.lakes.len();
        let system_count = self.system_count();
        info!(lakes = lake_count, systems = system_count, workers = options.workers, "starting portfolio run");

        let jobs = self
            .lakes
            .values_mut()
            .enumerate()
            .flat_map(|(position, lake)| {
                info!(
                    lake = position + 1,
                    of = lake_count,
                    lake_id = %lake.lake_id,
                    systems = lake.systems.len(),
                    "queueing lake"
                );
                let lake_id = lake.lake_id.as_str();
                let lake_area = lake.lake_area;
                lake.systems
                    .iter_mut()
                    .enumerate()
                    .map(move |(index, system)| SystemJob {
                        lake_id,
                        lake_area,
                        index,
                        system,
                    })
            });

        let mut report = PortfolioReport::default();
        report.extend(run_jobs(jobs, source, &self.parameters, options).await);

        info!(
            succeeded = report.rows.len(),
            failed = report.failures.len(),
            total_energy_yield_kwh = report.total_energy_yield_kwh(),
            "portfolio run finished"
        );
        report
    }
}
