//! # Energy Yield Simulation
//!
//! Hourly physical simulation of a floating PV system over a typical
//! meteorological year.
//!
//! ## Components
//!
//! - **Solar**: NOAA solar position (zenith, apparent zenith, azimuth)
//! - **Irradiance**: plane-of-array irradiance, horizontal or isotropic transposition
//! - **Module**: module temperature, temperature factor, IAM and module efficiency
//! - **System**: soiling-adjusted system performance ratio
//! - **Power**: power output, rated power cap, hourly energy and aggregates
//! - **Pipeline**: runs all of the above for one [`PvSystem`](crate::domain::PvSystem)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fpv_simulation::domain::{ModuleParameters, PvSystem, WeatherSeries};
//! use fpv_simulation::simulation::PowerModel;
//!
//! # fn run(weather: WeatherSeries) -> Result<(), fpv_simulation::simulation::SimulationError> {
//! let mut system = PvSystem::new(59.91, 10.75, 0.2, Some(20.0))?;
//! let simulation = system.simulate(&ModuleParameters::default(), &weather, &PowerModel::default())?;
//! system.commit(&simulation);
//!
//! let annual_kwh = simulation.annual_energy_yield();
//! let monthly = simulation.monthly_aggregates();
//! # Ok(())
//! # }
//! ```

pub mod irradiance;
pub mod module;
pub mod pipeline;
pub mod power;
pub mod solar;
pub mod system;

pub use irradiance::{plane_of_array, PoaRecord, PoaSeries};
pub use module::ModulePerformance;
pub use pipeline::{SimulationRow, SystemSimulation};
pub use power::{MonthlyAggregate, PowerModel, DEFAULT_AREA_SCALE_M2};
pub use solar::{solar_position, SolarPosition};
pub use system::SystemPerformance;

use thiserror::Error;

use crate::domain::{ParameterError, SystemError, TimeSeriesError};
use crate::weather::WeatherError;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid module parameters: {0}")]
    InvalidParameters(#[from] ParameterError),

    #[error("Invalid system: {0}")]
    InvalidSystem(#[from] SystemError),

    #[error("Area scale must be positive and finite, got {0} m² per area unit")]
    InvalidModel(f64),

    #[error("Invalid time series: {0}")]
    TimeSeries(#[from] TimeSeriesError),

    #[error("Weather retrieval failed: {0}")]
    Weather(#[from] WeatherError),
}
