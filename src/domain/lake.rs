use serde::{Deserialize, Serialize};
use std::fmt;

use super::{PvSystem, SystemError};

/// Lake with the floating PV systems registered on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lake {
    pub lake_id: String,
    /// Lake area (km²)
    pub lake_area: f64,
    /// Systems in registration order; never removed
    pub systems: Vec<PvSystem>,
    /// Sum of system areas at registration time
    pub covered_area: f64,
}

impl Lake {
    pub fn new(lake_id: impl Into<String>, lake_area: f64) -> Self {
        Self {
            lake_id: lake_id.into(),
            lake_area,
            systems: Vec::new(),
            covered_area: 0.0,
        }
    }

    /// Register a new system on the lake and return its index
    pub fn register_system(
        &mut self,
        latitude: f64,
        longitude: f64,
        system_area: f64,
        max_power_mw: Option<f64>,
    ) -> Result<usize, SystemError> {
        let system = PvSystem::new(latitude, longitude, system_area, max_power_mw)?;
        Ok(self.add_system(system))
    }

    /// Add an already validated system, returning its index
    pub fn add_system(&mut self, system: PvSystem) -> usize {
        self.covered_area += system.system_area;
        self.systems.push(system);
        self.systems.len() - 1
    }

    /// Covered share of the lake surface (%)
    pub fn covered_percent(&self) -> f64 {
        if self.lake_area > 0.0 {
            self.covered_area / self.lake_area * 100.0
        } else {
            0.0
        }
    }
}

impl fmt::Display for Lake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lake {} - Area: {} km2, Number of systems: {}, Covered Area: {:.2}%",
            self.lake_id,
            self.lake_area,
            self.systems.len(),
            self.covered_percent()
        )
    }
}
