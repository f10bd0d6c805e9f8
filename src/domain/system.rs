use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{GeoPoint, RadDatabase, WATTS_PER_MW};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SystemError {
    #[error("Invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("System area must be positive and finite, got {0}")]
    InvalidArea(f64),

    #[error("Rated max power must be positive and finite, got {0} MW")]
    InvalidMaxPower(f64),
}

/// Floating PV system placed on a lake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvSystem {
    pub latitude: f64,
    pub longitude: f64,
    /// Installed area; shrinks when a simulation outcome with a power cap
    /// rescale is committed
    pub system_area: f64,
    /// Rated maximum power (MW); `None` means uncapped
    pub max_power_mw: Option<f64>,
    /// Radiation database that served the last successful weather retrieval
    pub raddatabase: Option<RadDatabase>,
}

impl PvSystem {
    pub fn new(
        latitude: f64,
        longitude: f64,
        system_area: f64,
        max_power_mw: Option<f64>,
    ) -> Result<Self, SystemError> {
        let system = Self {
            latitude,
            longitude,
            system_area,
            max_power_mw,
            raddatabase: None,
        };
        system.validate()?;
        Ok(system)
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.longitude, self.latitude)
    }

    /// Rated cap in Watts, if any
    pub fn max_power_w(&self) -> Option<f64> {
        self.max_power_mw.map(|mw| mw * WATTS_PER_MW)
    }

    pub fn validate(&self) -> Result<(), SystemError> {
        if !self.location().is_valid() {
            return Err(SystemError::InvalidCoordinates {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        if !(self.system_area.is_finite() && self.system_area > 0.0) {
            return Err(SystemError::InvalidArea(self.system_area));
        }
        if let Some(mw) = self.max_power_mw {
            if !(mw.is_finite() && mw > 0.0) {
                return Err(SystemError::InvalidMaxPower(mw));
            }
        }
        Ok(())
    }
}
