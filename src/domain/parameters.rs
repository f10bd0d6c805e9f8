//! PV module parameters
//!
//! `ModuleParameters` is the complete, validated parameter set used by one
//! simulation run. `ParameterOverrides` is a partial set that is merged on top
//! of the defaults (or of a previously merged set). Parameter keys follow the
//! names used in configuration files and result tables: `tilt`, `azimuth`,
//! `eff_nom`, `beta`, `U`, `system_derate_factor` and `b0`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All accepted parameter keys, in canonical order
pub const PARAMETER_KEYS: [&str; 7] = [
    "tilt",
    "azimuth",
    "eff_nom",
    "beta",
    "U",
    "system_derate_factor",
    "b0",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("Missing module parameter: {0}")]
    Missing(&'static str),

    #[error("Unknown module parameter: {0}")]
    Unknown(String),

    #[error("Module parameter {name} = {value} out of range ({expected})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },
}

/// Complete set of PV module parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModuleParameters {
    /// Surface tilt from horizontal in degrees (0 = horizontal, no transposition)
    #[serde(rename = "tilt")]
    pub tilt_deg: f64,

    /// Surface azimuth in degrees clockwise from north (180 = south)
    #[serde(rename = "azimuth")]
    pub azimuth_deg: f64,

    /// Nominal module efficiency (%)
    #[serde(rename = "eff_nom")]
    pub eff_nom_percent: f64,

    /// Temperature coefficient (1/°C)
    #[serde(rename = "beta")]
    pub beta: f64,

    /// Overall heat transfer coefficient (W/m²·K)
    #[serde(rename = "U")]
    pub heat_transfer_u: f64,

    /// System derate factor (unitless, 0-1)
    pub system_derate_factor: f64,

    /// Incidence angle modifier coefficient
    #[serde(rename = "b0")]
    pub iam_b0: f64,
}

impl Default for ModuleParameters {
    fn default() -> Self {
        Self {
            tilt_deg: 0.0,
            azimuth_deg: 180.0,
            eff_nom_percent: 19.0,
            beta: 0.003,
            heat_transfer_u: 46.0,
            system_derate_factor: 0.837,
            iam_b0: 0.05,
        }
    }
}

impl ModuleParameters {
    /// Returns a copy with every field present in `overrides` replaced.
    ///
    /// The merged set is validated before it is returned.
    pub fn merged(&self, overrides: &ParameterOverrides) -> Result<Self, ParameterError> {
        let merged = Self {
            tilt_deg: overrides.tilt.unwrap_or(self.tilt_deg),
            azimuth_deg: overrides.azimuth.unwrap_or(self.azimuth_deg),
            eff_nom_percent: overrides.eff_nom.unwrap_or(self.eff_nom_percent),
            beta: overrides.beta.unwrap_or(self.beta),
            heat_transfer_u: overrides.heat_transfer_u.unwrap_or(self.heat_transfer_u),
            system_derate_factor: overrides
                .system_derate_factor
                .unwrap_or(self.system_derate_factor),
            iam_b0: overrides.b0.unwrap_or(self.iam_b0),
        };
        merged.validate()?;
        Ok(merged)
    }

    /// Check that every parameter is physically meaningful
    pub fn validate(&self) -> Result<(), ParameterError> {
        check("tilt", self.tilt_deg, "0 to 90 degrees", |v| {
            (0.0..=90.0).contains(&v)
        })?;
        check("azimuth", self.azimuth_deg, "0 to 360 degrees", |v| {
            (0.0..=360.0).contains(&v)
        })?;
        check("eff_nom", self.eff_nom_percent, "greater than 0 and at most 100 %", |v| {
            v > 0.0 && v <= 100.0
        })?;
        check("beta", self.beta, "finite", f64::is_finite)?;
        check("U", self.heat_transfer_u, "greater than 0", |v| v > 0.0)?;
        check(
            "system_derate_factor",
            self.system_derate_factor,
            "greater than 0 and at most 1",
            |v| v > 0.0 && v <= 1.0,
        )?;
        check("b0", self.iam_b0, "0 or greater", |v| v >= 0.0)?;
        Ok(())
    }
}

fn check(
    name: &'static str,
    value: f64,
    expected: &'static str,
    valid: impl Fn(f64) -> bool,
) -> Result<(), ParameterError> {
    if value.is_finite() && valid(value) {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange {
            name,
            value,
            expected,
        })
    }
}

/// Partial parameter set; unset fields keep their current value on merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azimuth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eff_nom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    /// Also accepted as `u`; environment keys arrive lowercased
    #[serde(rename = "U", alias = "u", default, skip_serializing_if = "Option::is_none")]
    pub heat_transfer_u: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_derate_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b0: Option<f64>,
}

impl ParameterOverrides {
    /// Build overrides from loose key/value pairs, rejecting unknown keys
    pub fn from_pairs<I, K>(pairs: I) -> Result<Self, ParameterError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut out = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "tilt" => &mut out.tilt,
                "azimuth" => &mut out.azimuth,
                "eff_nom" => &mut out.eff_nom,
                "beta" => &mut out.beta,
                "U" => &mut out.heat_transfer_u,
                "system_derate_factor" => &mut out.system_derate_factor,
                "b0" => &mut out.b0,
                other => return Err(ParameterError::Unknown(other.to_string())),
            };
            *slot = Some(value);
        }
        Ok(out)
    }

    /// Layer `other` on top of `self`; fields set in `other` win
    pub fn and(self, other: ParameterOverrides) -> Self {
        Self {
            tilt: other.tilt.or(self.tilt),
            azimuth: other.azimuth.or(self.azimuth),
            eff_nom: other.eff_nom.or(self.eff_nom),
            beta: other.beta.or(self.beta),
            heat_transfer_u: other.heat_transfer_u.or(self.heat_transfer_u),
            system_derate_factor: other.system_derate_factor.or(self.system_derate_factor),
            b0: other.b0.or(self.b0),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<ModuleParameters> for ParameterOverrides {
    fn from(p: ModuleParameters) -> Self {
        Self {
            tilt: Some(p.tilt_deg),
            azimuth: Some(p.azimuth_deg),
            eff_nom: Some(p.eff_nom_percent),
            beta: Some(p.beta),
            heat_transfer_u: Some(p.heat_transfer_u),
            system_derate_factor: Some(p.system_derate_factor),
            b0: Some(p.iam_b0),
        }
    }
}

/// A complete parameter set built without defaults.
///
/// Every field must be present; the thermal and optical coefficients
/// (`beta`, `U`, `b0`) are never defaulted silently.
impl TryFrom<ParameterOverrides> for ModuleParameters {
    type Error = ParameterError;

    fn try_from(o: ParameterOverrides) -> Result<Self, Self::Error> {
        let params = Self {
            tilt_deg: o.tilt.ok_or(ParameterError::Missing("tilt"))?,
            azimuth_deg: o.azimuth.ok_or(ParameterError::Missing("azimuth"))?,
            eff_nom_percent: o.eff_nom.ok_or(ParameterError::Missing("eff_nom"))?,
            beta: o.beta.ok_or(ParameterError::Missing("beta"))?,
            heat_transfer_u: o.heat_transfer_u.ok_or(ParameterError::Missing("U"))?,
            system_derate_factor: o
                .system_derate_factor
                .ok_or(ParameterError::Missing("system_derate_factor"))?,
            iam_b0: o.b0.ok_or(ParameterError::Missing("b0"))?,
        };
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let p = ModuleParameters::default();
        assert!(p.validate().is_ok());
        assert_eq!(p.tilt_deg, 0.0);
        assert_eq!(p.azimuth_deg, 180.0);
        assert_eq!(p.eff_nom_percent, 19.0);
        assert_eq!(p.beta, 0.003);
        assert_eq!(p.heat_transfer_u, 46.0);
        assert_eq!(p.system_derate_factor, 0.837);
        assert_eq!(p.iam_b0, 0.05);
    }

    #[test]
    fn test_merge_replaces_only_set_fields() {
        let overrides = ParameterOverrides {
            tilt: Some(20.0),
            eff_nom: Some(21.5),
            ..Default::default()
        };
        let merged = ModuleParameters::default().merged(&overrides).unwrap();
        assert_eq!(merged.tilt_deg, 20.0);
        assert_eq!(merged.eff_nom_percent, 21.5);
        assert_eq!(merged.heat_transfer_u, 46.0);
        assert_eq!(merged.iam_b0, 0.05);
    }

    #[test]
    fn test_from_pairs_rejects_unknown_key() {
        let err = ParameterOverrides::from_pairs([("tilt", 10.0), ("tau", 0.9)]).unwrap_err();
        assert_eq!(err, ParameterError::Unknown("tau".to_string()));
    }

    #[test]
    fn test_from_pairs_accepts_every_known_key() {
        let pairs = PARAMETER_KEYS.iter().map(|k| (*k, 0.5));
        let overrides = ParameterOverrides::from_pairs(pairs).unwrap();
        assert_eq!(overrides.heat_transfer_u, Some(0.5));
        assert_eq!(overrides.b0, Some(0.5));
    }

    #[rstest]
    #[case("beta")]
    #[case("U")]
    #[case("b0")]
    fn test_missing_coefficient_fails_fast(#[case] missing: &str) {
        let full = ParameterOverrides::from(ModuleParameters::default());
        let pairs = PARAMETER_KEYS
            .iter()
            .filter(|k| **k != missing)
            .map(|k| {
                let value = match *k {
                    "tilt" => full.tilt,
                    "azimuth" => full.azimuth,
                    "eff_nom" => full.eff_nom,
                    "beta" => full.beta,
                    "U" => full.heat_transfer_u,
                    "system_derate_factor" => full.system_derate_factor,
                    _ => full.b0,
                };
                (*k, value.unwrap())
            });
        let partial = ParameterOverrides::from_pairs(pairs).unwrap();
        let err = ModuleParameters::try_from(partial).unwrap_err();
        assert!(matches!(err, ParameterError::Missing(name) if name == missing));
    }

    #[rstest]
    #[case(ParameterOverrides { eff_nom: Some(0.0), ..Default::default() }, "eff_nom")]
    #[case(ParameterOverrides { heat_transfer_u: Some(-1.0), ..Default::default() }, "U")]
    #[case(ParameterOverrides { system_derate_factor: Some(1.2), ..Default::default() }, "system_derate_factor")]
    #[case(ParameterOverrides { tilt: Some(95.0), ..Default::default() }, "tilt")]
    #[case(ParameterOverrides { b0: Some(-0.1), ..Default::default() }, "b0")]
    fn test_out_of_range_rejected(#[case] overrides: ParameterOverrides, #[case] field: &str) {
        let err = ModuleParameters::default().merged(&overrides).unwrap_err();
        assert!(matches!(err, ParameterError::OutOfRange { name, .. } if name == field));
    }

    #[test]
    fn test_overrides_deserialize_rejects_unknown_fields() {
        let ok: ParameterOverrides = serde_json::from_str(r#"{"U": 30.0, "tilt": 10}"#).unwrap();
        assert_eq!(ok.heat_transfer_u, Some(30.0));
        assert_eq!(ok.tilt, Some(10.0));

        let bad = serde_json::from_str::<ParameterOverrides>(r#"{"alpha": 0.9}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_overrides_layering() {
        let base = ParameterOverrides {
            tilt: Some(10.0),
            beta: Some(0.004),
            ..Default::default()
        };
        let top = ParameterOverrides {
            tilt: Some(25.0),
            ..Default::default()
        };
        let layered = base.and(top);
        assert_eq!(layered.tilt, Some(25.0));
        assert_eq!(layered.beta, Some(0.004));
        assert!(ParameterOverrides::default().is_empty());
        assert!(!layered.is_empty());
    }
}
