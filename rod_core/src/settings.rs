//! # Post-Processing Settings
//!
//! Tunables for sampling, history and report assembly. All fields have
//! defaults, so a partial JSON file only overrides what it names.
//!
//! ```rust
//! use rod_core::settings::Settings;
//!
//! let settings: Settings = serde_json::from_str(r#"{ "default_step": 0.25 }"#).unwrap();
//! assert_eq!(settings.default_step, 0.25);
//! assert_eq!(settings.history_capacity, 100);
//! assert!(settings.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::postprocess::report::ReportConfig;

/// Session-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Step (m) used by the uniform sampler when none is given
    pub default_step: f64,

    /// Relative tolerance for treating a grid point as the right boundary
    pub boundary_tolerance: f64,

    /// Maximum number of section queries kept in history (oldest dropped first)
    pub history_capacity: usize,

    /// Upper bound on sampled points per rod
    pub max_points_per_rod: usize,

    /// Segments per rod for the epure series in reports
    pub epure_resolution: usize,

    /// Default section selection for reports
    pub report: ReportConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_step: 0.5,
            boundary_tolerance: 1e-9,
            history_capacity: 100,
            max_points_per_rod: 100_000,
            epure_resolution: 20,
            report: ReportConfig::default(),
        }
    }
}

impl Settings {
    /// Check settings values.
    pub fn validate(&self) -> CalcResult<()> {
        if !(self.default_step > 0.0 && self.default_step.is_finite()) {
            return Err(CalcError::invalid_input(
                "default_step",
                self.default_step.to_string(),
                "Step must be a positive finite number",
            ));
        }
        if !(self.boundary_tolerance >= 0.0 && self.boundary_tolerance < 0.5) {
            return Err(CalcError::invalid_input(
                "boundary_tolerance",
                self.boundary_tolerance.to_string(),
                "Tolerance must be in [0, 0.5)",
            ));
        }
        if self.history_capacity == 0 {
            return Err(CalcError::invalid_input(
                "history_capacity",
                "0",
                "History must hold at least one record",
            ));
        }
        if self.max_points_per_rod < 2 {
            return Err(CalcError::invalid_input(
                "max_points_per_rod",
                self.max_points_per_rod.to_string(),
                "Every rod needs at least its two boundary points",
            ));
        }
        if self.epure_resolution == 0 {
            return Err(CalcError::invalid_input(
                "epure_resolution",
                "0",
                "Epures need at least one segment per rod",
            ));
        }
        Ok(())
    }

    /// Parse settings from JSON and validate them.
    pub fn from_json(json: &str) -> CalcResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }
}
