//! Uniform-step sampling of all three fields along every rod.
//!
//! Grid points are generated by integer step count (`x = k·step`) rather
//! than by repeated addition, so rounding drift cannot skip or duplicate
//! the right boundary. A multiple of the step that lands within tolerance
//! of `L` is absorbed into the boundary point.
//!
//! ```rust
//! use rod_core::postprocess::sampler::sample;
//! use rod_core::results::{LinearCoeffs, QuadraticCoeffs, RodResult};
//! use rod_core::structure::Rod;
//!
//! let rods = vec![RodResult {
//!     rod: Rod::new(1, 0, 1, 2.0, 0.01, 2e11, 1.5e8),
//!     axial_force_coeffs: LinearCoeffs::new(1000.0, 0.0),
//!     stress_coeffs: LinearCoeffs::new(1e5, 0.0),
//!     displacement_coeffs: QuadraticCoeffs::new(0.0, 5e-7, 0.0),
//!     max_stress_on_the_rod: 1e5,
//! }];
//!
//! let rows = sample(&rods, 1.0);
//! let xs: Vec<f64> = rows.iter().map(|r| r.x).collect();
//! assert_eq!(xs, vec![0.0, 1.0, 2.0]);
//! assert!(rows[0].is_boundary && !rows[1].is_boundary && rows[2].is_boundary);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::fields;
use crate::errors::{CalcError, CalcResult};
use crate::results::{rod_set_fingerprint, RodResult};
use crate::settings::Settings;

/// One sampled point on one rod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformStepRow {
    pub rod_id: u32,
    pub x: f64,
    pub n: f64,
    pub sigma: f64,
    pub u: f64,
    /// x is 0 or the rod length
    pub is_boundary: bool,
}

/// Sample every rod at `step` with default tolerance and no point cap.
///
/// Returns an empty table when `step` or any rod length is not a positive
/// finite number.
pub fn sample(rods: &[RodResult], step: f64) -> Vec<UniformStepRow> {
    let defaults = Settings::default();
    sample_with(rods, step, defaults.boundary_tolerance, usize::MAX).unwrap_or_default()
}

/// Sample every rod at `step`.
///
/// # Errors
///
/// * `InvalidInput` - `step` is not positive and finite, a rod length is not
///   positive and finite, or a rod would need more than `max_points_per_rod` points
pub fn sample_with(
    rods: &[RodResult],
    step: f64,
    tolerance: f64,
    max_points_per_rod: usize,
) -> CalcResult<Vec<UniformStepRow>> {
    if !(step > 0.0 && step.is_finite()) {
        return Err(CalcError::invalid_input(
            "step",
            step.to_string(),
            "Step must be greater than 0",
        ));
    }

    if let Some(bad) = rods.iter().find(|r| !(r.length() > 0.0 && r.length().is_finite())) {
        return Err(CalcError::invalid_input(
            "length",
            bad.length().to_string(),
            format!("Rod {} length must be positive and finite", bad.id()),
        ));
    }

    let mut rows = Vec::new();
    for rod in rods {
        for (x, is_boundary) in grid_points(rod.length(), step, tolerance, max_points_per_rod, rod.id())? {
            let values = fields::evaluate(rod, x);
            rows.push(UniformStepRow {
                rod_id: rod.id(),
                x,
                n: values.n,
                sigma: values.sigma,
                u: values.u,
                is_boundary,
            });
        }
    }

    debug!(rods = rods.len(), rows = rows.len(), step, "uniform table built");
    Ok(rows)
}

/// Ascending points `0, step, 2·step, …, L` with their boundary flag.
fn grid_points(
    length: f64,
    step: f64,
    tolerance: f64,
    max_points: usize,
    rod_id: u32,
) -> CalcResult<Vec<(f64, bool)>> {
    let cutoff = length - length * tolerance;
    let interior = (cutoff / step).ceil().max(1.0) - 1.0;
    // boundaries plus interior multiples; NaN never fits
    let fits = interior + 2.0 <= max_points as f64;
    if !fits {
        return Err(CalcError::invalid_input(
            "step",
            step.to_string(),
            format!(
                "Rod {} of length {} would need more than {} points",
                rod_id, length, max_points
            ),
        ));
    }

    let mut points = vec![(0.0, true)];
    let mut k: u64 = 1;
    loop {
        let x = k as f64 * step;
        if x >= cutoff {
            break;
        }
        points.push((x, false));
        k += 1;
    }
    points.push((length, true));
    Ok(points)
}

/// Session-owned sampler that caches the last table.
///
/// The cached table is rebuilt from scratch whenever the rod set or the step
/// differs from the one it was built for.
#[derive(Debug, Clone)]
pub struct UniformSampler {
    tolerance: f64,
    max_points_per_rod: usize,
    cache: Option<CachedTable>,
}

#[derive(Debug, Clone)]
struct CachedTable {
    fingerprint: u64,
    step_bits: u64,
    rows: Vec<UniformStepRow>,
}

impl Default for UniformSampler {
    fn default() -> Self {
        UniformSampler::from_settings(&Settings::default())
    }
}

impl UniformSampler {
    pub fn from_settings(settings: &Settings) -> Self {
        UniformSampler {
            tolerance: settings.boundary_tolerance,
            max_points_per_rod: settings.max_points_per_rod,
            cache: None,
        }
    }

    /// Table for `rods` at `step`, rebuilt only when either changed.
    pub fn table(&mut self, rods: &[RodResult], step: f64) -> CalcResult<&[UniformStepRow]> {
        let fingerprint = rod_set_fingerprint(rods);
        let step_bits = step.to_bits();

        let fresh = matches!(
            &self.cache,
            Some(c) if c.fingerprint == fingerprint && c.step_bits == step_bits
        );
        if !fresh {
            let rows = sample_with(rods, step, self.tolerance, self.max_points_per_rod).map_err(|e| {
                warn!(step, error = %e, "uniform sampling rejected");
                e
            })?;
            self.cache = Some(CachedTable {
                fingerprint,
                step_bits,
                rows,
            });
        }

        Ok(self.cache.as_ref().map(|c| c.rows.as_slice()).unwrap_or(&[]))
    }

    /// Last built table, if any
    pub fn last_table(&self) -> Option<&[UniformStepRow]> {
        self.cache.as_ref().map(|c| c.rows.as_slice())
    }

    /// Drop the cached table
    pub fn invalidate(&mut self) {
        self.cache = None;
    }
}
