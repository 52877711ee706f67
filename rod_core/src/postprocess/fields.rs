//! Field evaluation at a rod-local coordinate.
//!
//! These functions are total over the reals: no bounds are enforced here.
//! Range checking belongs to the callers ([`SectionQueryService`] rejects
//! out-of-range x, the sampler never produces one).
//!
//! [`SectionQueryService`]: super::section::SectionQueryService

use serde::{Deserialize, Serialize};

use crate::results::RodResult;

/// N, σ and u at one section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValues {
    /// Axial force (N)
    pub n: f64,
    /// Normal stress (Pa)
    pub sigma: f64,
    /// Axial displacement (m)
    pub u: f64,
}

/// N(x) = a0 + a1·x
pub fn axial_force(rod: &RodResult, x: f64) -> f64 {
    rod.axial_force_coeffs.at(x)
}

/// σ(x) = a0 + a1·x
pub fn stress(rod: &RodResult, x: f64) -> f64 {
    rod.stress_coeffs.at(x)
}

/// u(x) = a0 + a1·x + a2·x²
pub fn displacement(rod: &RodResult, x: f64) -> f64 {
    rod.displacement_coeffs.at(x)
}

/// |σ(x)| ≤ [σ]
pub fn is_safe(rod: &RodResult, x: f64) -> bool {
    stress(rod, x).abs() <= rod.rod.allowable_stress
}

/// All three fields at once.
pub fn evaluate(rod: &RodResult, x: f64) -> FieldValues {
    FieldValues {
        n: axial_force(rod, x),
        sigma: stress(rod, x),
        u: displacement(rod, x),
    }
}
