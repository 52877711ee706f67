//! # Calculation Results
//!
//! Per-rod polynomial coefficients as returned by the solver, and the
//! derivation of those coefficients from a nodal displacement vector.
//!
//! For a rod of length L, area A, modulus E, distributed load q, whose end
//! nodes moved by Δ0 and Δ1:
//!
//! ```text
//! N(x) = EA/L·(Δ1 − Δ0) + qL/2 − q·x
//! σ(x) = N(x) / A
//! u(x) = Δ0 + [(Δ1 − Δ0)/L + qL/(2EA)]·x − q/(2EA)·x²
//! ```
//!
//! No stiffness matrix is assembled here; the displacement vector comes
//! from the solver.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CalcError, CalcResult};
use crate::structure::{validate, Rod, StructureInput};

/// Coefficients of a linear field f(x) = a0 + a1·x
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearCoeffs {
    pub a0: f64,
    pub a1: f64,
}

impl LinearCoeffs {
    pub fn new(a0: f64, a1: f64) -> Self {
        LinearCoeffs { a0, a1 }
    }

    pub fn at(&self, x: f64) -> f64 {
        self.a0 + self.a1 * x
    }
}

/// Coefficients of a quadratic field f(x) = a0 + a1·x + a2·x²
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QuadraticCoeffs {
    pub a0: f64,
    pub a1: f64,
    pub a2: f64,
}

impl QuadraticCoeffs {
    pub fn new(a0: f64, a1: f64, a2: f64) -> Self {
        QuadraticCoeffs { a0, a1, a2 }
    }

    pub fn at(&self, x: f64) -> f64 {
        self.a0 + self.a1 * x + self.a2 * x * x
    }
}

/// A rod together with its solved field coefficients.
///
/// ## JSON Example
///
/// ```json
/// {
///   "id": 1, "start_node": 0, "end_node": 1,
///   "length": 2.0, "area": 0.01, "elastic_modulus": 2e11,
///   "allowable_stress": 1.5e8, "distributed_load": 0.0,
///   "axial_force_coeffs": { "a0": 1000.0, "a1": 0.0 },
///   "stress_coeffs": { "a0": 1e5, "a1": 0.0 },
///   "displacement_coeffs": { "a0": 0.0, "a1": 5e-7, "a2": 0.0 },
///   "max_stress_on_the_rod": 1e5
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RodResult {
    #[serde(flatten)]
    pub rod: Rod,

    /// N(x) = a0 + a1·x (N)
    pub axial_force_coeffs: LinearCoeffs,

    /// σ(x) = a0 + a1·x (Pa)
    pub stress_coeffs: LinearCoeffs,

    /// u(x) = a0 + a1·x + a2·x² (m)
    pub displacement_coeffs: QuadraticCoeffs,

    /// Signed extremum of σ over [0, length] (Pa)
    pub max_stress_on_the_rod: f64,
}

impl RodResult {
    pub fn id(&self) -> u32 {
        self.rod.id
    }

    pub fn length(&self) -> f64 {
        self.rod.length
    }

    /// Strength check on the rod-wide extremum: |σmax| ≤ [σ]
    pub fn is_safe(&self) -> bool {
        self.max_stress_on_the_rod.abs() <= self.rod.allowable_stress
    }

    /// Utilization ratio |σmax| / [σ]
    pub fn utilization(&self) -> f64 {
        self.max_stress_on_the_rod.abs() / self.rod.allowable_stress
    }
}

/// Everything one calculation produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverOutput {
    /// Nodal displacements Δ (m), one per node in node order
    pub displacements: Vec<f64>,

    /// One entry per rod
    pub rods: Vec<RodResult>,
}

impl SolverOutput {
    /// Find a rod result by rod id
    pub fn rod(&self, rod_id: u32) -> Option<&RodResult> {
        self.rods.iter().find(|r| r.id() == rod_id)
    }

    /// True when every rod passes the strength check
    pub fn all_safe(&self) -> bool {
        self.rods.iter().all(RodResult::is_safe)
    }
}

/// Content fingerprint of a rod set.
///
/// Two result sets with the same rods and coefficients (bit for bit) share a
/// fingerprint; any change in ids, geometry or coefficients yields a new one.
pub fn rod_set_fingerprint(rods: &[RodResult]) -> u64 {
    let mut hasher = DefaultHasher::new();
    rods.len().hash(&mut hasher);
    for r in rods {
        r.rod.id.hash(&mut hasher);
        r.rod.start_node.hash(&mut hasher);
        r.rod.end_node.hash(&mut hasher);
        let values = [
            r.rod.length,
            r.rod.area,
            r.rod.elastic_modulus,
            r.rod.allowable_stress,
            r.rod.distributed_load,
            r.axial_force_coeffs.a0,
            r.axial_force_coeffs.a1,
            r.stress_coeffs.a0,
            r.stress_coeffs.a1,
            r.displacement_coeffs.a0,
            r.displacement_coeffs.a1,
            r.displacement_coeffs.a2,
            r.max_stress_on_the_rod,
        ];
        for v in values {
            v.to_bits().hash(&mut hasher);
        }
    }
    hasher.finish()
}

/// Signed value of whichever end stress has the larger magnitude.
///
/// σ is linear, so its extremum over the rod lies at one of the ends.
pub fn signed_extremum(stress: &LinearCoeffs, length: f64) -> f64 {
    let (start, end) = (stress.at(0.0), stress.at(length));
    if start.abs() >= end.abs() {
        start
    } else {
        end
    }
}

/// Coefficients for a single rod given its end displacements.
pub fn rod_result(rod: &Rod, delta_start: f64, delta_end: f64) -> RodResult {
    let (l, a, e, q) = (rod.length, rod.area, rod.elastic_modulus, rod.distributed_load);
    let ea = e * a;

    let axial_force = LinearCoeffs::new(ea / l * (delta_end - delta_start) + q * l / 2.0, -q);
    let stress = LinearCoeffs::new(axial_force.a0 / a, axial_force.a1 / a);
    let displacement = QuadraticCoeffs::new(
        delta_start,
        (delta_end - delta_start) / l + q * l / (2.0 * ea),
        -q / (2.0 * ea),
    );

    RodResult {
        rod: rod.clone(),
        axial_force_coeffs: axial_force,
        stress_coeffs: stress,
        displacement_coeffs: displacement,
        max_stress_on_the_rod: signed_extremum(&stress, l),
    }
}

/// Derive all rod results from a structure and its nodal displacement vector.
///
/// # Errors
///
/// * `Validation` - the structure breaks a blocking invariant
/// * `InvalidInput` - the vector length differs from the node count, or holds non-finite values
///
/// # Example
///
/// ```rust
/// use rod_core::structure::{Node, Rod, StructureInput};
/// use rod_core::results::derive_rod_results;
///
/// let structure = StructureInput {
///     rods: vec![Rod::new(1, 0, 1, 2.0, 0.01, 2e11, 1.5e8)],
///     nodes: vec![Node::support(0), Node::free(1).with_force(1000.0)],
/// };
///
/// let output = derive_rod_results(&structure, &[0.0, 1e-6]).unwrap();
/// assert!((output.rods[0].axial_force_coeffs.a0 - 1000.0).abs() < 1e-6);
/// ```
pub fn derive_rod_results(structure: &StructureInput, displacements: &[f64]) -> CalcResult<SolverOutput> {
    validate(structure).into_result()?;

    if displacements.len() != structure.nodes.len() {
        return Err(CalcError::invalid_input(
            "displacements",
            format!("{} values", displacements.len()),
            format!("expected one displacement per node ({})", structure.nodes.len()),
        ));
    }
    if let Some(bad) = displacements.iter().find(|d| !d.is_finite()) {
        return Err(CalcError::invalid_input(
            "displacements",
            bad.to_string(),
            "displacements must be finite",
        ));
    }

    let rods = structure
        .rods
        .iter()
        .map(|rod| {
            let start = position_of(structure, rod, rod.start_node)?;
            let end = position_of(structure, rod, rod.end_node)?;
            Ok(rod_result(rod, displacements[start], displacements[end]))
        })
        .collect::<CalcResult<Vec<_>>>()?;

    debug!(rods = rods.len(), "rod coefficients derived");
    Ok(SolverOutput {
        displacements: displacements.to_vec(),
        rods,
    })
}

fn position_of(structure: &StructureInput, rod: &Rod, node_id: u32) -> CalcResult<usize> {
    // Validation already guarantees the node exists
    structure.node_position(node_id).ok_or_else(|| CalcError::Internal {
        message: format!("rod {} references missing node {}", rod.id, node_id),
    })
}
