//! # Solver Seam
//!
//! The stiffness solve itself happens outside this crate. [`Solver`] is the
//! boundary: submit a validated structure, get back a [`SolverOutput`] or a
//! [`CalcError::Solver`] carrying the collaborator's messages unchanged.
//!
//! [`PrecomputedSolver`] covers the common case where the nodal displacement
//! vector is already known (e.g. returned by a remote processor service) and
//! only the per-rod coefficients still need to be derived.

use tracing::info;

use crate::errors::{CalcError, CalcResult};
use crate::results::{derive_rod_results, SolverOutput};
use crate::structure::StructureInput;

/// External solver collaborator.
///
/// A call is an atomic request/response: either a complete output or an error,
/// never a partial result.
pub trait Solver {
    fn solve(&self, input: &StructureInput) -> CalcResult<SolverOutput>;
}

impl<F> Solver for F
where
    F: Fn(&StructureInput) -> CalcResult<SolverOutput>,
{
    fn solve(&self, input: &StructureInput) -> CalcResult<SolverOutput> {
        self(input)
    }
}

/// Solver backed by a known nodal displacement vector.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecomputedSolver {
    displacements: Vec<f64>,
}

impl PrecomputedSolver {
    pub fn new(displacements: Vec<f64>) -> Self {
        PrecomputedSolver { displacements }
    }

    pub fn displacements(&self) -> &[f64] {
        &self.displacements
    }
}

impl Solver for PrecomputedSolver {
    fn solve(&self, input: &StructureInput) -> CalcResult<SolverOutput> {
        if input.nodes.iter().all(|n| n.fixed) {
            return Err(CalcError::solver([
                "All nodes are fixed; there are no free displacements to solve for",
            ]));
        }
        let output = derive_rod_results(input, &self.displacements)?;
        info!(rods = output.rods.len(), "coefficients derived from precomputed displacements");
        Ok(output)
    }
}
