//! # rod_core - Rod Structure Post-Processing Engine
//!
//! `rod_core` is the computational heart of Rodwise: it holds the data model
//! for chains of axially loaded rods, enforces their structural invariants,
//! and evaluates the axial force N(x), stress σ(x) and displacement u(x)
//! fields from solver-produced coefficients. All inputs and outputs are
//! JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Caller-owned state**: history and cached tables live in an explicit
//!   [`CalculationSession`], never in globals
//! - **JSON-First**: all types implement Serialize/Deserialize
//! - **Rich Errors**: structured error types, every violation reported at once
//! - **No solving**: the stiffness solve is an external collaborator behind
//!   the [`solver::Solver`] trait
//!
//! ## Quick Start
//!
//! ```rust
//! use rod_core::prelude::*;
//!
//! let mut model = StructureModel::new();
//! model.add_node(Node::free(0)).unwrap();
//! model.add_node(Node::free(1)).unwrap();
//! model.set_fixed(1, true).unwrap();
//! model.add_rod(Rod::new(1, 0, 1, 2.0, 0.01, 2e11, 1.5e8)).unwrap();
//! assert!(model.validate().is_valid());
//!
//! let mut session = CalculationSession::default();
//! session.calculate(&PrecomputedSolver::new(vec![-1e-6, 0.0]), &model).unwrap();
//!
//! let table = session.sample(1.0).unwrap();
//! assert_eq!(table.len(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`structure`] - Nodes, rods, validation and the editable model
//! - [`results`] - Solver output types and coefficient derivation
//! - [`postprocess`] - Field evaluation, section queries, sampling, reports
//! - [`solver`] - Boundary to the external solver
//! - [`session`] - Per-user calculation context
//! - [`settings`] - Tunables
//! - [`errors`] - Structured error types

pub mod errors;
pub mod postprocess;
pub mod results;
pub mod session;
pub mod settings;
pub mod solver;
pub mod structure;

// Re-export commonly used types at crate root for convenience
pub use errors::{CalcError, CalcResult};
pub use session::CalculationSession;
pub use settings::Settings;

/// Everything needed for the usual edit-calculate-inspect loop.
pub mod prelude {
    pub use crate::errors::{CalcError, CalcResult};
    pub use crate::postprocess::{
        assemble_report, sample, Report, ReportConfig, ReportInput, SectionQueryResult, UniformStepRow,
    };
    pub use crate::results::{LinearCoeffs, QuadraticCoeffs, RodResult, SolverOutput};
    pub use crate::session::CalculationSession;
    pub use crate::settings::Settings;
    pub use crate::solver::{PrecomputedSolver, Solver};
    pub use crate::structure::{validate, Node, Rod, RodPatch, StructureInput, StructureModel};
}
