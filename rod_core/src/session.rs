//! # Calculation Session
//!
//! Explicit owner of everything derived from one calculation: the solver
//! output, the section-query history and the cached uniform-step table.
//!
//! ## Lifecycle
//!
//! ```text
//! CalculationSession::new(settings)
//!   └── calculate(solver, model) / load_results(output)
//!         ├── same rod set as before  -> history and table kept
//!         └── different rod set       -> history cleared, table dropped,
//!                                        new calculation id issued
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rod_core::session::CalculationSession;
//! use rod_core::settings::Settings;
//! use rod_core::solver::PrecomputedSolver;
//! use rod_core::structure::{Node, Rod, StructureModel, StructureInput};
//!
//! let model = StructureModel::from_input(StructureInput {
//!     rods: vec![Rod::new(1, 0, 1, 2.0, 0.01, 2e11, 1.5e8)],
//!     nodes: vec![Node::support(0), Node::free(1).with_force(1000.0)],
//! });
//!
//! let mut session = CalculationSession::new(Settings::default());
//! session.calculate(&PrecomputedSolver::new(vec![0.0, 1e-6]), &model).unwrap();
//!
//! let record = session.query(1, 1.0).unwrap();
//! assert!(record.is_safe);
//! assert_eq!(session.history().len(), 1);
//! ```

use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{CalcError, CalcResult};
use crate::postprocess::report::{assemble_report, Report, ReportConfig, ReportInput};
use crate::postprocess::sampler::{UniformSampler, UniformStepRow};
use crate::postprocess::section::{SectionQueryResult, SectionQueryService};
use crate::results::{rod_set_fingerprint, SolverOutput};
use crate::settings::Settings;
use crate::solver::Solver;
use crate::structure::{StructureInput, StructureModel};

#[derive(Debug, Clone)]
struct LoadedResults {
    calculation_id: Uuid,
    fingerprint: u64,
    structure: Option<StructureInput>,
    output: SolverOutput,
}

/// Per-user post-processing context.
#[derive(Debug, Clone)]
pub struct CalculationSession {
    settings: Settings,
    current: Option<LoadedResults>,
    queries: SectionQueryService,
    sampler: UniformSampler,
}

impl Default for CalculationSession {
    fn default() -> Self {
        CalculationSession::new(Settings::default())
    }
}

impl CalculationSession {
    pub fn new(settings: Settings) -> Self {
        CalculationSession {
            queries: SectionQueryService::new(settings.history_capacity),
            sampler: UniformSampler::from_settings(&settings),
            settings,
            current: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validate the model, run the solver and load its output.
    ///
    /// On any failure the session keeps its previous results and history.
    pub fn calculate<S: Solver + ?Sized>(&mut self, solver: &S, model: &StructureModel) -> CalcResult<Uuid> {
        let report = model.validate();
        for advisory in report.advisories() {
            warn!(message = %advisory.message, "advisory before solve");
        }
        report.into_result()?;

        let output = solver.solve(model.input()).map_err(|e| {
            warn!(error = %e, "solver failed");
            match e {
                CalcError::Solver { .. } | CalcError::Validation { .. } => e,
                other => CalcError::solver([other.to_string()]),
            }
        })?;

        Ok(self.install(output, Some(model.input().clone())))
    }

    /// Load results computed elsewhere.
    ///
    /// # Errors
    ///
    /// * `InvalidInput` - the displacement vector does not have one entry per node
    pub fn load_results(&mut self, output: SolverOutput) -> CalcResult<Uuid> {
        if !output.rods.is_empty() && output.displacements.len() != output.rods.len() + 1 {
            return Err(CalcError::invalid_input(
                "displacements",
                format!("{} values", output.displacements.len()),
                format!("expected {} (rod count + 1)", output.rods.len() + 1),
            ));
        }
        Ok(self.install(output, None))
    }

    fn install(&mut self, output: SolverOutput, structure: Option<StructureInput>) -> Uuid {
        let fingerprint = rod_set_fingerprint(&output.rods);

        if let Some(current) = self.current.as_mut().filter(|c| c.fingerprint == fingerprint) {
            current.output = output;
            if structure.is_some() {
                current.structure = structure;
            }
            info!(calculation_id = %current.calculation_id, "same rod set reloaded; history kept");
            return current.calculation_id;
        }

        let calculation_id = Uuid::new_v4();
        self.queries.clear_history();
        self.sampler.invalidate();
        info!(%calculation_id, rods = output.rods.len(), "new calculation loaded");
        self.current = Some(LoadedResults {
            calculation_id,
            fingerprint,
            structure,
            output,
        });
        calculation_id
    }

    /// Drop results, history and cached table.
    pub fn reset(&mut self) {
        self.current = None;
        self.queries.clear_history();
        self.sampler.invalidate();
    }

    pub fn calculation_id(&self) -> Option<Uuid> {
        self.current.as_ref().map(|c| c.calculation_id)
    }

    pub fn output(&self) -> Option<&SolverOutput> {
        self.current.as_ref().map(|c| &c.output)
    }

    pub fn structure(&self) -> Option<&StructureInput> {
        self.current.as_ref().and_then(|c| c.structure.as_ref())
    }

    fn loaded(&self) -> CalcResult<&LoadedResults> {
        self.current.as_ref().ok_or_else(|| {
            CalcError::invalid_input("session", "empty", "No calculation results are loaded")
        })
    }

    /// Evaluate a section and add it to history.
    pub fn query(&mut self, rod_id: u32, x: f64) -> CalcResult<SectionQueryResult> {
        self.loaded()?;
        let rods = self.current.as_ref().map(|c| c.output.rods.as_slice()).unwrap_or(&[]);
        self.queries.query(rods, rod_id, x)
    }

    pub fn remove_from_history(&mut self, id: Uuid) -> bool {
        self.queries.remove_from_history(id)
    }

    pub fn clear_history(&mut self) {
        self.queries.clear_history();
    }

    /// Query records, most recent first
    pub fn history(&self) -> Vec<SectionQueryResult> {
        self.queries.history()
    }

    /// Uniform-step table at `step` (rebuilt only when the step or rod set changed).
    pub fn sample(&mut self, step: f64) -> CalcResult<Vec<UniformStepRow>> {
        self.loaded()?;
        let rods = self.current.as_ref().map(|c| c.output.rods.as_slice()).unwrap_or(&[]);
        self.sampler.table(rods, step).map(<[UniformStepRow]>::to_vec)
    }

    /// Uniform-step table at the configured default step.
    pub fn sample_default(&mut self) -> CalcResult<Vec<UniformStepRow>> {
        self.sample(self.settings.default_step)
    }

    /// Assemble a report from the current results, history and last table.
    pub fn assemble_report(&self, config: &ReportConfig) -> CalcResult<Report> {
        let loaded = self.loaded()?;
        let history = self.queries.history();

        let mut input = ReportInput::new(&loaded.output.displacements, &loaded.output.rods).with_history(&history);
        if let Some(structure) = loaded.structure.as_ref() {
            input = input.with_structure(structure);
        }
        if let Some(table) = self.sampler.last_table() {
            input = input.with_step_table(table);
        }

        Ok(assemble_report(config, &input, self.settings.epure_resolution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::PrecomputedSolver;
    use crate::structure::{Node, Rod};

    fn model(force: f64) -> StructureModel {
        StructureModel::from_input(StructureInput {
            rods: vec![
                Rod::new(1, 0, 1, 2.0, 0.01, 2e11, 1.5e8),
                Rod::new(2, 1, 2, 1.0, 0.01, 2e11, 1.5e8),
            ],
            nodes: vec![Node::support(0), Node::free(1), Node::free(2).with_force(force)],
        })
    }

    fn solved(force: f64) -> (CalculationSession, PrecomputedSolver) {
        // EA/L: rod 1 = 1e9, rod 2 = 2e9
        let solver = PrecomputedSolver::new(vec![0.0, force / 1e9, force / 1e9 + force / 2e9]);
        let mut session = CalculationSession::default();
        session.calculate(&solver, &model(force)).unwrap();
        (session, solver)
    }

    #[test]
    fn test_query_requires_results() {
        let mut session = CalculationSession::default();
        assert_eq!(session.query(1, 0.0).unwrap_err().error_code(), "INVALID_INPUT");
        assert!(session.sample(0.5).is_err());
        assert!(session.assemble_report(&ReportConfig::default()).is_err());
    }

    #[test]
    fn test_same_rod_set_keeps_history() {
        let (mut session, solver) = solved(1000.0);
        let id = session.calculation_id();
        session.query(1, 1.0).unwrap();

        session.calculate(&solver, &model(1000.0)).unwrap();
        assert_eq!(session.calculation_id(), id);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_new_rod_set_clears_history() {
        let (mut session, _) = solved(1000.0);
        let id = session.calculation_id();
        session.query(1, 1.0).unwrap();
        session.sample(0.5).unwrap();

        let other = PrecomputedSolver::new(vec![0.0, 2e-6, 3e-6]);
        session.calculate(&other, &model(2000.0)).unwrap();

        assert_ne!(session.calculation_id(), id);
        assert!(session.history().is_empty());
        let report = session.assemble_report(&ReportConfig::all()).unwrap();
        assert!(report.uniform_step.is_none());
    }

    #[test]
    fn test_failed_validation_keeps_state() {
        let (mut session, solver) = solved(1000.0);
        session.query(2, 0.5).unwrap();
        let id = session.calculation_id();

        let mut broken = model(1000.0).into_input();
        broken.rods[0].area = 0.0;
        let err = session
            .calculate(&solver, &StructureModel::from_input(broken))
            .unwrap_err();

        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(session.calculation_id(), id);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_solver_failure_passes_messages() {
        let (mut session, _) = solved(1000.0);
        let failing = |_: &StructureInput| -> CalcResult<SolverOutput> {
            Err(CalcError::solver(["singular stiffness matrix"]))
        };

        let err = session.calculate(&failing, &model(5.0)).unwrap_err();
        assert_eq!(err.to_string(), "Solver failed: singular stiffness matrix");
        assert!(session.output().is_some());
    }

    #[test]
    fn test_other_solver_errors_become_solver_errors() {
        let mut session = CalculationSession::default();
        let short = PrecomputedSolver::new(vec![0.0]);
        let err = session.calculate(&short, &model(1000.0)).unwrap_err();
        assert_eq!(err.error_code(), "SOLVER_ERROR");
        assert!(session.output().is_none());
    }

    #[test]
    fn test_sample_and_report() {
        let (mut session, _) = solved(1000.0);
        let rows = session.sample(0.5).unwrap();
        assert_eq!(rows.len(), 5 + 3);

        session.query(1, 2.0).unwrap();
        let report = session.assemble_report(&ReportConfig::all()).unwrap();
        assert_eq!(report.section_calc.map(|h| h.len()), Some(1));
        assert_eq!(report.uniform_step.map(|t| t.len()), Some(8));
        assert!(report.construction.unwrap().rods[0].start.as_ref().unwrap().fixed);
        assert!(report.all_safe);
    }

    #[test]
    fn test_load_results_checks_vector() {
        let (session, _) = solved(1000.0);
        let mut output = session.output().cloned().unwrap();
        output.displacements.pop();

        let mut fresh = CalculationSession::default();
        assert!(fresh.load_results(output).is_err());
        assert!(fresh.output().is_none());
    }

    #[test]
    fn test_reset() {
        let (mut session, _) = solved(1000.0);
        session.query(1, 0.0).unwrap();
        session.reset();
        assert!(session.output().is_none());
        assert!(session.history().is_empty());
    }
}
