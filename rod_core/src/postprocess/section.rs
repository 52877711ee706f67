//! Section queries: N, σ, u at a user-chosen (rod, x), with history.
//!
//! ```rust
//! use rod_core::postprocess::section::SectionQueryService;
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
//! let mut service = SectionQueryService::new(100);
//! let record = service.query(&rods, 1, 1.0).unwrap();
//! assert_eq!(record.n, 1000.0);
//! assert!(service.query(&rods, 1, 2.5).is_err());
//! assert_eq!(service.history().len(), 1);
//! ```

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::fields;
use crate::errors::{CalcError, CalcResult, EntityKind};
use crate::results::RodResult;

/// One answered section query. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionQueryResult {
    pub id: Uuid,
    pub rod_id: u32,
    pub x: f64,
    /// Axial force N(x) (N)
    pub n: f64,
    /// Normal stress σ(x) (Pa)
    pub sigma: f64,
    /// Displacement u(x) (m)
    pub u: f64,
    /// |σ(x)| ≤ [σ]
    pub is_safe: bool,
    pub timestamp: DateTime<Utc>,
}

/// Evaluates sections on demand and keeps a most-recent-first history.
#[derive(Debug, Clone)]
pub struct SectionQueryService {
    history: VecDeque<SectionQueryResult>,
    capacity: usize,
}

impl Default for SectionQueryService {
    fn default() -> Self {
        SectionQueryService::new(100)
    }
}

impl SectionQueryService {
    /// Create a service keeping at most `capacity` records (at least one).
    pub fn new(capacity: usize) -> Self {
        SectionQueryService {
            history: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Evaluate N, σ, u on rod `rod_id` at `x` and record the result.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no rod with that id
    /// * `OutOfRange` - `x` is outside `[0, length]` (or not a number)
    ///
    /// History is untouched on failure.
    pub fn query(&mut self, rods: &[RodResult], rod_id: u32, x: f64) -> CalcResult<SectionQueryResult> {
        let rod = rods.iter().find(|r| r.id() == rod_id).ok_or_else(|| {
            warn!(rod_id, "section query on unknown rod");
            CalcError::not_found(EntityKind::Rod, rod_id)
        })?;

        if !(0.0..=rod.length()).contains(&x) {
            warn!(rod_id, x, length = rod.length(), "section query out of range");
            return Err(CalcError::out_of_range(rod_id, x, rod.length()));
        }

        let values = fields::evaluate(rod, x);
        let record = SectionQueryResult {
            id: Uuid::new_v4(),
            rod_id,
            x,
            n: values.n,
            sigma: values.sigma,
            u: values.u,
            is_safe: fields::is_safe(rod, x),
            timestamp: Utc::now(),
        };

        debug!(rod_id, x, n = record.n, sigma = record.sigma, u = record.u, "section evaluated");
        self.history.push_front(record.clone());
        self.history.truncate(self.capacity);
        Ok(record)
    }

    /// Remove one record by id. Returns whether anything was removed.
    pub fn remove_from_history(&mut self, id: Uuid) -> bool {
        match self.history.iter().position(|r| r.id == id) {
            Some(index) => {
                self.history.remove(index);
                true
            }
            None => false,
        }
    }

    /// Empty the history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Records, most recent first
    pub fn history(&self) -> Vec<SectionQueryResult> {
        self.history.iter().cloned().collect()
    }

    /// Iterate records, most recent first
    pub fn iter(&self) -> impl Iterator<Item = &SectionQueryResult> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{LinearCoeffs, QuadraticCoeffs};
    use crate::structure::Rod;

    fn rods() -> Vec<RodResult> {
        vec![
            RodResult {
                rod: Rod::new(1, 0, 1, 2.0, 0.01, 2e11, 1.5e8),
                axial_force_coeffs: LinearCoeffs::new(1000.0, 0.0),
                stress_coeffs: LinearCoeffs::new(1e5, 0.0),
                displacement_coeffs: QuadraticCoeffs::new(0.0, 5e-7, 0.0),
                max_stress_on_the_rod: 1e5,
            },
            RodResult {
                rod: Rod::new(2, 1, 2, 1.0, 0.001, 2e11, 1e5),
                axial_force_coeffs: LinearCoeffs::new(200.0, -100.0),
                stress_coeffs: LinearCoeffs::new(2e5, -1e5),
                displacement_coeffs: QuadraticCoeffs::new(1e-6, 1e-6, -2.5e-7),
                max_stress_on_the_rod: 2e5,
            },
        ]
    }

    #[test]
    fn test_end_to_end_example() {
        let mut service = SectionQueryService::default();
        let record = service.query(&rods(), 1, 1.0).unwrap();
        assert_eq!(record.n, 1000.0);
        assert_eq!(record.sigma, 1e5);
        assert_eq!(record.u, 5e-7);
        assert!(record.is_safe);
        assert_eq!(record.rod_id, 1);
    }

    #[test]
    fn test_out_of_range_never_recorded() {
        let mut service = SectionQueryService::default();
        let rods = rods();

        for x in [-0.001, 2.0001, f64::NAN, f64::INFINITY] {
            let err = service.query(&rods, 1, x).unwrap_err();
            assert_eq!(err.error_code(), "RANGE_ERROR");
        }
        assert!(service.is_empty());
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let mut service = SectionQueryService::default();
        let rods = rods();
        service.query(&rods, 1, 0.0).unwrap();
        service.query(&rods, 1, 2.0).unwrap();
        assert_eq!(service.len(), 2);
    }

    #[test]
    fn test_unknown_rod() {
        let mut service = SectionQueryService::default();
        let err = service.query(&rods(), 7, 0.5).unwrap_err();
        assert_eq!(err, CalcError::not_found(EntityKind::Rod, 7));
        assert!(service.is_empty());
    }

    #[test]
    fn test_unsafe_section_is_flagged() {
        let mut service = SectionQueryService::default();
        let record = service.query(&rods(), 2, 0.0).unwrap();
        assert!(!record.is_safe);
        let record = service.query(&rods(), 2, 1.0).unwrap();
        assert!(record.is_safe);
    }

    #[test]
    fn test_history_is_most_recent_first() {
        let mut service = SectionQueryService::default();
        let rods = rods();
        let first = service.query(&rods, 1, 0.5).unwrap();
        let second = service.query(&rods, 2, 0.5).unwrap();

        let history = service.history();
        assert_eq!(history[0].id, second.id);
        assert_eq!(history[1].id, first.id);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_remove_from_history() {
        let mut service = SectionQueryService::default();
        let rods = rods();
        let a = service.query(&rods, 1, 0.5).unwrap();
        let b = service.query(&rods, 1, 1.5).unwrap();

        assert!(service.remove_from_history(a.id));
        assert!(!service.remove_from_history(a.id));
        assert!(!service.remove_from_history(Uuid::new_v4()));
        assert_eq!(service.len(), 1);
        assert_eq!(service.history()[0].id, b.id);
    }

    #[test]
    fn test_clear_history_idempotent() {
        let mut service = SectionQueryService::default();
        service.query(&rods(), 1, 0.5).unwrap();
        service.clear_history();
        assert!(service.is_empty());
        service.clear_history();
        assert!(service.is_empty());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut service = SectionQueryService::new(2);
        let rods = rods();
        service.query(&rods, 1, 0.1).unwrap();
        service.query(&rods, 1, 0.2).unwrap();
        service.query(&rods, 1, 0.3).unwrap();

        let xs: Vec<f64> = service.iter().map(|r| r.x).collect();
        assert_eq!(xs, vec![0.3, 0.2]);
    }
}
