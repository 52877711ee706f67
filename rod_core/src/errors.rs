//! # Error Types
//!
//! Structured error types for rod_core. Every variant is recoverable at the
//! call site: a failed validation, query or solver round-trip leaves all
//! previously held state untouched.
//!
//! ## Example
//!
//! ```rust
//! use rod_core::errors::{CalcError, CalcResult};
//!
//! fn check_x(rod_id: u32, x: f64, length: f64) -> CalcResult<()> {
//!     if x < 0.0 || x > length {
//!         return Err(CalcError::out_of_range(rod_id, x, length));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_x(1, 2.5, 2.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::structure::Violation;

/// Result type alias for rod_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Kind of entity referenced by a [`CalcError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Rod,
    Node,
    QueryRecord,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Rod => write!(f, "rod"),
            EntityKind::Node => write!(f, "node"),
            EntityKind::QueryRecord => write!(f, "query record"),
        }
    }
}

/// Structured error type for structure editing and post-processing.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// One or more structural invariants are violated
    #[error("Structure is invalid: {}", join_violations(.violations))]
    Validation { violations: Vec<Violation> },

    /// Query coordinate outside the rod
    #[error("x = {x} is outside rod {rod_id}: expected {min} <= x <= {max}")]
    OutOfRange {
        rod_id: u32,
        x: f64,
        min: f64,
        max: f64,
    },

    /// Referenced rod/node/record id does not exist
    #[error("{entity} with id {id} not found")]
    NotFound { entity: EntityKind, id: String },

    /// The external solver rejected the structure or failed
    #[error("Solver failed: {}", .messages.join("; "))]
    Solver { messages: Vec<String> },

    /// An input value is invalid (bad step, mismatched vector length, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl CalcError {
    /// Create a Validation error from a list of violations
    pub fn validation(violations: Vec<Violation>) -> Self {
        CalcError::Validation { violations }
    }

    /// Create an OutOfRange error for a rod of the given length
    pub fn out_of_range(rod_id: u32, x: f64, length: f64) -> Self {
        CalcError::OutOfRange {
            rod_id,
            x,
            min: 0.0,
            max: length,
        }
    }

    /// Create a NotFound error
    pub fn not_found(entity: EntityKind, id: impl ToString) -> Self {
        CalcError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a Solver error carrying the collaborator's messages verbatim
    pub fn solver<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CalcError::Solver {
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error.
    ///
    /// Domain errors never poison the session; only internal errors are
    /// treated as unrecoverable.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CalcError::Internal { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::Validation { .. } => "VALIDATION_ERROR",
            CalcError::OutOfRange { .. } => "RANGE_ERROR",
            CalcError::NotFound { .. } => "NOT_FOUND",
            CalcError::Solver { .. } => "SOLVER_ERROR",
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: e.to_string(),
        }
    }
}
