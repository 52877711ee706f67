//! # Post-Processing
//!
//! Everything that consumes solved rod coefficients:
//!
//! - [`fields`] - N(x), σ(x), u(x) evaluation and the strength check
//! - [`section`] - one-off section queries with a query history
//! - [`sampler`] - uniform-step tables over every rod
//! - [`report`] - assembly of selected artifacts into one export payload
//!
//! All functions here are synchronous and operate on caller-owned data.

pub mod fields;
pub mod report;
pub mod sampler;
pub mod section;

pub use fields::{axial_force, displacement, evaluate, is_safe, stress, FieldValues};
pub use report::{assemble_report, Report, ReportConfig, ReportInput, RodSummaryRow};
pub use sampler::{sample, UniformSampler, UniformStepRow};
pub use section::{SectionQueryResult, SectionQueryService};
