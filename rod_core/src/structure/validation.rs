//! Structural invariant checks.
//!
//! [`validate`] never fails fast: every violated rule is collected so the
//! user can fix all of them in one pass.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Node, Rod, StructureInput};
use crate::errors::{CalcError, CalcResult};

/// How serious a violation is.
///
/// `Advisory` findings are surfaced before submission but do not block it;
/// the solver has the final word on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Error,
    Advisory,
}

/// What a violation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum Subject {
    Structure,
    Rod(u32),
    Node(u32),
}

/// A single violated invariant, with a message fit to show the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub severity: Severity,
    pub subject: Subject,
    /// Offending field name, when the rule concerns a single field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl Violation {
    /// Structure-wide error
    pub fn structure(message: impl Into<String>) -> Self {
        Violation {
            severity: Severity::Error,
            subject: Subject::Structure,
            field: None,
            message: message.into(),
        }
    }

    /// Error about one rod
    pub fn rod(rod_id: u32, field: Option<&str>, message: impl Into<String>) -> Self {
        Violation {
            severity: Severity::Error,
            subject: Subject::Rod(rod_id),
            field: field.map(str::to_string),
            message: message.into(),
        }
    }

    /// Error about one node
    pub fn node(node_id: u32, field: Option<&str>, message: impl Into<String>) -> Self {
        Violation {
            severity: Severity::Error,
            subject: Subject::Node(node_id),
            field: field.map(str::to_string),
            message: message.into(),
        }
    }

    /// Downgrade to advisory severity
    pub fn advisory(mut self) -> Self {
        self.severity = Severity::Advisory;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of [`validate`]: all violations found, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// No blocking violations (advisories allowed)
    pub fn is_valid(&self) -> bool {
        !self.violations.iter().any(Violation::is_error)
    }

    /// No violations at all, advisories included
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_error())
    }

    pub fn advisories(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.is_error())
    }

    /// Messages in check order, for display
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.message.clone()).collect()
    }

    /// Convert blocking violations into a [`CalcError::Validation`].
    pub fn into_result(self) -> CalcResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(CalcError::validation(
                self.violations.into_iter().filter(Violation::is_error).collect(),
            ))
        }
    }
}

/// Check every structural invariant and return all violations.
///
/// # Example
///
/// ```rust
/// use rod_core::structure::{Node, Rod, StructureInput, validate};
///
/// let structure = StructureInput {
///     rods: vec![Rod::new(1, 0, 1, 2.0, 0.01, 2e11, 1.5e8)],
///     nodes: vec![Node::free(0), Node::free(1), Node::free(2)],
/// };
///
/// let report = validate(&structure);
/// assert!(!report.is_valid());
/// assert!(report.messages()[0].contains("3 nodes"));
/// ```
pub fn validate(structure: &StructureInput) -> ValidationReport {
    let mut violations = Vec::new();

    if structure.nodes.is_empty() {
        violations.push(Violation::structure("Node list must not be empty"));
    }
    if structure.rods.is_empty() {
        violations.push(Violation::structure("Rod list must not be empty"));
    }

    let (node_count, rod_count) = (structure.nodes.len(), structure.rods.len());
    if node_count != rod_count + 1 {
        violations.push(Violation::structure(format!(
            "Node count must be rod count + 1: found {} nodes and {} rods",
            node_count, rod_count
        )));
    }

    check_unique_ids(structure, &mut violations);
    check_supports(&structure.nodes, &mut violations);
    for node in &structure.nodes {
        check_node_values(node, &mut violations);
    }
    for rod in &structure.rods {
        violations.extend(rod_value_violations(rod));
    }
    check_connectivity(structure, &mut violations);

    ValidationReport { violations }
}

fn check_unique_ids(structure: &StructureInput, violations: &mut Vec<Violation>) {
    let mut seen = HashSet::new();
    for node in &structure.nodes {
        if !seen.insert(node.id) {
            violations.push(Violation::node(
                node.id,
                Some("id"),
                format!("Duplicate node id {}", node.id),
            ));
        }
    }

    let mut seen = HashSet::new();
    for rod in &structure.rods {
        if !seen.insert(rod.id) {
            violations.push(Violation::rod(
                rod.id,
                Some("id"),
                format!("Duplicate rod id {}", rod.id),
            ));
        }
    }
}

fn check_supports(nodes: &[Node], violations: &mut Vec<Violation>) {
    let last = nodes.len().saturating_sub(1);
    for (index, node) in nodes.iter().enumerate() {
        if node.fixed && index != 0 && index != last {
            violations.push(interior_support_violation(node.id));
        }
    }

    if !nodes.is_empty() && !nodes.iter().any(|n| n.fixed) {
        violations.push(
            Violation::structure("Structure has no fixed node; at least one support is required")
                .advisory(),
        );
    }
}

pub(crate) fn interior_support_violation(node_id: u32) -> Violation {
    Violation::node(
        node_id,
        Some("fixed"),
        format!(
            "Node {} is an interior node; supports are only allowed on the first or last node",
            node_id
        ),
    )
}

fn check_node_values(node: &Node, violations: &mut Vec<Violation>) {
    if !node.external_force.is_finite() {
        violations.push(Violation::node(
            node.id,
            Some("external_force"),
            format!("Node {}: external_force must be a finite number", node.id),
        ));
    }
}

/// Numeric field checks for one rod. Shared with the mutators.
pub(crate) fn rod_value_violations(rod: &Rod) -> Vec<Violation> {
    let mut violations: Vec<Violation> = [
        ("length", rod.length),
        ("area", rod.area),
        ("elastic_modulus", rod.elastic_modulus),
        ("allowable_stress", rod.allowable_stress),
    ]
    .into_iter()
    .filter_map(|(field, value)| positive_field_violation(rod.id, field, value))
    .collect();

    if !rod.distributed_load.is_finite() {
        violations.push(Violation::rod(
            rod.id,
            Some("distributed_load"),
            format!("Rod {}: distributed_load must be a finite number", rod.id),
        ));
    }
    violations
}

pub(crate) fn positive_field_violation(rod_id: u32, field: &str, value: f64) -> Option<Violation> {
    // NaN fails this comparison as well
    if value > 0.0 && value.is_finite() {
        None
    } else {
        Some(Violation::rod(
            rod_id,
            Some(field),
            format!("Rod {}: {} must be > 0 (got {})", rod_id, field, value),
        ))
    }
}

fn check_connectivity(structure: &StructureInput, violations: &mut Vec<Violation>) {
    let node_count = structure.nodes.len();
    let mut spans = vec![0usize; node_count.saturating_sub(1)];

    for rod in &structure.rods {
        let start = structure.node_position(rod.start_node);
        let end = structure.node_position(rod.end_node);

        if start.is_none() {
            violations.push(Violation::rod(
                rod.id,
                Some("start_node"),
                format!("Rod {}: start node {} does not exist", rod.id, rod.start_node),
            ));
        }
        if end.is_none() {
            violations.push(Violation::rod(
                rod.id,
                Some("end_node"),
                format!("Rod {}: end node {} does not exist", rod.id, rod.end_node),
            ));
        }

        if let (Some(start), Some(end)) = (start, end) {
            if end == start + 1 {
                spans[start] += 1;
            } else {
                violations.push(Violation::rod(
                    rod.id,
                    None,
                    format!(
                        "Rod {} must connect consecutive nodes, but nodes {} and {} are not adjacent",
                        rod.id, rod.start_node, rod.end_node
                    ),
                ));
            }
        }
    }

    for (index, count) in spans.iter().enumerate() {
        let (a, b) = (structure.nodes[index].id, structure.nodes[index + 1].id);
        match count {
            0 => violations.push(Violation::structure(format!(
                "No rod connects nodes {} and {}",
                a, b
            ))),
            1 => {}
            n => violations.push(Violation::structure(format!(
                "Nodes {} and {} are connected by {} rods; expected exactly one",
                a, b, n
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_rod_structure() -> StructureInput {
        StructureInput {
            rods: vec![
                Rod::new(1, 0, 1, 2.0, 0.01, 2e11, 1.5e8),
                Rod::new(2, 1, 2, 1.0, 0.02, 2e11, 1.5e8).with_distributed_load(-100.0),
            ],
            nodes: vec![Node::support(0), Node::free(1).with_force(2000.0), Node::free(2)],
        }
    }

    #[test]
    fn test_valid_structure() {
        let report = validate(&two_rod_structure());
        assert!(report.is_valid());
        assert!(report.is_clean());
    }

    #[test]
    fn test_count_mismatch_names_both_counts() {
        let mut structure = two_rod_structure();
        structure.nodes.push(Node::free(3));

        let report = validate(&structure);
        assert!(!report.is_valid());
        let msg = report
            .messages()
            .into_iter()
            .find(|m| m.contains("Node count"))
            .unwrap();
        assert!(msg.contains("4 nodes"));
        assert!(msg.contains("2 rods"));
    }

    #[test]
    fn test_interior_support_rejected() {
        let mut structure = two_rod_structure();
        structure.nodes[1].fixed = true;

        let report = validate(&structure);
        assert!(!report.is_valid());
        assert!(report
            .errors()
            .any(|v| v.subject == Subject::Node(1) && v.field.as_deref() == Some("fixed")));
    }

    #[test]
    fn test_both_ends_fixed_allowed() {
        let mut structure = two_rod_structure();
        structure.nodes[2].fixed = true;
        assert!(validate(&structure).is_clean());
    }

    #[test]
    fn test_no_support_is_advisory() {
        let mut structure = two_rod_structure();
        structure.nodes[0].fixed = false;

        let report = validate(&structure);
        assert!(report.is_valid());
        assert_eq!(report.advisories().count(), 1);
    }

    #[test]
    fn test_collects_all_rod_field_violations() {
        let mut structure = two_rod_structure();
        structure.rods[0].length = 0.0;
        structure.rods[0].area = -1.0;
        structure.rods[1].elastic_modulus = f64::NAN;
        structure.rods[1].allowable_stress = 0.0;

        let report = validate(&structure);
        let fields: Vec<_> = report
            .errors()
            .filter_map(|v| match v.subject {
                Subject::Rod(id) => Some((id, v.field.clone().unwrap_or_default())),
                _ => None,
            })
            .collect();

        assert!(fields.contains(&(1, "length".to_string())));
        assert!(fields.contains(&(1, "area".to_string())));
        assert!(fields.contains(&(2, "elastic_modulus".to_string())));
        assert!(fields.contains(&(2, "allowable_stress".to_string())));
    }

    #[test]
    fn test_duplicate_ids() {
        let mut structure = two_rod_structure();
        structure.rods[1].id = 1;
        let report = validate(&structure);
        assert!(report.messages().iter().any(|m| m.contains("Duplicate rod id 1")));
    }

    #[test]
    fn test_non_adjacent_rod() {
        let mut structure = two_rod_structure();
        structure.rods[1].start_node = 0;

        let report = validate(&structure);
        let messages = report.messages();
        assert!(messages.iter().any(|m| m.contains("not adjacent")));
        assert!(messages.iter().any(|m| m.contains("No rod connects nodes 1 and 2")));
    }

    #[test]
    fn test_missing_node_reference() {
        let mut structure = two_rod_structure();
        structure.rods[1].end_node = 9;
        let report = validate(&structure);
        assert!(report.messages().iter().any(|m| m.contains("end node 9 does not exist")));
    }

    #[test]
    fn test_rod_order_does_not_matter() {
        let mut structure = two_rod_structure();
        structure.rods.reverse();
        assert!(validate(&structure).is_clean());
    }

    #[test]
    fn test_empty_structure() {
        let report = validate(&StructureInput::default());
        let messages = report.messages();
        assert!(messages.iter().any(|m| m.contains("Node list must not be empty")));
        assert!(messages.iter().any(|m| m.contains("Rod list must not be empty")));
        assert!(messages.iter().any(|m| m.contains("0 nodes and 0 rods")));
    }

    #[test]
    fn test_into_result_keeps_only_errors() {
        let mut structure = two_rod_structure();
        structure.nodes[0].fixed = false;
        structure.rods[0].area = 0.0;

        match validate(&structure).into_result() {
            Err(CalcError::Validation { violations }) => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].field.as_deref(), Some("area"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
