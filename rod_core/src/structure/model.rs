//! Editable structure aggregate.
//!
//! [`StructureModel`] owns a [`StructureInput`] and guards every edit. A
//! rejected edit returns an error and leaves the aggregate exactly as it
//! was; nothing is half-applied.
//!
//! ```rust
//! use rod_core::structure::{Node, Rod, StructureModel};
//!
//! let mut model = StructureModel::new();
//! model.add_node(Node::free(0)).unwrap();
//! model.add_node(Node::free(1)).unwrap();
//! model.add_node(Node::free(2)).unwrap();
//! model.add_rod(Rod::new(1, 0, 1, 2.0, 0.01, 2e11, 1.5e8)).unwrap();
//!
//! // Interior supports are refused and the node keeps its old value
//! assert!(model.set_fixed(1, true).is_err());
//! assert!(!model.input().nodes[1].fixed);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::validation::{interior_support_violation, positive_field_violation, rod_value_violations};
use super::{validate, Node, Rod, StructureInput, ValidationReport, Violation};
use crate::errors::{CalcError, CalcResult, EntityKind};

/// Partial update for a rod's physical properties.
///
/// Fields left as `None` are not touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RodPatch {
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub elastic_modulus: Option<f64>,
    #[serde(default)]
    pub allowable_stress: Option<f64>,
    #[serde(default)]
    pub distributed_load: Option<f64>,
}

/// Structure aggregate with guarded mutators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureModel {
    structure: StructureInput,
}

impl StructureModel {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing structure. No checks are run; call [`validate`](Self::validate).
    pub fn from_input(structure: StructureInput) -> Self {
        StructureModel { structure }
    }

    pub fn input(&self) -> &StructureInput {
        &self.structure
    }

    pub fn into_input(self) -> StructureInput {
        self.structure
    }

    /// Run the full invariant check on the current state
    pub fn validate(&self) -> ValidationReport {
        validate(&self.structure)
    }

    /// Append a node at the end of the chain.
    ///
    /// Refused when the id is taken, the force is not finite, or the current
    /// last node is a support that would become interior.
    pub fn add_node(&mut self, node: Node) -> CalcResult<()> {
        let mut violations = Vec::new();

        if self.structure.node(node.id).is_some() {
            violations.push(Violation::node(
                node.id,
                Some("id"),
                format!("Node id {} is already in use", node.id),
            ));
        }
        if !node.external_force.is_finite() {
            violations.push(Violation::node(
                node.id,
                Some("external_force"),
                format!("Node {}: external_force must be a finite number", node.id),
            ));
        }
        if self.structure.nodes.len() >= 2 {
            if let Some(last) = self.structure.nodes.last().filter(|n| n.fixed) {
                violations.push(Violation::node(
                    last.id,
                    Some("fixed"),
                    format!(
                        "Appending node {} would make support node {} interior; release it first",
                        node.id, last.id
                    ),
                ));
            }
        }

        reject_if_any("add_node", violations)?;
        debug!(node_id = node.id, "node added");
        self.structure.nodes.push(node);
        Ok(())
    }

    /// Remove a node that no rod references.
    pub fn remove_node(&mut self, node_id: u32) -> CalcResult<Node> {
        let index = self
            .structure
            .node_position(node_id)
            .ok_or_else(|| CalcError::not_found(EntityKind::Node, node_id))?;

        let violations: Vec<Violation> = self
            .structure
            .rods
            .iter()
            .filter(|rod| rod.touches(node_id))
            .map(|rod| {
                Violation::node(
                    node_id,
                    None,
                    format!(
                        "Node {} is referenced by rod {} and cannot be removed",
                        node_id, rod.id
                    ),
                )
            })
            .collect();

        reject_if_any("remove_node", violations)?;
        debug!(node_id, "node removed");
        Ok(self.structure.nodes.remove(index))
    }

    /// Mark or release a support. Only the first and last node may be fixed.
    pub fn set_fixed(&mut self, node_id: u32, fixed: bool) -> CalcResult<()> {
        let index = self
            .structure
            .node_position(node_id)
            .ok_or_else(|| CalcError::not_found(EntityKind::Node, node_id))?;

        if fixed && !self.structure.is_end_position(index) {
            reject_if_any("set_fixed", vec![interior_support_violation(node_id)])?;
        }

        self.structure.nodes[index].fixed = fixed;
        debug!(node_id, fixed, "support updated");
        Ok(())
    }

    /// Set the concentrated force on a node.
    pub fn set_external_force(&mut self, node_id: u32, force: f64) -> CalcResult<()> {
        let index = self
            .structure
            .node_position(node_id)
            .ok_or_else(|| CalcError::not_found(EntityKind::Node, node_id))?;

        if !force.is_finite() {
            reject_if_any(
                "set_external_force",
                vec![Violation::node(
                    node_id,
                    Some("external_force"),
                    format!("Node {}: external_force must be a finite number", node_id),
                )],
            )?;
        }

        self.structure.nodes[index].external_force = force;
        Ok(())
    }

    /// Add a rod between two consecutive, not yet connected nodes.
    pub fn add_rod(&mut self, rod: Rod) -> CalcResult<()> {
        let mut violations = Vec::new();

        if self.structure.rod(rod.id).is_some() {
            violations.push(Violation::rod(
                rod.id,
                Some("id"),
                format!("Rod id {} is already in use", rod.id),
            ));
        }
        violations.extend(rod_value_violations(&rod));
        violations.extend(self.adjacency_violations(&rod));

        reject_if_any("add_rod", violations)?;
        debug!(rod_id = rod.id, start = rod.start_node, end = rod.end_node, "rod added");
        self.structure.rods.push(rod);
        Ok(())
    }

    /// Remove a rod by id.
    pub fn remove_rod(&mut self, rod_id: u32) -> CalcResult<Rod> {
        let index = self
            .structure
            .rods
            .iter()
            .position(|r| r.id == rod_id)
            .ok_or_else(|| CalcError::not_found(EntityKind::Rod, rod_id))?;
        debug!(rod_id, "rod removed");
        Ok(self.structure.rods.remove(index))
    }

    /// Apply a partial update to a rod.
    ///
    /// Each field is checked on its own: valid fields are applied, invalid
    /// ones keep their previous value and are listed in the returned report.
    pub fn update_rod(&mut self, rod_id: u32, patch: RodPatch) -> CalcResult<ValidationReport> {
        let rod = self
            .structure
            .rods
            .iter_mut()
            .find(|r| r.id == rod_id)
            .ok_or_else(|| CalcError::not_found(EntityKind::Rod, rod_id))?;

        let mut rejected = Vec::new();
        let positive_fields = [
            ("length", patch.length, &mut rod.length),
            ("area", patch.area, &mut rod.area),
            ("elastic_modulus", patch.elastic_modulus, &mut rod.elastic_modulus),
            ("allowable_stress", patch.allowable_stress, &mut rod.allowable_stress),
        ];
        for (field, value, slot) in positive_fields {
            if let Some(value) = value {
                match positive_field_violation(rod_id, field, value) {
                    Some(violation) => rejected.push(violation),
                    None => *slot = value,
                }
            }
        }

        if let Some(q) = patch.distributed_load {
            if q.is_finite() {
                rod.distributed_load = q;
            } else {
                rejected.push(Violation::rod(
                    rod_id,
                    Some("distributed_load"),
                    format!("Rod {}: distributed_load must be a finite number", rod_id),
                ));
            }
        }

        if !rejected.is_empty() {
            warn!(rod_id, rejected = rejected.len(), "update_rod: some fields rejected");
        }
        Ok(ValidationReport { violations: rejected })
    }

    fn adjacency_violations(&self, rod: &Rod) -> Vec<Violation> {
        let start = self.structure.node_position(rod.start_node);
        let end = self.structure.node_position(rod.end_node);

        let (start, end) = match (start, end) {
            (Some(s), Some(e)) => (s, e),
            _ => {
                return vec![Violation::rod(
                    rod.id,
                    None,
                    format!(
                        "Rod {}: nodes {} and {} must both exist before the rod is added",
                        rod.id, rod.start_node, rod.end_node
                    ),
                )]
            }
        };

        if end != start + 1 {
            return vec![Violation::rod(
                rod.id,
                None,
                format!(
                    "Rod {} must connect consecutive nodes, but nodes {} and {} are not adjacent",
                    rod.id, rod.start_node, rod.end_node
                ),
            )];
        }

        self.structure
            .rods
            .iter()
            .filter(|other| other.start_node == rod.start_node && other.end_node == rod.end_node)
            .map(|other| {
                Violation::rod(
                    rod.id,
                    None,
                    format!(
                        "Nodes {} and {} are already connected by rod {}",
                        rod.start_node, rod.end_node, other.id
                    ),
                )
            })
            .collect()
    }
}

fn reject_if_any(operation: &str, violations: Vec<Violation>) -> CalcResult<()> {
    if violations.is_empty() {
        return Ok(());
    }
    warn!(operation, count = violations.len(), "edit rejected");
    Err(CalcError::validation(violations))
}
