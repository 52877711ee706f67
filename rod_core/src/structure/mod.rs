//! # Structure Model
//!
//! Entities describing a chain of axially loaded rods and the invariants
//! they must satisfy before a calculation is attempted.
//!
//! ## Topology
//!
//! ```text
//!  node 0      node 1      node 2           node n
//!    o==========o==========o  . . .  ==========o
//!       rod 1       rod 2                rod n
//! ```
//!
//! Rod `i` spans two consecutive nodes. Adjacency is explicit: each rod
//! names its `start_node` and `end_node`, and validation checks those ids
//! against the ordered node sequence.
//!
//! ## Example
//!
//! ```rust
//! use rod_core::structure::{Node, Rod, StructureInput, validate};
//!
//! let structure = StructureInput {
//!     rods: vec![Rod::new(1, 0, 1, 2.0, 0.01, 2e11, 1.5e8)],
//!     nodes: vec![Node::free(0), Node::support(1)],
//! };
//!
//! assert!(validate(&structure).is_valid());
//! ```

pub mod model;
pub mod validation;

pub use model::{RodPatch, StructureModel};
pub use validation::{validate, Severity, Subject, ValidationReport, Violation};

use serde::{Deserialize, Serialize};

/// A connection point between rods.
///
/// ## JSON Example
///
/// ```json
/// { "id": 1, "fixed": true, "external_force": 0.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node number; order in the sequence is the structural position
    pub id: u32,

    /// Rigid support (displacement forbidden)
    #[serde(default)]
    pub fixed: bool,

    /// Concentrated force F (N): > 0 tension, < 0 compression, 0 unloaded
    #[serde(default)]
    pub external_force: f64,
}

impl Node {
    /// Create an unsupported, unloaded node
    pub fn free(id: u32) -> Self {
        Node {
            id,
            fixed: false,
            external_force: 0.0,
        }
    }

    /// Create a support node
    pub fn support(id: u32) -> Self {
        Node {
            id,
            fixed: true,
            external_force: 0.0,
        }
    }

    /// Builder-style helper to attach a concentrated force
    pub fn with_force(mut self, force: f64) -> Self {
        self.external_force = force;
        self
    }
}

/// A 1-D structural member carrying axial load only.
///
/// ## JSON Example
///
/// ```json
/// {
///   "id": 1,
///   "start_node": 0,
///   "end_node": 1,
///   "length": 2.0,
///   "area": 0.01,
///   "elastic_modulus": 2e11,
///   "allowable_stress": 1.5e8,
///   "distributed_load": 0.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rod {
    /// Rod number
    pub id: u32,

    /// Id of the node at x = 0
    pub start_node: u32,

    /// Id of the node at x = length
    pub end_node: u32,

    /// Length L (m), > 0
    pub length: f64,

    /// Cross-sectional area A (m²), > 0
    pub area: f64,

    /// Elastic modulus E (Pa), > 0
    pub elastic_modulus: f64,

    /// Allowable stress [σ] (Pa), > 0
    pub allowable_stress: f64,

    /// Distributed load q (N/m): > 0 tension, < 0 compression, 0 none
    #[serde(default)]
    pub distributed_load: f64,
}

impl Rod {
    /// Create an unloaded rod between two nodes.
    pub fn new(
        id: u32,
        start_node: u32,
        end_node: u32,
        length: f64,
        area: f64,
        elastic_modulus: f64,
        allowable_stress: f64,
    ) -> Self {
        Rod {
            id,
            start_node,
            end_node,
            length,
            area,
            elastic_modulus,
            allowable_stress,
            distributed_load: 0.0,
        }
    }

    /// Builder-style helper to attach a distributed load
    pub fn with_distributed_load(mut self, q: f64) -> Self {
        self.distributed_load = q;
        self
    }

    /// Axial stiffness EA/L
    pub fn stiffness(&self) -> f64 {
        self.elastic_modulus * self.area / self.length
    }

    /// Whether this rod references the given node id
    pub fn touches(&self, node_id: u32) -> bool {
        self.start_node == node_id || self.end_node == node_id
    }
}

/// Ordered rods plus ordered nodes, as submitted to the solver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureInput {
    pub rods: Vec<Rod>,
    pub nodes: Vec<Node>,
}

impl StructureInput {
    /// Position of a node in the ordered sequence
    pub fn node_position(&self, node_id: u32) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == node_id)
    }

    /// Look up a node by id
    pub fn node(&self, node_id: u32) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// Look up a rod by id
    pub fn rod(&self, rod_id: u32) -> Option<&Rod> {
        self.rods.iter().find(|r| r.id == rod_id)
    }

    /// Whether position `index` is the first or last node
    pub fn is_end_position(&self, index: usize) -> bool {
        index == 0 || index + 1 == self.nodes.len()
    }

    /// Total length of the chain
    pub fn total_length(&self) -> f64 {
        self.rods.iter().map(|r| r.length).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_serialization_defaults() {
        let node: Node = serde_json::from_str(r#"{ "id": 3 }"#).unwrap();
        assert_eq!(node, Node::free(3));
    }

    #[test]
    fn test_rod_stiffness() {
        let rod = Rod::new(1, 0, 1, 2.0, 0.01, 2e11, 1.5e8);
        assert!((rod.stiffness() - 1e9).abs() < 1e-3);
        assert!(rod.touches(0));
        assert!(rod.touches(1));
        assert!(!rod.touches(2));
    }

    #[test]
    fn test_structure_lookups() {
        let structure = StructureInput {
            rods: vec![
                Rod::new(1, 0, 1, 2.0, 0.01, 2e11, 1.5e8),
                Rod::new(2, 1, 2, 3.0, 0.02, 2e11, 1.5e8),
            ],
            nodes: vec![Node::support(0), Node::free(1).with_force(500.0), Node::free(2)],
        };
        assert_eq!(structure.node_position(2), Some(2));
        assert_eq!(structure.node(1).map(|n| n.external_force), Some(500.0));
        assert_eq!(structure.rod(2).map(|r| r.length), Some(3.0));
        assert!(structure.is_end_position(0));
        assert!(!structure.is_end_position(1));
        assert!(structure.is_end_position(2));
        assert!((structure.total_length() - 5.0).abs() < 1e-12);
    }
}
