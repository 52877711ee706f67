//! Report assembly.
//!
//! Merges the selected result artifacts into one serializable [`Report`].
//! Nothing here renders: the epure sections carry plain `(x, value)` series
//! and the tables carry plain numbers, ready for an external HTML/SVG/CSV
//! exporter.
//!
//! ```rust
//! use rod_core::postprocess::report::{assemble_report, ReportConfig, ReportInput};
//!
//! let config = ReportConfig::none().with_displacements(true);
//! let displacements = [0.0, 1e-6];
//! let report = assemble_report(&config, &ReportInput::new(&displacements, &[]), 20);
//!
//! assert!(report.displacements.is_some());
//! assert!(report.table.is_none());
//! ```

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fields;
use super::sampler::UniformStepRow;
use super::section::SectionQueryResult;
use crate::results::RodResult;
use crate::structure::{Node, StructureInput};

/// Which sections to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Rod/node layout of the structure
    pub construction: bool,
    /// Per-rod summary table
    pub table: bool,
    /// Axial force series
    pub epure_n: bool,
    /// Stress series
    pub epure_sigma: bool,
    /// Displacement series
    pub epure_u: bool,
    /// Nodal displacement vector
    pub displacements: bool,
    /// Section-query history (only if non-empty)
    pub section_calc: bool,
    /// Uniform-step table (only if non-empty)
    pub uniform_step: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            construction: true,
            table: true,
            epure_n: true,
            epure_sigma: true,
            epure_u: true,
            displacements: true,
            section_calc: true,
            uniform_step: false,
        }
    }
}

impl ReportConfig {
    /// Nothing selected
    pub fn none() -> Self {
        ReportConfig {
            construction: false,
            table: false,
            epure_n: false,
            epure_sigma: false,
            epure_u: false,
            displacements: false,
            section_calc: false,
            uniform_step: false,
        }
    }

    /// Everything selected
    pub fn all() -> Self {
        ReportConfig {
            uniform_step: true,
            ..Default::default()
        }
    }

    pub fn with_construction(mut self, on: bool) -> Self {
        self.construction = on;
        self
    }

    pub fn with_table(mut self, on: bool) -> Self {
        self.table = on;
        self
    }

    pub fn with_epures(mut self, on: bool) -> Self {
        self.epure_n = on;
        self.epure_sigma = on;
        self.epure_u = on;
        self
    }

    pub fn with_displacements(mut self, on: bool) -> Self {
        self.displacements = on;
        self
    }

    pub fn with_section_calc(mut self, on: bool) -> Self {
        self.section_calc = on;
        self
    }

    pub fn with_uniform_step(mut self, on: bool) -> Self {
        self.uniform_step = on;
        self
    }
}

/// Artifacts a report can draw from.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub displacements: &'a [f64],
    pub rods: &'a [RodResult],
    /// Source structure, for node ids and support/force details
    pub structure: Option<&'a StructureInput>,
    pub history: Option<&'a [SectionQueryResult]>,
    pub step_table: Option<&'a [UniformStepRow]>,
}

impl<'a> ReportInput<'a> {
    pub fn new(displacements: &'a [f64], rods: &'a [RodResult]) -> Self {
        ReportInput {
            displacements,
            rods,
            structure: None,
            history: None,
            step_table: None,
        }
    }

    pub fn with_structure(mut self, structure: &'a StructureInput) -> Self {
        self.structure = Some(structure);
        self
    }

    pub fn with_history(mut self, history: &'a [SectionQueryResult]) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_step_table(mut self, rows: &'a [UniformStepRow]) -> Self {
        self.step_table = Some(rows);
        self
    }
}

/// Summary line for one rod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RodSummaryRow {
    pub id: u32,
    pub length: f64,
    pub area: f64,
    pub allowable_stress: f64,
    pub max_stress_on_the_rod: f64,
    /// |σmax| ≤ [σ]
    pub is_safe: bool,
    /// |σmax| / [σ]
    pub utilization: f64,
    /// N(0)
    pub n_start: f64,
    /// N(length)
    pub n_end: f64,
}

impl From<&RodResult> for RodSummaryRow {
    fn from(rod: &RodResult) -> Self {
        RodSummaryRow {
            id: rod.id(),
            length: rod.length(),
            area: rod.rod.area,
            allowable_stress: rod.rod.allowable_stress,
            max_stress_on_the_rod: rod.max_stress_on_the_rod,
            is_safe: rod.is_safe(),
            utilization: rod.utilization(),
            n_start: fields::axial_force(rod, 0.0),
            n_end: fields::axial_force(rod, rod.length()),
        }
    }
}

/// Displacement of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDisplacement {
    pub node_id: u32,
    pub value: f64,
}

/// One rod in the construction section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionRod {
    pub id: u32,
    /// Global coordinate of the rod start along the chain
    pub offset: f64,
    pub length: f64,
    pub area: f64,
    pub elastic_modulus: f64,
    pub distributed_load: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionSection {
    pub total_length: f64,
    pub rods: Vec<ConstructionRod>,
}

/// Physical field plotted by an epure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    AxialForce,
    Stress,
    Displacement,
}

impl Field {
    pub fn symbol(&self) -> &'static str {
        match self {
            Field::AxialForce => "N",
            Field::Stress => "σ",
            Field::Displacement => "u",
        }
    }

    /// SI unit of the field values
    pub fn unit(&self) -> &'static str {
        match self {
            Field::AxialForce => "N",
            Field::Stress => "Pa",
            Field::Displacement => "m",
        }
    }

    fn eval(&self, rod: &RodResult, x: f64) -> f64 {
        match self {
            Field::AxialForce => fields::axial_force(rod, x),
            Field::Stress => fields::stress(rod, x),
            Field::Displacement => fields::displacement(rod, x),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpurePoint {
    /// Rod-local coordinate
    pub x: f64,
    pub value: f64,
}

/// Series for one rod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpureSeries {
    pub rod_id: u32,
    /// Global coordinate of the rod start along the chain
    pub offset: f64,
    pub points: Vec<EpurePoint>,
}

/// Diagram data for one field over the whole structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Epure {
    pub field: Field,
    pub unit: String,
    pub min: f64,
    pub max: f64,
    pub series: Vec<EpureSeries>,
}

/// Assembled report. Unselected sections are `None` and omitted from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub rod_count: usize,
    pub node_count: usize,
    /// Every rod passes the strength check
    pub all_safe: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction: Option<ConstructionSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displacements: Option<Vec<NodeDisplacement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Vec<RodSummaryRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epure_n: Option<Epure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epure_sigma: Option<Epure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epure_u: Option<Epure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_calc: Option<Vec<SectionQueryResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniform_step: Option<Vec<UniformStepRow>>,
}

impl Report {
    /// Names of the sections present, in document order
    pub fn section_names(&self) -> Vec<&'static str> {
        [
            ("construction", self.construction.is_some()),
            ("displacements", self.displacements.is_some()),
            ("table", self.table.is_some()),
            ("epure_n", self.epure_n.is_some()),
            ("epure_sigma", self.epure_sigma.is_some()),
            ("epure_u", self.epure_u.is_some()),
            ("section_calc", self.section_calc.is_some()),
            ("uniform_step", self.uniform_step.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

/// Build a report from the selected sections.
///
/// `epure_resolution` is the number of segments each rod is split into for
/// the epure series (at least one).
pub fn assemble_report(config: &ReportConfig, input: &ReportInput<'_>, epure_resolution: usize) -> Report {
    let offsets = rod_offsets(input.rods, input.structure);
    let epure = |field: Field| build_epure(field, input.rods, &offsets, epure_resolution.max(1));

    let report = Report {
        generated_at: Utc::now(),
        rod_count: input.rods.len(),
        node_count: input
            .structure
            .map(|s| s.nodes.len())
            .unwrap_or(input.rods.len() + 1),
        all_safe: input.rods.iter().all(RodResult::is_safe),
        construction: config
            .construction
            .then(|| build_construction(input.rods, &offsets, input.structure)),
        displacements: config
            .displacements
            .then(|| build_displacements(input.displacements, input.structure)),
        table: config
            .table
            .then(|| input.rods.iter().map(RodSummaryRow::from).collect()),
        epure_n: config.epure_n.then(|| epure(Field::AxialForce)),
        epure_sigma: config.epure_sigma.then(|| epure(Field::Stress)),
        epure_u: config.epure_u.then(|| epure(Field::Displacement)),
        section_calc: input
            .history
            .filter(|h| config.section_calc && !h.is_empty())
            .map(<[SectionQueryResult]>::to_vec),
        uniform_step: input
            .step_table
            .filter(|t| config.uniform_step && !t.is_empty())
            .map(<[UniformStepRow]>::to_vec),
    };

    debug!(sections = ?report.section_names(), "report assembled");
    report
}

/// Global start coordinate of each rod, indexed like `rods`.
///
/// Lengths accumulate in chain order, not slice order.
fn rod_offsets(rods: &[RodResult], structure: Option<&StructureInput>) -> Vec<f64> {
    let mut offsets = vec![0.0; rods.len()];
    let mut acc = 0.0;
    for index in chain_order(rods, structure) {
        offsets[index] = acc;
        acc += rods[index].length();
    }
    offsets
}

/// Rod indices from the left end of the chain to the right.
///
/// Uses node positions when a structure covering every rod is given,
/// otherwise follows `end_node -> start_node` links. Falls back to slice
/// order when the links do not form a single chain.
fn chain_order(rods: &[RodResult], structure: Option<&StructureInput>) -> Vec<usize> {
    if let Some(structure) = structure {
        let positions: Option<Vec<usize>> = rods
            .iter()
            .map(|r| structure.node_position(r.rod.start_node))
            .collect();
        if let Some(positions) = positions {
            let mut order: Vec<usize> = (0..rods.len()).collect();
            order.sort_by_key(|&i| positions[i]);
            return order;
        }
    }

    let by_start: HashMap<u32, usize> = rods
        .iter()
        .enumerate()
        .map(|(i, r)| (r.rod.start_node, i))
        .collect();
    let ends: HashSet<u32> = rods.iter().map(|r| r.rod.end_node).collect();
    let head = rods.iter().position(|r| !ends.contains(&r.rod.start_node));

    let mut order = Vec::with_capacity(rods.len());
    let mut next = head;
    while let Some(index) = next {
        if order.len() == rods.len() {
            break;
        }
        order.push(index);
        next = by_start.get(&rods[index].rod.end_node).copied();
    }

    if order.len() == rods.len() && by_start.len() == rods.len() {
        order
    } else {
        (0..rods.len()).collect()
    }
}

fn build_construction(
    rods: &[RodResult],
    offsets: &[f64],
    structure: Option<&StructureInput>,
) -> ConstructionSection {
    let node = |id: u32| structure.and_then(|s| s.node(id)).cloned();
    ConstructionSection {
        total_length: rods.iter().map(RodResult::length).sum(),
        rods: rods
            .iter()
            .zip(offsets)
            .map(|(rod, &offset)| ConstructionRod {
                id: rod.id(),
                offset,
                length: rod.length(),
                area: rod.rod.area,
                elastic_modulus: rod.rod.elastic_modulus,
                distributed_load: rod.rod.distributed_load,
                start: node(rod.rod.start_node),
                end: node(rod.rod.end_node),
            })
            .collect(),
    }
}

fn build_displacements(displacements: &[f64], structure: Option<&StructureInput>) -> Vec<NodeDisplacement> {
    displacements
        .iter()
        .enumerate()
        .map(|(index, &value)| NodeDisplacement {
            node_id: structure
                .and_then(|s| s.nodes.get(index))
                .map(|n| n.id)
                .unwrap_or(index as u32),
            value,
        })
        .collect()
}

fn build_epure(field: Field, rods: &[RodResult], offsets: &[f64], resolution: usize) -> Epure {
    let series: Vec<EpureSeries> = rods
        .iter()
        .zip(offsets)
        .map(|(rod, &offset)| EpureSeries {
            rod_id: rod.id(),
            offset,
            points: (0..=resolution)
                .map(|i| {
                    // last point pinned to the exact length
                    let x = if i == resolution {
                        rod.length()
                    } else {
                        rod.length() * i as f64 / resolution as f64
                    };
                    EpurePoint {
                        x,
                        value: field.eval(rod, x),
                    }
                })
                .collect(),
        })
        .collect();

    let values = series.iter().flat_map(|s| s.points.iter().map(|p| p.value));
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    Epure {
        field,
        unit: field.unit().to_string(),
        min: if series.is_empty() { 0.0 } else { min },
        max: if series.is_empty() { 0.0 } else { max },
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postprocess::sampler::sample;
    use crate::postprocess::section::SectionQueryService;
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
                axial_force_coeffs: LinearCoeffs::new(300.0, -100.0),
                stress_coeffs: LinearCoeffs::new(3e5, -1e5),
                displacement_coeffs: QuadraticCoeffs::new(1e-6, 1e-6, -2.5e-7),
                max_stress_on_the_rod: 3e5,
            },
        ]
    }

    fn structure() -> StructureInput {
        StructureInput {
            rods: rods().into_iter().map(|r| r.rod).collect(),
            nodes: vec![Node::support(10), Node::free(11), Node::free(12).with_force(300.0)],
        }
    }

    #[test]
    fn test_summary_rows() {
        let rods = rods();
        let report = assemble_report(&ReportConfig::none().with_table(true), &ReportInput::new(&[], &rods), 4);
        let table = report.table.unwrap();

        assert_eq!(table.len(), 2);
        assert!(table[0].is_safe);
        assert_eq!(table[0].n_start, 1000.0);
        assert_eq!(table[0].n_end, 1000.0);
        assert!(!table[1].is_safe);
        assert_eq!(table[1].n_start, 300.0);
        assert_eq!(table[1].n_end, 200.0);
        assert!((table[1].utilization - 3.0).abs() < 1e-12);
        assert!(!report.all_safe);
    }

    #[test]
    fn test_only_selected_sections() {
        let rods = rods();
        let displacements = [0.0, 1e-6, 2e-6];
        let config = ReportConfig::none().with_displacements(true).with_epures(true);
        let report = assemble_report(&config, &ReportInput::new(&displacements, &rods), 4);

        assert_eq!(
            report.section_names(),
            vec!["displacements", "epure_n", "epure_sigma", "epure_u"]
        );

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("table").is_none());
        assert!(json.get("construction").is_none());
    }

    #[test]
    fn test_section_calc_requires_request_and_content() {
        let rods = rods();
        let mut service = SectionQueryService::default();

        let empty = service.history();
        let input = ReportInput::new(&[], &rods).with_history(&empty);
        assert!(assemble_report(&ReportConfig::all(), &input, 4).section_calc.is_none());

        service.query(&rods, 1, 0.5).unwrap();
        let history = service.history();
        let input = ReportInput::new(&[], &rods).with_history(&history);
        assert_eq!(
            assemble_report(&ReportConfig::all(), &input, 4).section_calc.map(|h| h.len()),
            Some(1)
        );
        let config = ReportConfig::all().with_section_calc(false);
        assert!(assemble_report(&config, &input, 4).section_calc.is_none());
    }

    #[test]
    fn test_uniform_step_section() {
        let rods = rods();
        let table = sample(&rods, 0.5);
        let input = ReportInput::new(&[], &rods).with_step_table(&table);

        let report = assemble_report(&ReportConfig::default(), &input, 4);
        assert!(report.uniform_step.is_none());

        let report = assemble_report(&ReportConfig::all(), &input, 4);
        assert_eq!(report.uniform_step.map(|t| t.len()), Some(table.len()));
    }

    #[test]
    fn test_displacements_use_node_ids() {
        let rods = rods();
        let structure = structure();
        let displacements = [0.0, 1e-6, 2e-6];

        let input = ReportInput::new(&displacements, &rods).with_structure(&structure);
        let report = assemble_report(&ReportConfig::none().with_displacements(true), &input, 4);
        let ids: Vec<u32> = report.displacements.unwrap().iter().map(|d| d.node_id).collect();
        assert_eq!(ids, vec![10, 11, 12]);

        let input = ReportInput::new(&displacements, &rods);
        let report = assemble_report(&ReportConfig::none().with_displacements(true), &input, 4);
        let ids: Vec<u32> = report.displacements.unwrap().iter().map(|d| d.node_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_construction_section() {
        let mut rods = rods();
        for (rod, (start, end)) in rods.iter_mut().zip([(10, 11), (11, 12)]) {
            rod.rod.start_node = start;
            rod.rod.end_node = end;
        }
        let structure = structure();
        let input = ReportInput::new(&[], &rods).with_structure(&structure);
        let report = assemble_report(&ReportConfig::none().with_construction(true), &input, 4);
        let construction = report.construction.unwrap();

        assert_eq!(construction.total_length, 3.0);
        assert_eq!(construction.rods[1].offset, 2.0);
        assert!(construction.rods[0].start.as_ref().unwrap().fixed);
        assert_eq!(construction.rods[1].end.as_ref().unwrap().external_force, 300.0);
        assert_eq!(report.node_count, 3);
    }

    #[test]
    fn test_epure_series() {
        let rods = rods();
        let report = assemble_report(&ReportConfig::none().with_epures(true), &ReportInput::new(&[], &rods), 4);

        let epure = report.epure_n.unwrap();
        assert_eq!(epure.field, Field::AxialForce);
        assert_eq!(epure.unit, "N");
        assert_eq!(epure.series.len(), 2);
        assert_eq!(epure.series[0].points.len(), 5);
        assert_eq!(epure.series[1].points.last().unwrap().x, 1.0);
        assert_eq!(epure.max, 1000.0);
        assert_eq!(epure.min, 200.0);

        let epure_u = report.epure_u.unwrap();
        assert_eq!(epure_u.series[0].points[2].value, 5e-7);
    }

    #[test]
    fn test_empty_rod_set() {
        let report = assemble_report(&ReportConfig::all(), &ReportInput::new(&[], &[]), 4);
        assert_eq!(report.rod_count, 0);
        assert_eq!(report.node_count, 1);
        assert!(report.all_safe);
        let epure = report.epure_sigma.unwrap();
        assert_eq!((epure.min, epure.max), (0.0, 0.0));
    }

    #[test]
    fn test_offsets_follow_chain_not_slice_order() {
        let mut rods = rods();
        rods.reverse();
        let config = ReportConfig::none().with_construction(true).with_epures(true);

        let report = assemble_report(&config, &ReportInput::new(&[], &rods), 4);
        let offsets: Vec<(u32, f64)> = report
            .construction
            .unwrap()
            .rods
            .iter()
            .map(|r| (r.id, r.offset))
            .collect();
        assert_eq!(offsets, vec![(2, 2.0), (1, 0.0)]);
        let epure: Vec<(u32, f64)> = report.epure_n.unwrap().series.iter().map(|s| (s.rod_id, s.offset)).collect();
        assert_eq!(epure, vec![(2, 2.0), (1, 0.0)]);
    }

    #[test]
    fn test_offsets_from_structure_node_order() {
        let mut rods = rods();
        for (rod, (start, end)) in rods.iter_mut().zip([(10, 11), (11, 12)]) {
            rod.rod.start_node = start;
            rod.rod.end_node = end;
        }
        rods.reverse();
        let structure = structure();
        let input = ReportInput::new(&[], &rods).with_structure(&structure);

        let report = assemble_report(&ReportConfig::none().with_construction(true), &input, 4);
        let construction = report.construction.unwrap();
        assert_eq!(construction.rods[0].id, 2);
        assert_eq!(construction.rods[0].offset, 2.0);
        assert_eq!(construction.rods[1].offset, 0.0);
    }

    #[test]
    fn test_broken_chain_keeps_slice_order() {
        let mut rods = rods();
        rods[1].rod.start_node = 7;
        rods[1].rod.end_node = 8;
        let offsets = rod_offsets(&rods, None);
        assert_eq!(offsets, vec![0.0, 2.0]);
    }
}
