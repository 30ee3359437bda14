//! Directed weighted conversion graph over units of measure.
//!
//! Built once per computation pass from the tenant's conversion edges and
//! immutable afterwards. Reachability and the numeric factor are both
//! resolved by the same breadth-first walk, so `can_convert` and `convert`
//! always agree: factors compose across multi-hop paths.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::unit::{units_equivalent, UnitOfMeasure};

/// A directed conversion: `qty_in_to = qty_in_from × factor`.
///
/// Edges do not auto-generate inverses; callers record both directions where
/// a conversion is truly bidirectional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionEdge {
    pub from: UnitOfMeasure,
    pub to: UnitOfMeasure,
    pub factor: f64,
}

impl ConversionEdge {
    pub fn new(from: UnitOfMeasure, to: UnitOfMeasure, factor: f64) -> Self {
        Self { from, to, factor }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// No edge path connects the two units. Callers must treat this as a hard
    /// stop for the record being normalized; defaulting to the unconverted
    /// quantity would corrupt costing.
    #[error("no conversion path from '{from}' to '{to}'")]
    NoConversionPath { from: String, to: String },
}

/// Adjacency entry: target node index and the step factor.
type Adjacency = Vec<Vec<(usize, f64)>>;

/// Directed weighted graph answering "can A convert to B" and "what factor
/// converts a quantity in A to B".
#[derive(Debug, Clone, Default)]
pub struct UnitConversionGraph {
    nodes: Vec<UnitOfMeasure>,
    adjacency: Adjacency,
}

impl UnitConversionGraph {
    /// Graph with no edges: only equivalent units convert (at factor 1).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the graph from an edge set.
    ///
    /// Units are interned by the equivalence rule, so an edge registered with
    /// a unit's id and a lookup arriving with its code land on the same node.
    /// Duplicate edges are kept as parallel candidates; the walk takes the
    /// shortest path, first-registered edge first.
    pub fn build(edges: &[ConversionEdge]) -> Self {
        let mut graph = Self::empty();
        for edge in edges {
            let from = graph.intern(&edge.from);
            let to = graph.intern(&edge.to);
            graph.adjacency[from].push((to, edge.factor));
        }
        graph
    }

    pub fn unit_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// True when the two units are the same by the alias rule, or some edge
    /// path (directly or transitively) leads from `from` to `to`.
    pub fn can_convert(&self, from: &UnitOfMeasure, to: &UnitOfMeasure) -> bool {
        if units_equivalent(from, to) {
            return true;
        }
        match (self.node_of(from), self.node_of(to)) {
            (Some(start), Some(goal)) => self.walk(start, goal).is_some(),
            _ => false,
        }
    }

    /// Convert `qty` from one unit to another.
    ///
    /// Equivalent units return `qty` unchanged. Otherwise the walk composes
    /// the step factors along the discovered path; an unreachable target is a
    /// [`ConversionError::NoConversionPath`].
    pub fn convert(
        &self,
        qty: f64,
        from: &UnitOfMeasure,
        to: &UnitOfMeasure,
    ) -> Result<f64, ConversionError> {
        if units_equivalent(from, to) {
            return Ok(qty);
        }
        let factor = match (self.node_of(from), self.node_of(to)) {
            (Some(start), Some(goal)) => self.walk(start, goal),
            _ => None,
        };
        match factor {
            Some(f) => Ok(qty * f),
            None => Err(ConversionError::NoConversionPath {
                from: from.code.clone(),
                to: to.code.clone(),
            }),
        }
    }

    /// Intern a unit, returning the index of its equivalence node.
    fn intern(&mut self, unit: &UnitOfMeasure) -> usize {
        if let Some(idx) = self.node_of(unit) {
            return idx;
        }
        self.nodes.push(unit.clone());
        self.adjacency.push(Vec::new());
        self.nodes.len() - 1
    }

    fn node_of(&self, unit: &UnitOfMeasure) -> Option<usize> {
        self.nodes.iter().position(|n| units_equivalent(n, unit))
    }

    /// Breadth-first walk from `start` carrying the cumulative factor;
    /// the visited set guards against cycles.
    fn walk(&self, start: usize, goal: usize) -> Option<f64> {
        if start == goal {
            return Some(1.0);
        }
        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::new();
        visited[start] = true;
        queue.push_back((start, 1.0_f64));

        while let Some((node, factor)) = queue.pop_front() {
            for &(next, step) in &self.adjacency[node] {
                if next == goal {
                    return Some(factor * step);
                }
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back((next, factor * step));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use stocktally_core::UnitId;

    fn unit(code: &str) -> UnitOfMeasure {
        UnitOfMeasure::new(UnitId::new(), code)
    }

    #[test]
    fn direct_edge_converts() {
        let kg = unit("KG");
        let g = unit("G");
        let graph = UnitConversionGraph::build(&[ConversionEdge::new(kg.clone(), g.clone(), 1000.0)]);

        assert!(graph.can_convert(&kg, &g));
        assert_eq!(graph.convert(2.0, &kg, &g).unwrap(), 2000.0);
    }

    #[test]
    fn missing_path_is_a_hard_error() {
        let kg = unit("KG");
        let g = unit("G");
        let liter = unit("LITER");
        let graph = UnitConversionGraph::build(&[ConversionEdge::new(kg, g.clone(), 1000.0)]);

        assert!(!graph.can_convert(&g, &liter));
        let err = graph.convert(5.0, &g, &liter).unwrap_err();
        assert_eq!(
            err,
            ConversionError::NoConversionPath {
                from: "G".to_string(),
                to: "LITER".to_string(),
            }
        );
    }

    #[test]
    fn edges_are_directed() {
        let kg = unit("KG");
        let g = unit("G");
        let graph = UnitConversionGraph::build(&[ConversionEdge::new(kg.clone(), g.clone(), 1000.0)]);

        assert!(!graph.can_convert(&g, &kg));
        assert!(graph.convert(1.0, &g, &kg).is_err());
    }

    #[test]
    fn multi_hop_factors_compose() {
        let kg = unit("KG");
        let g = unit("G");
        let mg = unit("MG");
        let graph = UnitConversionGraph::build(&[
            ConversionEdge::new(kg.clone(), g.clone(), 1000.0),
            ConversionEdge::new(g, mg.clone(), 1000.0),
        ]);

        assert!(graph.can_convert(&kg, &mg));
        assert_eq!(graph.convert(2.0, &kg, &mg).unwrap(), 2_000_000.0);
    }

    #[test]
    fn cycles_terminate() {
        let a = unit("A");
        let b = unit("B");
        let c = unit("C");
        let graph = UnitConversionGraph::build(&[
            ConversionEdge::new(a.clone(), b.clone(), 2.0),
            ConversionEdge::new(b, a.clone(), 0.5),
        ]);

        assert!(!graph.can_convert(&a, &c));
        assert!(graph.convert(1.0, &a, &c).is_err());
    }

    #[test]
    fn equivalent_units_bypass_the_graph() {
        let by_id = UnitId::new();
        let a = UnitOfMeasure::new(by_id, "KG");
        let b = UnitOfMeasure::new(by_id, "kilogram");
        let graph = UnitConversionGraph::empty();

        assert!(graph.can_convert(&a, &b));
        assert_eq!(graph.convert(7.25, &a, &b).unwrap(), 7.25);
    }

    #[test]
    fn edge_registered_by_id_found_by_code() {
        let kg_id = UnitId::new();
        let kg_master = UnitOfMeasure::new(kg_id, "KG");
        let g = unit("G");
        let graph =
            UnitConversionGraph::build(&[ConversionEdge::new(kg_master, g.clone(), 1000.0)]);

        // Same unit arriving under a different id but the same code.
        let kg_alias = UnitOfMeasure::new(UnitId::new(), "kg");
        assert!(graph.can_convert(&kg_alias, &g));
        assert_eq!(graph.convert(3.0, &kg_alias, &g).unwrap(), 3000.0);
    }

    #[test]
    fn duplicate_edges_are_parallel_candidates() {
        let kg = unit("KG");
        let g = unit("G");
        let graph = UnitConversionGraph::build(&[
            ConversionEdge::new(kg.clone(), g.clone(), 1000.0),
            ConversionEdge::new(kg.clone(), g.clone(), 999.0),
        ]);

        // First-registered edge wins at equal depth.
        assert_eq!(graph.convert(1.0, &kg, &g).unwrap(), 1000.0);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.unit_count(), 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: converting between equivalent-by-code units returns the
        /// quantity unchanged for any quantity, with or without edges.
        #[test]
        fn conversion_roundtrip_for_equivalent_units(qty in -1.0e9_f64..1.0e9_f64) {
            let a = UnitOfMeasure::new(UnitId::new(), "Kg");
            let b = UnitOfMeasure::new(UnitId::new(), "kG");
            let graph = UnitConversionGraph::build(&[
                ConversionEdge::new(a.clone(), UnitOfMeasure::new(UnitId::new(), "G"), 1000.0),
            ]);

            prop_assert_eq!(graph.convert(qty, &a, &b).unwrap(), qty);
            prop_assert_eq!(graph.convert(qty, &b, &a).unwrap(), qty);
        }
    }
}
