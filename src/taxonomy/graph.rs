//! Concept taxonomy backed by a directed-graph arena.
//!
//! Vertices and edges live in contiguous storage and are addressed by
//! integer indices; external concept ids are interned once at insertion.
//! Topology is immutable after construction — only the derived model
//! attributes (probabilities, IC values, edge weights) are written later,
//! by the fitting passes.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::{Error, Result};

/// External stable identifier for a concept.
pub type ConceptId = u64;

/// A taxonomy vertex: raw corpus evidence plus fitted model values.
#[derive(Debug, Clone)]
pub struct Concept {
    /// External stable id.
    pub id: ConceptId,
    /// Raw corpus frequency. Defaults to 0.0 for unseen concepts.
    pub frequency: f64,
    /// Absolute probability, `None` until propagation has run.
    pub probability: Option<f64>,
    /// Information content (`-log2(probability)`), `None` until propagation.
    pub ic: Option<f64>,
}

impl Concept {
    fn new(id: ConceptId) -> Self {
        Self {
            id,
            frequency: 0.0,
            probability: None,
            ic: None,
        }
    }
}

/// Derived attributes of a parent→child is-a edge.
#[derive(Debug, Clone, Default)]
pub struct IsA {
    /// Probability of the child given the parent, in (0, 1].
    /// `None` until the edge-weighting pass has run.
    pub cond_probability: Option<f64>,
    /// `-log2(cond_probability)`, ≥ 0. `None` until the edge pass.
    pub weight: Option<f64>,
}

/// A concept taxonomy: a DAG of is-a (parent→child) edges.
///
/// The fitter assumes a partial order compatible with parent-before-child
/// propagation; cycles are not rejected here (see
/// [`validate_taxonomy`](crate::taxonomy::validate_taxonomy) for the
/// structural check).
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    graph: DiGraph<Concept, IsA>,
    index: HashMap<ConceptId, NodeIndex>,
}

impl Taxonomy {
    /// Create an empty taxonomy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty taxonomy with preallocated capacity.
    pub fn with_capacity(concepts: usize, edges: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(concepts, edges),
            index: HashMap::with_capacity(concepts),
        }
    }

    /// Number of concepts.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the taxonomy holds no concepts.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of is-a edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Register a concept. Fails if the id is already present.
    pub fn add_concept(&mut self, id: ConceptId) -> Result<()> {
        if self.index.contains_key(&id) {
            return Err(Error::DuplicateConcept { id });
        }
        let ix = self.graph.add_node(Concept::new(id));
        let _ = self.index.insert(id, ix);
        Ok(())
    }

    /// Register a parent→child is-a edge between existing concepts.
    ///
    /// Fails if either id is unknown or the edge already exists.
    pub fn add_is_a(&mut self, parent: ConceptId, child: ConceptId) -> Result<()> {
        let p = self.index_of(parent)?;
        let c = self.index_of(child)?;
        if self.graph.find_edge(p, c).is_some() {
            return Err(Error::DuplicateEdge { parent, child });
        }
        let _ = self.graph.add_edge(p, c, IsA::default());
        Ok(())
    }

    /// Every concept id, exactly once. Order is unspecified.
    pub fn concepts(&self) -> impl Iterator<Item = ConceptId> + '_ {
        self.graph.node_indices().map(move |ix| self.graph[ix].id)
    }

    /// Direct children of a concept. Empty for leaves.
    pub fn children(&self, id: ConceptId) -> Result<Vec<ConceptId>> {
        let ix = self.index_of(id)?;
        Ok(self
            .graph
            .neighbors_directed(ix, Direction::Outgoing)
            .map(|c| self.graph[c].id)
            .collect())
    }

    /// Direct parents of a concept. Empty for roots.
    pub fn parents(&self, id: ConceptId) -> Result<Vec<ConceptId>> {
        let ix = self.index_of(id)?;
        Ok(self
            .graph
            .neighbors_directed(ix, Direction::Incoming)
            .map(|p| self.graph[p].id)
            .collect())
    }

    /// Concepts with no parents.
    pub fn roots(&self) -> Vec<ConceptId> {
        self.graph
            .externals(Direction::Incoming)
            .map(|ix| self.graph[ix].id)
            .collect()
    }

    /// Concepts with no children.
    pub fn leaves(&self) -> Vec<ConceptId> {
        self.graph
            .externals(Direction::Outgoing)
            .map(|ix| self.graph[ix].id)
            .collect()
    }

    /// Read a concept's raw frequency and fitted values.
    pub fn concept(&self, id: ConceptId) -> Result<&Concept> {
        let ix = self.index_of(id)?;
        Ok(&self.graph[ix])
    }

    /// Write a concept's raw frequency.
    ///
    /// Negative and non-finite values are rejected here, at the loading
    /// boundary — the fitter itself never validates frequencies.
    pub fn set_frequency(&mut self, id: ConceptId, frequency: f64) -> Result<()> {
        if !frequency.is_finite() || frequency < 0.0 {
            return Err(Error::NegativeFrequency {
                id,
                value: frequency,
            });
        }
        let ix = self.index_of(id)?;
        self.graph[ix].frequency = frequency;
        Ok(())
    }

    /// A concept's raw frequency.
    pub fn frequency(&self, id: ConceptId) -> Result<f64> {
        Ok(self.concept(id)?.frequency)
    }

    /// A concept's fitted absolute probability, if propagation has run.
    pub fn probability(&self, id: ConceptId) -> Result<Option<f64>> {
        Ok(self.concept(id)?.probability)
    }

    /// A concept's fitted information content, if propagation has run.
    pub fn ic(&self, id: ConceptId) -> Result<Option<f64>> {
        Ok(self.concept(id)?.ic)
    }

    /// Conditional probability stored on the parent→child edge.
    ///
    /// Fails with [`Error::EdgeNotFound`] if `child` is not a direct
    /// child of `parent`.
    pub fn cond_probability(&self, parent: ConceptId, child: ConceptId) -> Result<Option<f64>> {
        let e = self.edge_between(parent, child)?;
        Ok(e.cond_probability)
    }

    /// Information-content weight stored on the parent→child edge.
    pub fn edge_weight(&self, parent: ConceptId, child: ConceptId) -> Result<Option<f64>> {
        let e = self.edge_between(parent, child)?;
        Ok(e.weight)
    }

    /// Bulk-reset every fitted attribute (probabilities, IC values, edge
    /// weights), leaving topology and raw frequencies intact.
    ///
    /// Allows the same taxonomy to be re-fitted against another
    /// frequency source.
    pub fn clear_model(&mut self) {
        for w in self.graph.node_weights_mut() {
            w.probability = None;
            w.ic = None;
        }
        for e in self.graph.edge_weights_mut() {
            e.cond_probability = None;
            e.weight = None;
        }
    }

    fn edge_between(&self, parent: ConceptId, child: ConceptId) -> Result<&IsA> {
        let p = self.index_of(parent)?;
        let c = self.index_of(child)?;
        let e = self
            .graph
            .find_edge(p, c)
            .ok_or(Error::EdgeNotFound { parent, child })?;
        Ok(&self.graph[e])
    }

    pub(crate) fn index_of(&self, id: ConceptId) -> Result<NodeIndex> {
        self.index
            .get(&id)
            .copied()
            .ok_or(Error::UnknownConcept { id })
    }

    pub(crate) fn id_of(&self, ix: NodeIndex) -> ConceptId {
        self.graph[ix].id
    }

    pub(crate) fn graph(&self) -> &DiGraph<Concept, IsA> {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut DiGraph<Concept, IsA> {
        &mut self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Taxonomy {
        // 0 -> {1, 2}, {1, 2} -> 3
        let mut t = Taxonomy::new();
        for id in 0..4 {
            t.add_concept(id).unwrap();
        }
        t.add_is_a(0, 1).unwrap();
        t.add_is_a(0, 2).unwrap();
        t.add_is_a(1, 3).unwrap();
        t.add_is_a(2, 3).unwrap();
        t
    }

    #[test]
    fn construction_and_neighbors() {
        let t = diamond();
        assert_eq!(t.len(), 4);
        assert_eq!(t.edge_count(), 4);

        let mut children = t.children(0).unwrap();
        children.sort_unstable();
        assert_eq!(children, vec![1, 2]);

        let mut parents = t.parents(3).unwrap();
        parents.sort_unstable();
        assert_eq!(parents, vec![1, 2]);

        assert_eq!(t.roots(), vec![0]);
        assert_eq!(t.leaves(), vec![3]);
    }

    #[test]
    fn duplicate_concept_rejected() {
        let mut t = Taxonomy::new();
        t.add_concept(7).unwrap();
        assert_eq!(t.add_concept(7), Err(Error::DuplicateConcept { id: 7 }));
    }

    #[test]
    fn duplicate_edge_rejected() {
        let mut t = Taxonomy::new();
        t.add_concept(1).unwrap();
        t.add_concept(2).unwrap();
        t.add_is_a(1, 2).unwrap();
        assert_eq!(
            t.add_is_a(1, 2),
            Err(Error::DuplicateEdge {
                parent: 1,
                child: 2
            })
        );
    }

    #[test]
    fn unknown_ids_rejected() {
        let mut t = Taxonomy::new();
        t.add_concept(1).unwrap();
        assert_eq!(t.add_is_a(1, 9), Err(Error::UnknownConcept { id: 9 }));
        assert_eq!(t.children(9).unwrap_err(), Error::UnknownConcept { id: 9 });
    }

    #[test]
    fn edge_lookup_requires_direct_edge() {
        let t = diamond();
        // 0 -> 3 is a path but not an edge.
        assert_eq!(
            t.cond_probability(0, 3).unwrap_err(),
            Error::EdgeNotFound {
                parent: 0,
                child: 3
            }
        );
    }

    #[test]
    fn frequency_bounds_enforced() {
        let mut t = Taxonomy::new();
        t.add_concept(1).unwrap();
        t.set_frequency(1, 42.0).unwrap();
        assert_eq!(t.frequency(1).unwrap(), 42.0);

        assert!(matches!(
            t.set_frequency(1, -1.0),
            Err(Error::NegativeFrequency { id: 1, .. })
        ));
        assert!(matches!(
            t.set_frequency(1, f64::NAN),
            Err(Error::NegativeFrequency { id: 1, .. })
        ));
        // Unchanged by the rejected writes.
        assert_eq!(t.frequency(1).unwrap(), 42.0);
    }

    #[test]
    fn unseen_concepts_default_to_zero_frequency() {
        let t = diamond();
        assert_eq!(t.frequency(3).unwrap(), 0.0);
        assert_eq!(t.probability(3).unwrap(), None);
        assert_eq!(t.ic(3).unwrap(), None);
    }

    #[test]
    fn clear_model_resets_fitted_state_only() {
        let mut t = diamond();
        t.set_frequency(1, 5.0).unwrap();

        // Simulate a fitted model through the crate-internal handles.
        let ix = t.index_of(3).unwrap();
        t.graph_mut()[ix].probability = Some(0.25);
        t.graph_mut()[ix].ic = Some(2.0);
        let e = t.graph().find_edge(t.index_of(0).unwrap(), t.index_of(1).unwrap());
        let e = e.unwrap();
        t.graph_mut()[e].cond_probability = Some(0.5);
        t.graph_mut()[e].weight = Some(1.0);

        t.clear_model();

        assert_eq!(t.probability(3).unwrap(), None);
        assert_eq!(t.ic(3).unwrap(), None);
        assert_eq!(t.cond_probability(0, 1).unwrap(), None);
        assert_eq!(t.edge_weight(0, 1).unwrap(), None);
        // Raw frequencies survive.
        assert_eq!(t.frequency(1).unwrap(), 5.0);
    }
}
