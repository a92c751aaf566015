//! Node probability and IC propagation.
//!
//! The second, top-down pass of the model fit: converts the per-edge
//! conditional probabilities written by the edge pass into absolute
//! per-concept probabilities and IC values.
//!
//! Roots get probability 1.0 and IC 0. Every other concept, processed
//! strictly after all of its parents (Kahn-style traversal over the DAG):
//!
//! ```text
//! P(c)  = P(p) * condProb(p -> c)
//! IC(c) = -log2(P(c))            (= IC(p) + weight(p -> c))
//! ```
//!
//! A concept reachable through several parents takes the minimum
//! probability over its parent contributions (the maximum IC), which keeps
//! `P(c) <= P(p)` for every parent; on trees this reduces to the single
//! formula above.
//!
//! Concepts unreachable from any root keep `None` for both values. Under
//! [`PropagationPolicy::Strict`] (the default) that fails the whole pass;
//! [`PropagationPolicy::BestEffort`] is an explicit opt-in that records
//! them as skipped in the [`FitReport`] and keeps the reachable portion.

use std::collections::VecDeque;

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::taxonomy::{ConceptId, Taxonomy};

/// How propagation treats concepts unreachable from every root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropagationPolicy {
    /// Fail the whole fit with [`Error::DisconnectedConcepts`].
    #[default]
    Strict,
    /// Keep the reachable portion of the model and report the rest as
    /// skipped. Skipped concepts keep `None` probability/IC.
    BestEffort,
}

/// Summary of a completed fit.
#[derive(Debug, Clone)]
pub struct FitReport {
    /// Total concepts in the taxonomy.
    pub concepts: usize,
    /// Concepts that received a probability and IC value.
    pub fitted: usize,
    /// Number of roots propagation started from.
    pub roots: usize,
    /// Longest root-to-concept path among fitted concepts.
    pub depth: usize,
    /// Concepts skipped under [`PropagationPolicy::BestEffort`].
    pub skipped: Vec<ConceptId>,
}

impl FitReport {
    /// Whether every concept received a value.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

fn ic_of(probability: f64) -> f64 {
    // -log2(1.0) is -0.0; keep plain zero for the certainty case.
    if probability == 1.0 {
        0.0
    } else {
        -probability.log2()
    }
}

/// Propagate absolute probabilities and IC values from the roots.
///
/// Requires the edge pass ([`weight_edges`](crate::ic::weight_edges)) to
/// have run; fails with [`Error::UnweightedEdge`] otherwise. On error the
/// taxonomy's node values are left untouched.
pub fn propagate_probabilities(
    taxonomy: &mut Taxonomy,
    policy: PropagationPolicy,
) -> Result<FitReport> {
    if taxonomy.is_empty() {
        return Err(Error::EmptyTaxonomy);
    }

    let graph = taxonomy.graph();
    let n = graph.node_count();

    let mut indegree = vec![0usize; n];
    for edge in graph.edge_references() {
        indegree[edge.target().index()] += 1;
    }

    let mut probability = vec![0.0f64; n];
    let mut touched = vec![false; n];
    let mut finalized = vec![false; n];
    let mut level = vec![0usize; n];

    let mut queue: VecDeque<NodeIndex> = VecDeque::new();
    let mut roots = 0usize;
    for ix in graph.node_indices() {
        if indegree[ix.index()] == 0 {
            probability[ix.index()] = 1.0;
            touched[ix.index()] = true;
            roots += 1;
            queue.push_back(ix);
        }
    }

    let mut depth = 0usize;
    while let Some(p) = queue.pop_front() {
        finalized[p.index()] = true;
        depth = depth.max(level[p.index()]);

        for edge in graph.edges_directed(p, Direction::Outgoing) {
            let c = edge.target();
            let cond = edge
                .weight()
                .cond_probability
                .ok_or_else(|| Error::UnweightedEdge {
                    parent: taxonomy.id_of(p),
                    child: taxonomy.id_of(c),
                })?;

            let candidate = probability[p.index()] * cond;
            if !touched[c.index()] || candidate < probability[c.index()] {
                probability[c.index()] = candidate;
            }
            touched[c.index()] = true;
            level[c.index()] = level[c.index()].max(level[p.index()] + 1);

            indegree[c.index()] -= 1;
            if indegree[c.index()] == 0 {
                queue.push_back(c);
            }
        }
    }

    apply(taxonomy, &probability, &finalized, policy, roots, depth)
}

/// Write the computed values back and resolve the disconnection policy.
fn apply(
    taxonomy: &mut Taxonomy,
    probability: &[f64],
    finalized: &[bool],
    policy: PropagationPolicy,
    roots: usize,
    depth: usize,
) -> Result<FitReport> {
    let graph = taxonomy.graph();
    let n = graph.node_count();

    let mut skipped: Vec<ConceptId> = graph
        .node_indices()
        .filter(|ix| !finalized[ix.index()])
        .map(|ix| taxonomy.id_of(ix))
        .collect();
    skipped.sort_unstable();

    if !skipped.is_empty() && policy == PropagationPolicy::Strict {
        return Err(Error::DisconnectedConcepts { concepts: skipped });
    }

    let fitted = n - skipped.len();
    let graph = taxonomy.graph_mut();
    for ix in graph.node_indices() {
        if finalized[ix.index()] {
            let p = probability[ix.index()];
            graph[ix].probability = Some(p);
            graph[ix].ic = Some(ic_of(p));
        }
    }

    if !skipped.is_empty() {
        warn!(
            skipped = skipped.len(),
            "concepts unreachable from any root were left unfitted"
        );
    }
    debug!(fitted, roots, depth, "propagated node probabilities");

    Ok(FitReport {
        concepts: n,
        fitted,
        roots,
        depth,
        skipped,
    })
}

/// Level-by-level parallel propagation.
///
/// Levels are longest root-to-concept distances, so every parent sits on a
/// strictly lower level than its children; concepts within one level are
/// independent and evaluated in parallel, levels in sequence.
#[cfg(feature = "parallel")]
pub fn propagate_probabilities_parallel(
    taxonomy: &mut Taxonomy,
    policy: PropagationPolicy,
) -> Result<FitReport> {
    use rayon::prelude::*;

    if taxonomy.is_empty() {
        return Err(Error::EmptyTaxonomy);
    }

    let shared: &Taxonomy = taxonomy;
    let graph = shared.graph();
    let n = graph.node_count();

    // Level assignment via the same Kahn traversal as the serial pass.
    let mut indegree = vec![0usize; n];
    for edge in graph.edge_references() {
        indegree[edge.target().index()] += 1;
    }

    let mut finalized = vec![false; n];
    let mut level = vec![0usize; n];
    let mut queue: VecDeque<NodeIndex> = VecDeque::new();
    let mut roots = 0usize;
    for ix in graph.node_indices() {
        if indegree[ix.index()] == 0 {
            roots += 1;
            queue.push_back(ix);
        }
    }

    let mut depth = 0usize;
    let mut levels: Vec<Vec<NodeIndex>> = Vec::new();
    while let Some(p) = queue.pop_front() {
        finalized[p.index()] = true;
        let l = level[p.index()];
        depth = depth.max(l);
        if levels.len() <= l {
            levels.resize(l + 1, Vec::new());
        }
        levels[l].push(p);

        for edge in graph.edges_directed(p, Direction::Outgoing) {
            let c = edge.target();
            level[c.index()] = level[c.index()].max(l + 1);
            indegree[c.index()] -= 1;
            if indegree[c.index()] == 0 {
                queue.push_back(c);
            }
        }
    }

    let mut probability = vec![0.0f64; n];
    for ix in levels.first().into_iter().flatten() {
        probability[ix.index()] = 1.0;
    }

    for l in 1..levels.len() {
        // Each concept takes the minimum contribution over its (already
        // evaluated) parents; the level's concepts share no state.
        let computed: Result<Vec<(usize, f64)>> = levels[l]
            .par_iter()
            .map(|&c| {
                let mut best = f64::INFINITY;
                for edge in graph.edges_directed(c, Direction::Incoming) {
                    let p = edge.source();
                    let cond =
                        edge.weight()
                            .cond_probability
                            .ok_or_else(|| Error::UnweightedEdge {
                                parent: shared.id_of(p),
                                child: shared.id_of(c),
                            })?;
                    best = best.min(probability[p.index()] * cond);
                }
                Ok((c.index(), best))
            })
            .collect();

        for (slot, p) in computed? {
            probability[slot] = p;
        }
    }

    apply(taxonomy, &probability, &finalized, policy, roots, depth)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ic::cond_prob::weight_edges;

    /// Root 0 -> {1 (freq 3), 2 (freq 1)}, 1 -> 3 (freq 5).
    fn fitted_edges() -> Taxonomy {
        let mut t = Taxonomy::new();
        for id in 0..4 {
            t.add_concept(id).unwrap();
        }
        t.add_is_a(0, 1).unwrap();
        t.add_is_a(0, 2).unwrap();
        t.add_is_a(1, 3).unwrap();
        t.set_frequency(1, 3.0).unwrap();
        t.set_frequency(2, 1.0).unwrap();
        t.set_frequency(3, 5.0).unwrap();
        weight_edges(&mut t).unwrap();
        t
    }

    #[test]
    fn roots_are_certain() {
        let mut t = fitted_edges();
        let report = propagate_probabilities(&mut t, PropagationPolicy::Strict).unwrap();

        assert_eq!(report.roots, 1);
        assert!(report.is_complete());
        assert_eq!(t.probability(0).unwrap(), Some(1.0));
        assert_eq!(t.ic(0).unwrap(), Some(0.0));
    }

    #[test]
    fn probabilities_multiply_along_paths() {
        let mut t = fitted_edges();
        propagate_probabilities(&mut t, PropagationPolicy::Strict).unwrap();

        assert_eq!(t.probability(1).unwrap(), Some(0.75));
        assert_eq!(t.probability(2).unwrap(), Some(0.25));
        assert_eq!(t.ic(2).unwrap(), Some(2.0));
        // Single child consumes all of its parent's mass.
        assert_eq!(t.probability(3).unwrap(), Some(0.75));
    }

    #[test]
    fn unweighted_edges_are_rejected() {
        let mut t = Taxonomy::new();
        t.add_concept(0).unwrap();
        t.add_concept(1).unwrap();
        t.add_is_a(0, 1).unwrap();

        let err = propagate_probabilities(&mut t, PropagationPolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            Error::UnweightedEdge {
                parent: 0,
                child: 1
            }
        );
        // Nothing was written.
        assert_eq!(t.probability(0).unwrap(), None);
    }

    #[test]
    fn strict_policy_fails_on_disconnected_concepts() {
        // Root 0 -> 1, plus an unreachable 2 <-> 3 cycle component.
        let mut t = Taxonomy::new();
        for id in 0..4 {
            t.add_concept(id).unwrap();
        }
        t.add_is_a(0, 1).unwrap();
        t.add_is_a(2, 3).unwrap();
        t.add_is_a(3, 2).unwrap();
        weight_edges(&mut t).unwrap();

        let err = propagate_probabilities(&mut t, PropagationPolicy::Strict).unwrap_err();
        assert_eq!(err, Error::DisconnectedConcepts { concepts: vec![2, 3] });
        // All-or-nothing: even the reachable portion stays unset.
        assert_eq!(t.probability(1).unwrap(), None);
    }

    #[test]
    fn best_effort_keeps_reachable_portion() {
        let mut t = Taxonomy::new();
        for id in 0..4 {
            t.add_concept(id).unwrap();
        }
        t.add_is_a(0, 1).unwrap();
        t.add_is_a(2, 3).unwrap();
        t.add_is_a(3, 2).unwrap();
        weight_edges(&mut t).unwrap();

        let report = propagate_probabilities(&mut t, PropagationPolicy::BestEffort).unwrap();
        assert_eq!(report.fitted, 2);
        assert_eq!(report.skipped, vec![2, 3]);
        assert!(!report.is_complete());

        assert_eq!(t.probability(1).unwrap(), Some(1.0));
        // Skipped concepts are distinguishable from fitted ones.
        assert_eq!(t.probability(2).unwrap(), None);
        assert_eq!(t.ic(3).unwrap(), None);
    }

    #[test]
    fn multi_parent_concepts_take_the_minimum_probability() {
        // Diamond: 0 -> {1 (freq 3), 2 (freq 1)} and both -> 3.
        let mut t = Taxonomy::new();
        for id in 0..4 {
            t.add_concept(id).unwrap();
        }
        t.add_is_a(0, 1).unwrap();
        t.add_is_a(0, 2).unwrap();
        t.add_is_a(1, 3).unwrap();
        t.add_is_a(2, 3).unwrap();
        t.set_frequency(1, 3.0).unwrap();
        t.set_frequency(2, 1.0).unwrap();
        weight_edges(&mut t).unwrap();

        propagate_probabilities(&mut t, PropagationPolicy::Strict).unwrap();

        // Contributions: via 1: 0.75 * 1.0 = 0.75; via 2: 0.25 * 1.0 = 0.25.
        assert_eq!(t.probability(3).unwrap(), Some(0.25));
        // Well-founded against both parents.
        assert!(t.probability(3).unwrap() <= t.probability(1).unwrap());
        assert!(t.probability(3).unwrap() <= t.probability(2).unwrap());
    }

    #[test]
    fn forest_propagates_from_every_root() {
        let mut t = Taxonomy::new();
        for id in 0..4 {
            t.add_concept(id).unwrap();
        }
        t.add_is_a(0, 1).unwrap();
        t.add_is_a(2, 3).unwrap();
        weight_edges(&mut t).unwrap();

        let report = propagate_probabilities(&mut t, PropagationPolicy::Strict).unwrap();
        assert_eq!(report.roots, 2);
        assert_eq!(t.probability(0).unwrap(), Some(1.0));
        assert_eq!(t.probability(2).unwrap(), Some(1.0));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_propagation_matches_serial() {
        let mut serial = fitted_edges();
        let mut parallel = fitted_edges();

        propagate_probabilities(&mut serial, PropagationPolicy::Strict).unwrap();
        propagate_probabilities_parallel(&mut parallel, PropagationPolicy::Strict).unwrap();

        for id in serial.concepts().collect::<Vec<_>>() {
            assert_eq!(
                serial.probability(id).unwrap(),
                parallel.probability(id).unwrap()
            );
            assert_eq!(serial.ic(id).unwrap(), parallel.ic(id).unwrap());
        }
    }
}
