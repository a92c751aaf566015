//! Conditional-probability edge weighting and the CondProbCorpus model.
//!
//! The bottom pass of the model fit. For every parent `p` with children
//! `C`, the children's floored frequencies are normalized into a proper
//! probability distribution over the siblings:
//!
//! ```text
//! hypoTotal(p)      = sum over c in C of max(1, freq(c))
//! condProb(p -> c)  = max(1, freq(c)) / hypoTotal(p)
//! weight(p -> c)    = -log2(condProb(p -> c))
//! ```
//!
//! The `max(1, .)` floor keeps zero-frequency children from collapsing the
//! denominator and guarantees every child non-zero mass, so no `-log(0)`
//! can appear downstream. A concept observed zero times and one observed
//! exactly once are treated identically; this is the published model's
//! specified behavior, not an accident (Lastra-Diaz & Garcia-Serrano 2015).
//!
//! Consequences worth knowing:
//! - sibling conditional probabilities sum to 1 under every parent,
//! - a single child always gets probability 1 and weight 0, whatever its
//!   raw frequency,
//! - every weight is >= 0, which is what makes the propagated model
//!   well-founded (IC never decreases from root to leaves).

use core::fmt;

use petgraph::graph::NodeIndex;
use petgraph::Direction;
use tracing::debug;

use crate::error::{Error, Result};
use crate::freq::ConceptFrequencies;
use crate::ic::propagate::{propagate_probabilities, FitReport, PropagationPolicy};
use crate::ic::traits::IcModel;
use crate::taxonomy::Taxonomy;

/// Weight every parent→child edge with the conditional probability of the
/// child given the parent, and its information content `-log2(condProb)`.
///
/// Touches each edge exactly once; O(E) overall. Leaves are skipped. Each
/// parent's children must carry their raw frequencies before this runs;
/// the pass itself is independent of traversal order across parents.
pub fn weight_edges(taxonomy: &mut Taxonomy) -> Result<()> {
    if taxonomy.is_empty() {
        return Err(Error::EmptyTaxonomy);
    }

    let shared: &Taxonomy = taxonomy;
    let parents: Vec<NodeIndex> = shared.graph().node_indices().collect();
    let updates = parents
        .iter()
        .map(|&p| weigh_children(shared, p))
        .collect::<Result<Vec<_>>>()?;

    store_updates(taxonomy, updates)
}

/// Parallel variant of [`weight_edges`]: parents fan out via rayon, each
/// reading only its children's frequencies and producing the weights for
/// its own incident edges; results are applied serially.
#[cfg(feature = "parallel")]
pub fn weight_edges_parallel(taxonomy: &mut Taxonomy) -> Result<()> {
    use rayon::prelude::*;

    if taxonomy.is_empty() {
        return Err(Error::EmptyTaxonomy);
    }

    let shared: &Taxonomy = taxonomy;
    let parents: Vec<NodeIndex> = shared.graph().node_indices().collect();
    let updates = parents
        .par_iter()
        .map(|&p| weigh_children(shared, p))
        .collect::<Result<Vec<_>>>()?;

    store_updates(taxonomy, updates)
}

type EdgeUpdate = (petgraph::graph::EdgeIndex, f64, f64);

fn weigh_children(taxonomy: &Taxonomy, p: NodeIndex) -> Result<Vec<EdgeUpdate>> {
    let graph = taxonomy.graph();
    let children: Vec<NodeIndex> = graph.neighbors_directed(p, Direction::Outgoing).collect();
    if children.is_empty() {
        return Ok(Vec::new());
    }

    let hypo_total: f64 = children.iter().map(|&c| graph[c].frequency.max(1.0)).sum();

    let mut updates = Vec::with_capacity(children.len());
    for &c in &children {
        let cond = graph[c].frequency.max(1.0) / hypo_total;
        let edge = graph.find_edge(p, c).ok_or(Error::EdgeNotFound {
            parent: graph[p].id,
            child: graph[c].id,
        })?;
        updates.push((edge, cond, -cond.log2()));
    }
    Ok(updates)
}

fn store_updates(taxonomy: &mut Taxonomy, updates: Vec<Vec<EdgeUpdate>>) -> Result<()> {
    let mut edges = 0usize;
    let graph = taxonomy.graph_mut();
    for (edge, cond, weight) in updates.into_iter().flatten() {
        graph[edge].cond_probability = Some(cond);
        graph[edge].weight = Some(weight);
        edges += 1;
    }
    debug!(edges, "weighted taxonomy edges");
    Ok(())
}

/// The CondProbCorpus well-founded IC model.
///
/// Composes the two fitting passes in order: the conditional-probability
/// edge pass ([`weight_edges`]), then node probability/IC propagation
/// ([`propagate_probabilities`]). Carries the frequency-source name so the
/// fitted model can identify itself as `"CondProbCorpus,<file>"`.
///
/// # Example
///
/// ```rust,ignore
/// let freqs = ConceptFrequencies::from_file("wordnetFreq.dat")?;
/// freqs.apply_to(&mut taxonomy)?;
///
/// let model = CondProbCorpus::for_frequencies(&freqs);
/// let report = model.fit(&mut taxonomy)?;
/// println!("{model}: fitted {} concepts", report.fitted);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CondProbCorpus {
    source: Option<String>,
    policy: PropagationPolicy,
}

impl CondProbCorpus {
    /// Create the model with the default (strict) propagation policy and
    /// no source name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the model named after a frequency mapping's source file.
    pub fn for_frequencies(frequencies: &ConceptFrequencies) -> Self {
        Self {
            source: frequencies.source_name().map(str::to_owned),
            policy: PropagationPolicy::default(),
        }
    }

    /// Set the frequency-source name used in the provenance string.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set how disconnected concepts are treated during propagation.
    pub fn with_policy(mut self, policy: PropagationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fit the model over the taxonomy.
    ///
    /// All-or-nothing: on any error every fitted attribute is cleared, so
    /// a failed fit can never be mistaken for a model.
    pub fn fit(&self, taxonomy: &mut Taxonomy) -> Result<FitReport> {
        let outcome = weight_edges(taxonomy)
            .and_then(|()| propagate_probabilities(taxonomy, self.policy));
        match outcome {
            Ok(report) => {
                debug!(model = %self, fitted = report.fitted, "fitted IC model");
                Ok(report)
            }
            Err(e) => {
                taxonomy.clear_model();
                Err(e)
            }
        }
    }
}

impl fmt::Display for CondProbCorpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "CondProbCorpus,{source}"),
            None => write!(f, "CondProbCorpus"),
        }
    }
}

impl IcModel for CondProbCorpus {
    fn fit(&self, taxonomy: &mut Taxonomy) -> Result<FitReport> {
        CondProbCorpus::fit(self, taxonomy)
    }
}
