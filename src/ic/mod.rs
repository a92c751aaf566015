//! Information-content model fitting.
//!
//! # The Core Idea
//!
//! An IC model assigns every concept in a taxonomy a probability and an
//! information content `IC(c) = -log2(P(c))`: rarer, more specific
//! concepts carry more information. Downstream semantic-similarity
//! measures (Resnik, Lin, Jiang-Conrath and family) consume nothing but
//! these per-concept values.
//!
//! A model is **well-founded** when a child's probability never exceeds
//! its parent's, so IC grows monotonically from the root to the leaves.
//! General frequency-counting IC models do not guarantee this; the
//! conditional-probability construction here does, by building the model
//! from per-edge probabilities that are normalized across siblings.
//!
//! # The Two Passes
//!
//! Fitting is two explicitly separate traversals, composed in order:
//!
//! | Pass | Direction | Writes |
//! |------|-----------|--------|
//! | [`weight_edges`] | per parent, any order | edge condProb + weight |
//! | [`propagate_probabilities`] | roots down, parents first | node probability + IC |
//!
//! [`CondProbCorpus`] bundles both behind the [`IcModel`] trait and names
//! the result (`"CondProbCorpus,<frequency-file>"`). [`audit_model`]
//! re-checks the fitted invariants after the fact.
//!
//! ```text
//!        R                     edge pass            propagation
//!       / \      freq(A)=3    R->A 3/4, 0.415      P(A)=0.75, IC 0.415
//!      A   B     freq(B)=1    R->B 1/4, 2.0        P(B)=0.25, IC 2.0
//!      |         freq(A1)=5   A->A1 1, 0           P(A1)=0.75, IC 0.415
//!      A1
//! ```
//!
//! # References
//!
//! - Resnik (1995). "Using Information Content to Evaluate Semantic
//!   Similarity in a Taxonomy." IJCAI.
//! - Lastra-Diaz & Garcia-Serrano (2015). "A new family of information
//!   content models with an experimental survey on WordNet."
//!   Knowledge-Based Systems 89.
//! - Pedersen (2008). WordNet-InfoContent-3.0 dataset.

mod audit;
mod cond_prob;
mod propagate;
mod traits;

pub use audit::audit_model;
pub use cond_prob::CondProbCorpus;
pub use cond_prob::weight_edges;
#[cfg(feature = "parallel")]
pub use cond_prob::weight_edges_parallel;
pub use propagate::{propagate_probabilities, FitReport, PropagationPolicy};
#[cfg(feature = "parallel")]
pub use propagate::propagate_probabilities_parallel;
pub use traits::IcModel;
