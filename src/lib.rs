//! # surprisal
//!
//! Well-founded information-content (IC) models over concept taxonomies:
//! a taxonomy graph abstraction + the CondProbCorpus model, which turns
//! raw per-concept corpus frequencies into per-edge conditional
//! probabilities and per-concept probability/IC values (base-2
//! throughout).
//!
//! **Default build** is serial and dependency-light. Parallel fitting
//! (per-parent edge weighting, level-by-level propagation) is opt-in via
//! the `parallel` feature.
//!
//! ```rust
//! use surprisal::{CondProbCorpus, Taxonomy};
//!
//! # fn main() -> surprisal::Result<()> {
//! let mut taxonomy = Taxonomy::new();
//! for id in 0..3 {
//!     taxonomy.add_concept(id)?;
//! }
//! taxonomy.add_is_a(0, 1)?;
//! taxonomy.add_is_a(0, 2)?;
//! taxonomy.set_frequency(1, 3.0)?;
//! taxonomy.set_frequency(2, 1.0)?;
//!
//! let report = CondProbCorpus::new().fit(&mut taxonomy)?;
//! assert_eq!(report.fitted, 3);
//! assert_eq!(taxonomy.ic(2)?, Some(2.0));
//! # Ok(())
//! # }
//! ```

/// Error types used across `surprisal`.
pub mod error;
pub mod freq;
pub mod ic;
pub mod taxonomy;


pub use error::{Error, Result};
pub use freq::ConceptFrequencies;
pub use ic::{
    audit_model, propagate_probabilities, weight_edges, CondProbCorpus, FitReport, IcModel,
    PropagationPolicy,
};
#[cfg(feature = "parallel")]
pub use ic::{propagate_probabilities_parallel, weight_edges_parallel};
pub use taxonomy::{
    validate_taxonomy, Concept, ConceptId, IsA, Severity, Taxonomy, ValidationIssue,
    ValidationReport,
};
