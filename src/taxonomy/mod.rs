//! Concept taxonomies and their structural validation.
//!
//! A taxonomy is a DAG (typically a tree or forest with a single synthetic
//! root) of concepts joined by is-a (parent→child) edges:
//!
//! ```text
//!            entity (root)
//!           /        \
//!      organism     artifact
//!       /    \          \
//!    animal  plant     vehicle
//! ```
//!
//! [`Taxonomy`] owns the vertex and edge arenas. Topology is built once and
//! never changes; raw frequencies are written before fitting; the fitted
//! attributes (per-edge conditional probability and weight, per-concept
//! probability and IC) are written by the passes in [`crate::ic`] and can
//! be bulk-reset with [`Taxonomy::clear_model`].
//!
//! [`validate_taxonomy`] checks the structural preconditions the fitter
//! assumes (rooted, acyclic, connected) and reports problems with
//! severities rather than failing fast, so callers can decide what to
//! tolerate.

mod graph;
mod validate;

pub use graph::{Concept, ConceptId, IsA, Taxonomy};
pub use validate::{
    validate_taxonomy, Severity, ValidationIssue, ValidationReport,
};
