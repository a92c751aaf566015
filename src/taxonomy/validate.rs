//! Taxonomy validation utilities.
//!
//! Structural checks to run before fitting an IC model:
//! - No root (every concept has a parent — implies a cycle)
//! - Cycles among is-a edges
//! - Concepts unreachable from any root
//! - Isolated concepts (no parents, no children)
//!
//! The fitter itself assumes a well-formed DAG and does not re-validate;
//! callers that ingest taxonomies from external builders should check the
//! report first.
//!
//! # Example
//!
//! ```rust,ignore
//! let report = validate_taxonomy(&taxonomy);
//! if !report.is_healthy() {
//!     for issue in &report.issues {
//!         eprintln!("{issue}");
//!     }
//! }
//! ```

use std::collections::HashMap;

use petgraph::algo::is_cyclic_directed;
use petgraph::Direction;

use crate::taxonomy::graph::{ConceptId, Taxonomy};

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational, not a problem.
    Info,
    /// Something unusual but not necessarily wrong.
    Warning,
    /// A problem that should be fixed.
    Error,
    /// A critical issue that makes fitting meaningless.
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A single issue found during validation or model audit.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Optional concept id involved.
    pub concept: Option<ConceptId>,
    /// Optional additional context.
    pub context: Option<String>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            concept: None,
            context: None,
        }
    }

    /// Attach a concept id to this issue.
    pub fn with_concept(mut self, id: ConceptId) -> Self {
        self.concept = Some(id);
        self
    }

    /// Attach context to this issue.
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context = Some(ctx.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(id) = self.concept {
            write!(f, " (concept {})", id)?;
        }
        if let Some(ctx) = &self.context {
            write!(f, " - {}", ctx)?;
        }
        Ok(())
    }
}

/// Report from taxonomy validation or a model audit.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// All issues found.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Add an info-level issue.
    pub fn info(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Info, message));
    }

    /// Add a warning-level issue.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Warning, message));
    }

    /// Add an error-level issue.
    pub fn error(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Error, message));
    }

    /// Add a critical-level issue.
    pub fn critical(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Critical, message));
    }

    /// Whether the report contains no errors or critical issues.
    pub fn is_healthy(&self) -> bool {
        !self.issues.iter().any(|i| i.severity >= Severity::Error)
    }

    /// Whether there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues of a given severity or higher.
    pub fn issues_at_level(&self, min_severity: Severity) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity >= min_severity)
            .collect()
    }

    /// Count issues by severity.
    pub fn counts(&self) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity).or_default() += 1;
        }
        counts
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_clean() {
            return write!(f, "Validation passed: no issues found");
        }

        let counts = self.counts();
        write!(f, "Validation report: ")?;

        let parts: Vec<String> = [
            (Severity::Critical, "critical"),
            (Severity::Error, "errors"),
            (Severity::Warning, "warnings"),
            (Severity::Info, "info"),
        ]
        .iter()
        .filter_map(|(sev, name)| counts.get(sev).map(|c| format!("{} {}", c, name)))
        .collect();

        writeln!(f, "{}", parts.join(", "))?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// Validate a taxonomy's structure ahead of fitting.
///
/// Returns a severity-graded report; does not mutate the taxonomy.
pub fn validate_taxonomy(taxonomy: &Taxonomy) -> ValidationReport {
    let mut report = ValidationReport::new();

    if taxonomy.is_empty() {
        report.warn("taxonomy contains no concepts");
        return report;
    }

    let graph = taxonomy.graph();
    let roots: Vec<_> = graph.externals(Direction::Incoming).collect();

    if roots.is_empty() {
        report.critical("no root concept found - every concept has a parent, so the is-a relation is cyclic");
    } else if roots.len() > 1 {
        let ids: Vec<ConceptId> = roots.iter().map(|&ix| taxonomy.id_of(ix)).collect();
        report.warn(format!("multiple roots found: {:?}", ids));
    }

    if is_cyclic_directed(graph) {
        report.critical("cycle detected among is-a edges");
    }

    // Concepts unreachable from every root. Propagation would leave their
    // probability and IC unset.
    let mut reachable = vec![false; graph.node_count()];
    let mut stack = roots.clone();
    while let Some(ix) = stack.pop() {
        if !reachable[ix.index()] {
            reachable[ix.index()] = true;
            stack.extend(graph.neighbors_directed(ix, Direction::Outgoing));
        }
    }

    let unreached: Vec<ConceptId> = graph
        .node_indices()
        .filter(|ix| !reachable[ix.index()])
        .map(|ix| taxonomy.id_of(ix))
        .collect();
    if !unreached.is_empty() {
        report.add(
            ValidationIssue::new(
                Severity::Error,
                format!("{} concepts unreachable from any root", unreached.len()),
            )
            .with_context(format!(
                "first few: {:?}",
                &unreached[..unreached.len().min(5)]
            )),
        );
    }

    // Isolated concepts are reachable from nothing and lead to nothing;
    // in a one-concept taxonomy the sole root is legitimately both.
    if taxonomy.len() > 1 {
        for ix in graph.node_indices() {
            let no_parents = graph
                .neighbors_directed(ix, Direction::Incoming)
                .next()
                .is_none();
            let no_children = graph
                .neighbors_directed(ix, Direction::Outgoing)
                .next()
                .is_none();
            if no_parents && no_children {
                report.add(
                    ValidationIssue::new(Severity::Warning, "isolated concept")
                        .with_concept(taxonomy.id_of(ix)),
                );
            }
        }
    }

    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used, unused_results)]
mod tests {
    use super::*;

    fn chain(n: u64) -> Taxonomy {
        let mut t = Taxonomy::new();
        for id in 0..n {
            t.add_concept(id).unwrap();
        }
        for id in 1..n {
            t.add_is_a(id - 1, id).unwrap();
        }
        t
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn report_healthy_until_error() {
        let mut report = ValidationReport::new();
        report.info("just some info");
        report.warn("a warning");
        assert!(report.is_healthy());

        report.error("an error");
        assert!(!report.is_healthy());
    }

    #[test]
    fn issue_display() {
        let issue = ValidationIssue::new(Severity::Error, "something wrong")
            .with_concept(42)
            .with_context("additional info");

        let s = format!("{}", issue);
        assert!(s.contains("ERROR"));
        assert!(s.contains("something wrong"));
        assert!(s.contains("42"));
        assert!(s.contains("additional info"));
    }

    #[test]
    fn valid_tree_is_healthy() {
        let report = validate_taxonomy(&chain(4));
        assert!(report.is_healthy(), "{}", report);
    }

    #[test]
    fn empty_taxonomy_warns() {
        let report = validate_taxonomy(&Taxonomy::new());
        assert!(report.is_healthy());
        assert!(!report.is_clean());
    }

    #[test]
    fn cycle_is_critical() {
        let mut t = chain(3);
        t.add_is_a(2, 0).unwrap();

        let report = validate_taxonomy(&t);
        assert!(!report.is_healthy());
        assert!(report
            .issues
            .iter()
            .any(|i| i.severity == Severity::Critical));
    }

    #[test]
    fn unreachable_concepts_are_errors() {
        // Root 0 -> 1, plus a detached 2 <-> 3 cycle component.
        let mut t = chain(2);
        t.add_concept(2).unwrap();
        t.add_concept(3).unwrap();
        t.add_is_a(2, 3).unwrap();
        t.add_is_a(3, 2).unwrap();

        let report = validate_taxonomy(&t);
        assert!(!report.is_healthy());
        assert!(report
            .issues
            .iter()
            .any(|i| i.message.contains("unreachable")));
    }

    #[test]
    fn multiple_roots_warn_only() {
        // Two separate trees: 0 -> 1, 2 -> 3.
        let mut t = Taxonomy::new();
        for id in 0..4 {
            t.add_concept(id).unwrap();
        }
        t.add_is_a(0, 1).unwrap();
        t.add_is_a(2, 3).unwrap();

        let report = validate_taxonomy(&t);
        assert!(report.is_healthy());
        assert!(report
            .issues
            .iter()
            .any(|i| i.message.contains("multiple roots")));
    }

    #[test]
    fn isolated_concept_warns() {
        let mut t = chain(2);
        t.add_concept(9).unwrap();

        let report = validate_taxonomy(&t);
        assert!(report.is_healthy());
        assert!(report.issues.iter().any(|i| i.concept == Some(9)));
    }
}
