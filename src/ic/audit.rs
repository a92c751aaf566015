//! Fitted-model auditing.
//!
//! Re-checks the defining invariants of a well-founded IC model on a
//! fitted taxonomy:
//!
//! | Invariant | Expectation |
//! |-----------|-------------|
//! | Sibling normalization | condProb over each parent's children sums to 1 |
//! | Weight non-negativity | every edge weight >= 0 |
//! | Weight consistency | weight == -log2(condProb) per edge |
//! | Root normalization | P(root) == 1, IC(root) == 0 |
//! | Monotonicity | P(c) <= P(p), IC(c) >= IC(p) along every edge |
//! | Parent consistency | P(c) equals the minimum parent contribution |
//! | Coverage | every reachable concept carries fitted values |
//!
//! Violations indicate either a bug in a custom fitting pipeline or
//! tampering with fitted state; each is reported at error severity in the
//! shared [`ValidationReport`]. Concepts legitimately skipped by a
//! best-effort fit surface as warnings, not errors.

use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::taxonomy::{Severity, Taxonomy, ValidationIssue, ValidationReport};

const TOL: f64 = 1e-9;

/// Audit a fitted taxonomy against the well-founded model invariants.
pub fn audit_model(taxonomy: &Taxonomy) -> ValidationReport {
    let mut report = ValidationReport::new();

    if taxonomy.is_empty() {
        report.warn("taxonomy contains no concepts");
        return report;
    }

    let graph = taxonomy.graph();

    // Reachability from the roots decides which concepts must be fitted.
    let mut reachable = vec![false; graph.node_count()];
    let mut stack: Vec<_> = graph.externals(Direction::Incoming).collect();
    for ix in &stack {
        reachable[ix.index()] = true;
    }
    while let Some(ix) = stack.pop() {
        for c in graph.neighbors_directed(ix, Direction::Outgoing) {
            if !reachable[c.index()] {
                reachable[c.index()] = true;
                stack.push(c);
            }
        }
    }

    for ix in graph.node_indices() {
        let concept = &graph[ix];
        let is_root = graph
            .neighbors_directed(ix, Direction::Incoming)
            .next()
            .is_none();

        if !reachable[ix.index()] {
            match concept.probability {
                Some(_) => report.add(
                    ValidationIssue::new(
                        Severity::Error,
                        "unreachable concept carries a fitted probability",
                    )
                    .with_concept(concept.id),
                ),
                None => report.add(
                    ValidationIssue::new(
                        Severity::Warning,
                        "concept unreachable from any root was left unfitted",
                    )
                    .with_concept(concept.id),
                ),
            }
            continue;
        }

        let (probability, ic) = match (concept.probability, concept.ic) {
            (Some(p), Some(ic)) => (p, ic),
            _ => {
                report.add(
                    ValidationIssue::new(
                        Severity::Error,
                        "reachable concept has no fitted probability or IC",
                    )
                    .with_concept(concept.id),
                );
                continue;
            }
        };

        if is_root {
            if (probability - 1.0).abs() > TOL {
                report.add(
                    ValidationIssue::new(Severity::Error, "root probability is not 1.0")
                        .with_concept(concept.id)
                        .with_context(format!("probability {probability}")),
                );
            }
            if ic.abs() > TOL {
                report.add(
                    ValidationIssue::new(Severity::Error, "root IC is not 0")
                        .with_concept(concept.id)
                        .with_context(format!("IC {ic}")),
                );
            }
        }

        if !(probability > 0.0 && probability <= 1.0 + TOL) {
            report.add(
                ValidationIssue::new(Severity::Error, "probability outside (0, 1]")
                    .with_concept(concept.id)
                    .with_context(format!("probability {probability}")),
            );
        }

        if (ic - expected_ic(probability)).abs() > TOL {
            report.add(
                ValidationIssue::new(Severity::Error, "IC does not match -log2(probability)")
                    .with_concept(concept.id)
                    .with_context(format!("probability {probability}, IC {ic}")),
            );
        }

        // Minimum contribution over fitted parents; also covers
        // edge-additivity (IC(c) = IC(p) + weight for the deciding parent).
        if !is_root {
            let mut best: Option<f64> = None;
            for edge in graph.edges_directed(ix, Direction::Incoming) {
                let parent = &graph[edge.source()];
                let (Some(pp), Some(cond)) = (parent.probability, edge.weight().cond_probability)
                else {
                    continue;
                };
                let contribution = pp * cond;
                best = Some(match best {
                    Some(b) => b.min(contribution),
                    None => contribution,
                });
                if probability > pp + TOL {
                    report.add(
                        ValidationIssue::new(
                            Severity::Error,
                            "probability exceeds a parent's (model is not well-founded)",
                        )
                        .with_concept(concept.id)
                        .with_context(format!("parent {}", parent.id)),
                    );
                }
            }
            if let Some(expected) = best {
                if (probability - expected).abs() > TOL {
                    report.add(
                        ValidationIssue::new(
                            Severity::Error,
                            "probability does not match the minimum parent contribution",
                        )
                        .with_concept(concept.id)
                        .with_context(format!("expected {expected}, found {probability}")),
                    );
                }
            }
        }
    }

    // Per-edge checks and per-parent sibling sums.
    for ix in graph.node_indices() {
        let parent = &graph[ix];
        let mut sum = 0.0;
        let mut complete = true;
        let mut has_children = false;

        for edge in graph.edges_directed(ix, Direction::Outgoing) {
            has_children = true;
            let child = &graph[edge.target()];
            match (edge.weight().cond_probability, edge.weight().weight) {
                (Some(cond), Some(weight)) => {
                    sum += cond;
                    if weight < -TOL {
                        report.add(
                            ValidationIssue::new(Severity::Error, "negative edge weight")
                                .with_concept(parent.id)
                                .with_context(format!("child {}, weight {weight}", child.id)),
                        );
                    }
                    if (weight + cond.log2()).abs() > TOL {
                        report.add(
                            ValidationIssue::new(
                                Severity::Error,
                                "edge weight does not match -log2(condProb)",
                            )
                            .with_concept(parent.id)
                            .with_context(format!("child {}", child.id)),
                        );
                    }
                }
                _ => {
                    complete = false;
                    report.add(
                        ValidationIssue::new(Severity::Error, "unweighted edge")
                            .with_concept(parent.id)
                            .with_context(format!("child {}", child.id)),
                    );
                }
            }
        }

        if has_children && complete && (sum - 1.0).abs() > TOL {
            report.add(
                ValidationIssue::new(
                    Severity::Error,
                    "conditional probabilities over children do not sum to 1",
                )
                .with_concept(parent.id)
                .with_context(format!("sum {sum}")),
            );
        }
    }

    report
}

fn expected_ic(probability: f64) -> f64 {
    if probability == 1.0 {
        0.0
    } else {
        -probability.log2()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ic::cond_prob::CondProbCorpus;
    use crate::ic::propagate::PropagationPolicy;

    fn fitted() -> Taxonomy {
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
        CondProbCorpus::new().fit(&mut t).unwrap();
        t
    }

    #[test]
    fn fitted_model_passes() {
        let report = audit_model(&fitted());
        assert!(report.is_healthy(), "{}", report);
    }

    #[test]
    fn unfitted_model_fails() {
        let mut t = Taxonomy::new();
        t.add_concept(0).unwrap();
        t.add_concept(1).unwrap();
        t.add_is_a(0, 1).unwrap();

        let report = audit_model(&t);
        assert!(!report.is_healthy());
    }

    #[test]
    fn tampered_probability_is_detected() {
        let mut t = fitted();
        let ix = t.index_of(2).unwrap();
        t.graph_mut()[ix].probability = Some(0.9);

        let report = audit_model(&t);
        assert!(!report.is_healthy());
        assert!(report
            .issues
            .iter()
            .any(|i| i.concept == Some(2) && i.severity == Severity::Error));
    }

    #[test]
    fn tampered_edge_weight_is_detected() {
        let mut t = fitted();
        let e = t
            .graph()
            .find_edge(t.index_of(0).unwrap(), t.index_of(1).unwrap())
            .unwrap();
        t.graph_mut()[e].weight = Some(-0.5);

        let report = audit_model(&t);
        assert!(!report.is_healthy());
        assert!(report
            .issues
            .iter()
            .any(|i| i.message.contains("negative edge weight")));
    }

    #[test]
    fn best_effort_skips_are_warnings_not_errors() {
        let mut t = Taxonomy::new();
        for id in 0..4 {
            t.add_concept(id).unwrap();
        }
        t.add_is_a(0, 1).unwrap();
        t.add_is_a(2, 3).unwrap();
        t.add_is_a(3, 2).unwrap();
        let model = CondProbCorpus::new().with_policy(PropagationPolicy::BestEffort);
        let _ = model.fit(&mut t).unwrap();

        let report = audit_model(&t);
        assert!(report.is_healthy(), "{}", report);
        assert!(report
            .issues
            .iter()
            .any(|i| i.severity == Severity::Warning));
    }
}
