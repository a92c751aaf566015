use core::fmt;

/// Result alias for `surprisal`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by taxonomy construction and IC-model fitting.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The taxonomy has no concepts to fit.
    EmptyTaxonomy,

    /// A concept id was registered twice.
    DuplicateConcept {
        /// Offending concept id.
        id: u64,
    },

    /// The same parent→child is-a edge was added twice.
    DuplicateEdge {
        /// Parent concept id.
        parent: u64,
        /// Child concept id.
        child: u64,
    },

    /// A concept id is not present in the taxonomy.
    UnknownConcept {
        /// Looked-up concept id.
        id: u64,
    },

    /// An expected parent→child edge is missing.
    ///
    /// Indicates a malformed taxonomy; fatal for the whole fit.
    EdgeNotFound {
        /// Parent concept id.
        parent: u64,
        /// Child concept id.
        child: u64,
    },

    /// An edge had no conditional probability when propagation needed one.
    ///
    /// The edge-weighting pass must run before node propagation.
    UnweightedEdge {
        /// Parent concept id.
        parent: u64,
        /// Child concept id.
        child: u64,
    },

    /// Concepts unreachable from every root after propagation.
    DisconnectedConcepts {
        /// Unreached concept ids.
        concepts: Vec<u64>,
    },

    /// A raw frequency outside `[0, +inf)` was supplied.
    NegativeFrequency {
        /// Concept id the frequency was written to.
        id: u64,
        /// Rejected value.
        value: f64,
    },

    /// A frequency-file entry could not be parsed.
    MalformedFrequency {
        /// 1-based line number.
        line: usize,
        /// What was wrong with the entry.
        reason: String,
    },

    /// A frequency file could not be read.
    Io {
        /// Path of the file.
        path: String,
        /// Underlying I/O error text.
        reason: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyTaxonomy => write!(f, "taxonomy contains no concepts"),
            Error::DuplicateConcept { id } => {
                write!(f, "concept {id} is already present")
            }
            Error::DuplicateEdge { parent, child } => {
                write!(f, "is-a edge {parent} -> {child} is already present")
            }
            Error::UnknownConcept { id } => write!(f, "unknown concept {id}"),
            Error::EdgeNotFound { parent, child } => {
                write!(f, "no is-a edge joins {parent} -> {child}")
            }
            Error::UnweightedEdge { parent, child } => {
                write!(
                    f,
                    "edge {parent} -> {child} has no conditional probability (edge pass not run?)"
                )
            }
            Error::DisconnectedConcepts { concepts } => {
                write!(
                    f,
                    "{} concepts unreachable from any root (first: {:?})",
                    concepts.len(),
                    &concepts[..concepts.len().min(5)]
                )
            }
            Error::NegativeFrequency { id, value } => {
                write!(f, "invalid frequency {value} for concept {id}")
            }
            Error::MalformedFrequency { line, reason } => {
                write!(f, "malformed frequency entry at line {line}: {reason}")
            }
            Error::Io { path, reason } => write!(f, "cannot read '{path}': {reason}"),
        }
    }
}

impl std::error::Error for Error {}
