//! Raw concept-frequency loading.
//!
//! Corpus-based IC datasets distribute per-concept frequency counts as
//! line-oriented text, one entry per concept:
//!
//! ```text
//! # comments and blank lines are ignored
//! 1740 128767.0 ROOT
//! 2684 40921
//! 3553 0
//! ```
//!
//! Each entry is a concept id and a non-negative frequency, optionally
//! followed by a `ROOT` marker (present in the classic WordNet frequency
//! distributions; accepted and ignored here since roots are derived from
//! the taxonomy topology).
//!
//! All input validation happens at this boundary: non-numeric fields,
//! negative or non-finite frequencies, and duplicate ids are rejected as
//! [`Error::MalformedFrequency`]. The fitter downstream treats any
//! non-negative frequency as valid and never re-validates.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::taxonomy::{ConceptId, Taxonomy};

/// A mapping from concept id to raw corpus frequency.
///
/// Built in memory via [`set`](ConceptFrequencies::set) or read from a
/// frequency file via [`from_file`](ConceptFrequencies::from_file).
#[derive(Debug, Clone, Default)]
pub struct ConceptFrequencies {
    counts: HashMap<ConceptId, f64>,
    source: Option<String>,
}

impl ConceptFrequencies {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a mapping from a line-oriented frequency file.
    ///
    /// The file name (without directories) is retained as the source name
    /// for model provenance.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let counts = parse(&contents)?;
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        debug!(
            entries = counts.len(),
            source = source.as_deref().unwrap_or("<unnamed>"),
            "loaded concept frequencies"
        );

        Ok(Self { counts, source })
    }

    /// Set a concept's frequency, replacing any previous value.
    ///
    /// Rejects negative and non-finite values.
    pub fn set(&mut self, id: ConceptId, frequency: f64) -> Result<()> {
        if !frequency.is_finite() || frequency < 0.0 {
            return Err(Error::NegativeFrequency {
                id,
                value: frequency,
            });
        }
        let _ = self.counts.insert(id, frequency);
        Ok(())
    }

    /// Look up a concept's frequency. `None` for concepts not in the
    /// mapping (they keep the taxonomy default of 0.0).
    pub fn get(&self, id: ConceptId) -> Option<f64> {
        self.counts.get(&id).copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The frequency-file name, if this mapping was read from a file.
    pub fn source_name(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Write every entry onto the taxonomy's concepts.
    ///
    /// Fails with [`Error::UnknownConcept`] if an entry names a concept
    /// the taxonomy does not contain; concepts absent from the mapping
    /// keep their current frequency.
    pub fn apply_to(&self, taxonomy: &mut Taxonomy) -> Result<()> {
        for (&id, &frequency) in &self.counts {
            taxonomy.set_frequency(id, frequency)?;
        }
        Ok(())
    }
}

fn parse(contents: &str) -> Result<HashMap<ConceptId, f64>> {
    let mut counts = HashMap::new();

    for (lineno, line) in contents.lines().enumerate() {
        let lineno = lineno + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let id_field = fields.next().unwrap_or_default();
        let id: ConceptId = id_field.parse().map_err(|_| Error::MalformedFrequency {
            line: lineno,
            reason: format!("concept id '{id_field}' is not an unsigned integer"),
        })?;

        let freq_field = fields.next().ok_or_else(|| Error::MalformedFrequency {
            line: lineno,
            reason: "missing frequency field".into(),
        })?;
        let frequency: f64 = freq_field.parse().map_err(|_| Error::MalformedFrequency {
            line: lineno,
            reason: format!("frequency '{freq_field}' is not a number"),
        })?;
        if !frequency.is_finite() || frequency < 0.0 {
            return Err(Error::MalformedFrequency {
                line: lineno,
                reason: format!("frequency {frequency} is negative or not finite"),
            });
        }

        match fields.next() {
            None => {}
            Some("ROOT") => {
                if let Some(extra) = fields.next() {
                    return Err(Error::MalformedFrequency {
                        line: lineno,
                        reason: format!("unexpected trailing field '{extra}'"),
                    });
                }
            }
            Some(extra) => {
                return Err(Error::MalformedFrequency {
                    line: lineno,
                    reason: format!("unexpected trailing field '{extra}'"),
                });
            }
        }

        if counts.insert(id, frequency).is_some() {
            return Err(Error::MalformedFrequency {
                line: lineno,
                reason: format!("duplicate entry for concept {id}"),
            });
        }
    }

    Ok(counts)
}
