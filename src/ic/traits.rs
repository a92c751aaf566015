//! IC-model traits.

use core::fmt;

use crate::error::Result;
use crate::ic::propagate::FitReport;
use crate::taxonomy::Taxonomy;

/// Trait for IC-model fitting strategies.
///
/// A model assigns an information-content value to every concept in a
/// taxonomy from raw frequency evidence. The `Display` bound renders the
/// model's provenance string (model tag plus frequency source), the only
/// descriptive output a fitted model is required to expose.
pub trait IcModel: fmt::Display {
    /// Fit the model, writing per-edge and per-concept values onto the
    /// taxonomy.
    fn fit(&self, taxonomy: &mut Taxonomy) -> Result<FitReport>;
}
