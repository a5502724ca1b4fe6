//! Configuration for [`FingerprintGenerator`](crate::engine::generator::FingerprintGenerator).

use serde::{Deserialize, Serialize};

use crate::engine::elements::InferencePolicy;
use crate::error::{FingerprintError, Result};

/// Generator configuration. Every field has a default, so a partial JSON
/// document (or `{}`) deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintOptions {
    /// Explicit element universe. `None` infers it from the structures seen.
    ///
    /// An explicit list fixes the vector layout across structures of different
    /// composition; inferred layouts must not be mixed in one feature space.
    pub atom_types: Option<Vec<u8>>,
    /// Number of coordination slots in the bond-count tensor, and the
    /// coordination ceiling for connectivity counts.
    pub max_bonds: usize,
    /// Recompute and attach a neighbour list before the distribution and
    /// connectivity fingerprints.
    pub get_nl: bool,
    /// Margin (Å) added to the summed covalent radii when building neighbour lists.
    pub dx: f64,
    /// Edge (Å) of the cubic cell imposed before the distribution fingerprint.
    pub cell_size: f64,
    /// Bins of the per-element distribution histogram.
    pub nbin: usize,
    /// Bins of each partial RDF.
    pub nbins: usize,
    /// Outer radius (Å) of each partial RDF.
    pub rmax: f64,
    /// How an inferred element set follows later structures.
    pub inference: InferencePolicy,
}

impl Default for FingerprintOptions {
    fn default() -> Self {
        Self {
            atom_types: None,
            max_bonds: 13,
            get_nl: false,
            dx: 0.2,
            cell_size: 50.0,
            nbin: 4,
            nbins: 5,
            rmax: 8.0,
            inference: InferencePolicy::PinFirst,
        }
    }
}

impl FingerprintOptions {
    pub fn with_atom_types(mut self, atom_types: impl Into<Vec<u8>>) -> Self {
        self.atom_types = Some(atom_types.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(FingerprintError::InvalidOptions(msg));

        if matches!(&self.atom_types, Some(types) if types.is_empty()) {
            return invalid("atom_types is empty; use None to infer it".to_string());
        }
        if self.max_bonds == 0 {
            return invalid("max_bonds must be at least 1".to_string());
        }
        if self.nbin < 2 {
            return invalid(format!("nbin must be at least 2, got {}", self.nbin));
        }
        if self.nbins == 0 {
            return invalid("nbins must be at least 1".to_string());
        }
        if !(self.rmax.is_finite() && self.rmax > 0.0) {
            return invalid(format!("rmax must be positive, got {}", self.rmax));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return invalid(format!("cell_size must be positive, got {}", self.cell_size));
        }
        if !(self.dx.is_finite() && self.dx >= 0.0) {
            return invalid(format!("dx must be non-negative, got {}", self.dx));
        }
        Ok(())
    }
}
