use std::sync::Arc;

use crate::analysis::connectivity::CoordinationCounts;
use crate::analysis::distribution::ShellDistribution;
use crate::analysis::neighbors::CovalentNeighborList;
use crate::analysis::rdf;
use crate::core::domain::{AtomicStructure, NeighborList};
use crate::core::spatial::{self, DistanceMatrix};
use crate::error::Result;

/// Source of full pairwise distance matrices.
pub trait DistanceMatrixProvider: Send + Sync {
    fn distance_matrix(&self, structure: &AtomicStructure) -> Result<DistanceMatrix>;
}

/// Builds neighbour lists from covalent radii plus an additive margin `dx`.
pub trait NeighborListProvider: Send + Sync {
    fn neighbor_list(&self, structure: &AtomicStructure, dx: f64) -> Result<NeighborList>;
}

/// Partial radial distribution backend.
/// Implementations must be Thread-Safe (Sync) and agree numerically with
/// [`rdf::DistanceMatrixRdf`] for the same inputs.
pub trait RdfProvider: Send + Sync {
    /// `nbins` RDF values restricted to centre atoms of `pair.0` and partners of `pair.1`.
    fn partial_rdf(
        &self,
        structure: &AtomicStructure,
        rmax: f64,
        nbins: usize,
        pair: (u8, u8),
    ) -> Result<Vec<f64>>;

    /// Partial RDFs for several pairs, in `pairs` order. Backends that can share
    /// work between pairs override this.
    fn partial_rdfs(
        &self,
        structure: &AtomicStructure,
        rmax: f64,
        nbins: usize,
        pairs: &[(u8, u8)],
    ) -> Result<Vec<Vec<f64>>> {
        pairs
            .iter()
            .map(|&pair| self.partial_rdf(structure, rmax, nbins, pair))
            .collect()
    }

    /// Returns the name of the backend (e.g., "rayon").
    fn name(&self) -> &str;
}

/// Histogram of where atoms sit in the cell, `nbin` bins, ignoring `exclude` types.
pub trait DistributionProvider: Send + Sync {
    fn distribution(&self, structure: &AtomicStructure, nbin: usize, exclude: &[u8])
        -> Result<Vec<f64>>;
}

/// Number of atoms per coordination number, `max_conn + 1` entries, ignoring `exclude` types.
pub trait ConnectivityProvider: Send + Sync {
    fn connectivity_counts(
        &self,
        structure: &AtomicStructure,
        max_conn: usize,
        exclude: &[u8],
    ) -> Result<Vec<f64>>;
}

/// Plain Euclidean matrix from [`spatial::distance_matrix`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanDistances;

impl DistanceMatrixProvider for EuclideanDistances {
    fn distance_matrix(&self, structure: &AtomicStructure) -> Result<DistanceMatrix> {
        Ok(spatial::distance_matrix(structure))
    }
}

/// The collaborators a generator delegates to.
#[derive(Clone)]
pub struct Providers {
    pub distances: Arc<dyn DistanceMatrixProvider>,
    pub neighbors: Arc<dyn NeighborListProvider>,
    pub rdf: Arc<dyn RdfProvider>,
    pub distribution: Arc<dyn DistributionProvider>,
    pub connectivity: Arc<dyn ConnectivityProvider>,
}

impl Default for Providers {
    /// Built-in collaborators, with the RDF backend picked once per process.
    fn default() -> Self {
        Self {
            distances: Arc::new(EuclideanDistances),
            neighbors: Arc::new(CovalentNeighborList),
            rdf: rdf::default_backend(),
            distribution: Arc::new(ShellDistribution::default()),
            connectivity: Arc::new(CoordinationCounts::default()),
        }
    }
}

impl Providers {
    pub fn with_rdf(mut self, rdf: Arc<dyn RdfProvider>) -> Self {
        self.rdf = rdf;
        self
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers")
            .field("rdf", &self.rdf.name())
            .finish_non_exhaustive()
    }
}
