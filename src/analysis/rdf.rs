//! Radial distribution functions.
//!
//! Binning: a pair at distance `d` lands in bin `ceil(d / dr)`; bin 0 (coincident
//! atoms, including self pairs) is dropped and bins beyond `nbins` are ignored.
//! Bin `i` is centred on `r = (i - 1/2)·dr` and normalized by
//! `norm·(r² + dr²/12)`, where `norm = 2π·dr·ρ·N` for the aggregate curve and
//! `4π·dr·ρ_a·N` for the partial curve of pair `(a, b)`. The aggregate curve counts
//! each unordered pair once; a partial curve counts every `a → b` pair.

use std::f64::consts::PI;
use std::sync::{Arc, OnceLock};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::domain::AtomicStructure;
use crate::core::spatial::{self, DistanceMatrix};
use crate::engine::providers::RdfProvider;
use crate::error::{FingerprintError, Result};

/// RDF intensities paired with their bin centres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RdfCurve {
    pub distances: Vec<f64>,
    pub values: Vec<f64>,
}

impl RdfCurve {
    /// Distance at the global maximum. Ties resolve to the shortest distance.
    pub fn first_peak(&self) -> Option<f64> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.values.iter().enumerate() {
            if v.is_nan() {
                continue;
            }
            if best.map_or(true, |(_, b)| v > b) {
                best = Some((i, v));
            }
        }
        best.map(|(i, _)| self.distances[i])
    }
}

#[inline]
fn accumulate(counts: &mut [f64], d: f64, dr: f64, nbins: usize) {
    let index = (d / dr).ceil();
    if index <= nbins as f64 {
        counts[index as usize] += 1.0;
    }
}

fn normalization(structure: &AtomicStructure, dr: f64, pair: Option<(u8, u8)>) -> Result<f64> {
    let volume = structure.cell.volume();
    if volume <= 0.0 || !volume.is_finite() {
        return Err(FingerprintError::DegenerateCell { volume });
    }
    let n = structure.len() as f64;

    Ok(match pair {
        None => 2.0 * PI * dr * (n / volume) * n,
        Some((a, _)) => 4.0 * PI * dr * (structure.count_of(a) as f64 / volume) * n,
    })
}

/// Turns raw counts (`nbins + 1` entries, bin 0 included) into a normalized curve.
fn finish(counts: &[f64], dr: f64, norm: f64) -> RdfCurve {
    let nbins = counts.len() - 1;
    let mut distances = Vec::with_capacity(nbins);
    let mut values = Vec::with_capacity(nbins);

    for (i, &count) in counts.iter().enumerate().skip(1) {
        let r = (i as f64 - 0.5) * dr;
        distances.push(r);
        // An absent centre species gives norm 0 and no counts.
        values.push(if norm > 0.0 {
            count / (norm * (r * r + dr * dr / 12.0))
        } else {
            0.0
        });
    }

    RdfCurve { distances, values }
}

fn indices_of(structure: &AtomicStructure, number: u8) -> Vec<usize> {
    structure
        .atoms
        .iter()
        .enumerate()
        .filter(|(_, a)| a.number == number)
        .map(|(i, _)| i)
        .collect()
}

/// Counts of every unordered pair `i < j`.
fn aggregate_counts(dm: &DistanceMatrix, dr: f64, nbins: usize) -> Vec<f64> {
    let mut counts = vec![0.0; nbins + 1];
    let n = dm.n();
    for i in 0..n {
        for j in (i + 1)..n {
            accumulate(&mut counts, dm.get(i, j), dr, nbins);
        }
    }
    counts
}

/// Aggregate RDF shape without the density factor, so it needs no cell.
///
/// Every bin differs from [`radial_distribution`] with `pair = None` by the same
/// constant, so peak positions agree.
pub fn pair_profile(dm: &DistanceMatrix, rmax: f64, nbins: usize) -> RdfCurve {
    let dr = rmax / nbins as f64;
    finish(&aggregate_counts(dm, dr, nbins), dr, 1.0)
}

/// RDF of `structure` from a precomputed distance matrix over `(0, rmax]` with
/// `nbins` bins. With `pair = Some((a, b))` only pairs from an `a` atom to a `b`
/// atom are counted.
pub fn radial_distribution(
    structure: &AtomicStructure,
    dm: &DistanceMatrix,
    rmax: f64,
    nbins: usize,
    pair: Option<(u8, u8)>,
) -> Result<RdfCurve> {
    let dr = rmax / nbins as f64;
    let norm = normalization(structure, dr, pair)?;

    let counts = match pair {
        None => aggregate_counts(dm, dr, nbins),
        Some((a, b)) => {
            let mut counts = vec![0.0; nbins + 1];
            let partners = indices_of(structure, b);
            for i in indices_of(structure, a) {
                for &j in &partners {
                    accumulate(&mut counts, dm.get(i, j), dr, nbins);
                }
            }
            counts
        }
    };

    Ok(finish(&counts, dr, norm))
}

/// Fallback backend: one distance matrix per structure, every partial RDF
/// derived from it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceMatrixRdf;

impl RdfProvider for DistanceMatrixRdf {
    fn partial_rdf(
        &self,
        structure: &AtomicStructure,
        rmax: f64,
        nbins: usize,
        pair: (u8, u8),
    ) -> Result<Vec<f64>> {
        let mut all = self.partial_rdfs(structure, rmax, nbins, &[pair])?;
        Ok(all.pop().unwrap_or_default())
    }

    fn partial_rdfs(
        &self,
        structure: &AtomicStructure,
        rmax: f64,
        nbins: usize,
        pairs: &[(u8, u8)],
    ) -> Result<Vec<Vec<f64>>> {
        let dm = spatial::distance_matrix(structure);
        pairs
            .iter()
            .map(|&pair| Ok(radial_distribution(structure, &dm, rmax, nbins, Some(pair))?.values))
            .collect()
    }

    fn name(&self) -> &str {
        "distance-matrix"
    }
}

/// Accelerated backend: distances straight from positions, centre atoms split
/// across the rayon pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelRdf;

impl RdfProvider for ParallelRdf {
    fn partial_rdf(
        &self,
        structure: &AtomicStructure,
        rmax: f64,
        nbins: usize,
        pair: (u8, u8),
    ) -> Result<Vec<f64>> {
        let dr = rmax / nbins as f64;
        let norm = normalization(structure, dr, Some(pair))?;

        let atoms = &structure.atoms;
        let centres = indices_of(structure, pair.0);
        let partners = indices_of(structure, pair.1);

        let counts = centres
            .par_iter()
            .fold(
                || vec![0.0; nbins + 1],
                |mut local, &i| {
                    for &j in &partners {
                        let d = spatial::distance(&atoms[i].position, &atoms[j].position);
                        accumulate(&mut local, d, dr, nbins);
                    }
                    local
                },
            )
            .reduce(
                || vec![0.0; nbins + 1],
                |mut acc, local| {
                    for (a, l) in acc.iter_mut().zip(local) {
                        *a += l;
                    }
                    acc
                },
            );

        Ok(finish(&counts, dr, norm).values)
    }

    fn name(&self) -> &str {
        "rayon"
    }
}

/// Which partial RDF backend the process uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RdfBackendKind {
    Parallel,
    DistanceMatrix,
}

impl RdfBackendKind {
    /// Capability check: the rayon backend needs the `parallel` feature and more
    /// than one hardware thread.
    pub fn detect() -> Self {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        if cfg!(feature = "parallel") && threads > 1 {
            RdfBackendKind::Parallel
        } else {
            RdfBackendKind::DistanceMatrix
        }
    }

    pub fn build(self) -> Arc<dyn RdfProvider> {
        match self {
            RdfBackendKind::Parallel => Arc::new(ParallelRdf),
            RdfBackendKind::DistanceMatrix => Arc::new(DistanceMatrixRdf),
        }
    }
}

static SELECTED_BACKEND: OnceLock<RdfBackendKind> = OnceLock::new();

/// Backend chosen by [`RdfBackendKind::detect`] on first use; fixed for the process lifetime.
pub fn selected_backend() -> RdfBackendKind {
    *SELECTED_BACKEND.get_or_init(|| {
        let kind = RdfBackendKind::detect();
        log::debug!("Partial RDF backend selected: {:?}", kind);
        kind
    })
}

pub fn default_backend() -> Arc<dyn RdfProvider> {
    selected_backend().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_peak_prefers_earliest_maximum() {
        let curve = RdfCurve {
            distances: vec![0.5, 1.5, 2.5, 3.5],
            values: vec![0.0, 2.0, 2.0, 1.0],
        };
        assert_eq!(curve.first_peak(), Some(1.5));
    }

    #[test]
    fn first_peak_of_flat_curve_is_first_bin() {
        let curve = RdfCurve {
            distances: vec![0.5, 1.5],
            values: vec![0.0, 0.0],
        };
        assert_eq!(curve.first_peak(), Some(0.5));
    }

    #[test]
    fn accumulate_drops_out_of_range() {
        let mut counts = vec![0.0; 3];
        accumulate(&mut counts, 0.0, 1.0, 2);
        accumulate(&mut counts, 1.5, 1.0, 2);
        accumulate(&mut counts, 2.5, 1.0, 2);
        assert_eq!(counts, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn aggregate_counts_each_pair_once() {
        let dm = spatial::distance_matrix(&AtomicStructure::new(vec![
            crate::core::domain::Atom::new(26, 0.0, 0.0, 0.0),
            crate::core::domain::Atom::new(26, 1.5, 0.0, 0.0),
        ]));
        assert_eq!(aggregate_counts(&dm, 1.0, 2), vec![0.0, 0.0, 1.0]);
    }
}
