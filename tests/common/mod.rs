#![allow(dead_code)]

use parking_lot::Mutex;
use particle_fingerprint::core::domain::{Atom, AtomicStructure, Cell};
use particle_fingerprint::engine::providers::RdfProvider;
use particle_fingerprint::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub const FE: u8 = 26;
pub const NI: u8 = 28;
pub const PT: u8 = 78;

/// Two iron atoms 2.5 Å apart in a 20 Å box.
pub fn fe_dimer() -> AtomicStructure {
    AtomicStructure::new(vec![Atom::new(FE, 0.0, 0.0, 0.0), Atom::new(FE, 2.5, 0.0, 0.0)])
        .with_cell(Cell::cubic(20.0))
}

/// Equilateral Pt3 triangle (2 Å from its centre) with a Ni atom at the centroid.
/// Atoms 0..3 are Pt, atom 3 is Ni.
pub fn centred_triangle() -> AtomicStructure {
    let s3 = 3.0_f64.sqrt();
    AtomicStructure::new(vec![
        Atom::new(PT, 2.0, 0.0, 0.0),
        Atom::new(PT, -1.0, s3, 0.0),
        Atom::new(PT, -1.0, -s3, 0.0),
        Atom::new(NI, 0.0, 0.0, 0.0),
    ])
    .with_cell(Cell::cubic(20.0))
}

/// Reproducible random Pt/Ni cluster in a 30 Å box.
pub fn random_cluster(seed: u64, n_pt: usize, n_ni: usize) -> AtomicStructure {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    AtomicStructure::random(&[(PT, n_pt), (NI, n_ni)], 6.0, 2.2, &mut rng)
        .expect("Failed to pack random cluster")
        .with_cell(Cell::cubic(30.0))
}

pub fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() <= tol, "entry {}: {} vs {}", i, a, e);
    }
}

/// RDF backend returning `nbins` copies of `pair.0 * 1000 + pair.1` and recording
/// the pairs it was asked for.
#[derive(Default)]
pub struct RecordingRdf {
    pub pairs: Mutex<Vec<(u8, u8)>>,
}

impl RdfProvider for RecordingRdf {
    fn partial_rdf(
        &self,
        _structure: &AtomicStructure,
        _rmax: f64,
        nbins: usize,
        pair: (u8, u8),
    ) -> Result<Vec<f64>> {
        self.pairs.lock().push(pair);
        Ok(vec![pair.0 as f64 * 1000.0 + pair.1 as f64; nbins])
    }

    fn name(&self) -> &str {
        "recording"
    }
}
