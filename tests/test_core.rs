use particle_fingerprint::core::chemistry::{self, CutoffGrid};
use particle_fingerprint::core::domain::{Atom, AtomicStructure, Cell};
use particle_fingerprint::core::spatial;
use particle_fingerprint::FingerprintError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::common::{centred_triangle, random_cluster, NI, PT};

mod common;

#[test]
fn test_element_tables() {
    assert_eq!(chemistry::atomic_number("Pt"), Some(78));
    assert_eq!(chemistry::atomic_number("pt"), Some(78));
    assert_eq!(chemistry::atomic_number("X"), None);
    assert_eq!(chemistry::symbol(26), Some("Fe"));
    assert!((chemistry::covalent_radius(28).unwrap() - 1.24).abs() < 1e-12);
    assert_eq!(chemistry::covalent_radius(200), None);
}

#[test]
fn test_cutoff_grid() {
    let grid = CutoffGrid::new(&[PT, NI, PT], 0.2).unwrap();
    assert_eq!(grid.species(), &[NI, PT]);

    // (1.24 + 1.36 + 0.2)^2 = 2.8^2
    assert!((grid.get_cutoff_sq(NI, PT).unwrap() - 7.84).abs() < 1e-9);
    assert!((grid.get_cutoff_sq(PT, NI).unwrap() - 7.84).abs() < 1e-9);
    // (1.36 * 2 + 0.2)^2 = 2.92^2
    assert!((grid.get_cutoff_sq(PT, PT).unwrap() - 8.5264).abs() < 1e-9);
    assert_eq!(grid.get_cutoff_sq(PT, 26), None);
}

#[test]
fn test_cutoff_grid_unknown_element() {
    let err = CutoffGrid::new(&[NI, 150], 0.2).unwrap_err();
    assert!(matches!(err, FingerprintError::UnknownElement(150)));
}

#[test]
fn test_distance_matrix_symmetry() {
    for seed in 0..5 {
        let s = random_cluster(seed, 6, 5);
        let dm = spatial::distance_matrix(&s);
        assert_eq!(dm.n(), s.len());
        assert!(dm.is_symmetric(0.0));
        for i in 0..dm.n() {
            assert_eq!(dm.get(i, i), 0.0);
        }
    }
}

#[test]
fn test_distance_matrix_values() {
    let s = centred_triangle();
    let dm = spatial::distance_matrix(&s);
    assert!((dm.get(0, 3) - 2.0).abs() < 1e-12);
    assert!((dm.get(0, 1) - 12.0_f64.sqrt()).abs() < 1e-12);
}

#[test]
fn test_cell_geometry() {
    let cell = Cell::cubic(50.0);
    assert!((cell.volume() - 125_000.0).abs() < 1e-6);
    assert_eq!(cell.center(), nalgebra::Point3::new(25.0, 25.0, 25.0));
    assert_eq!(Cell::default().volume(), 0.0);
}

#[test]
fn test_center_in_cubic_cell() {
    let mut s = centred_triangle();
    s.set_cubic_cell(50.0);
    s.center();

    // Bounding box x in [-1, 2] is centred at 0.5, so Ni moves from 0 to 24.5.
    let ni = s.atoms[3].position;
    assert!((ni.x - 24.5).abs() < 1e-9);
    assert!((ni.y - 25.0).abs() < 1e-9);
    assert!((ni.z - 25.0).abs() < 1e-9);

    // Relative geometry is preserved.
    let dm = spatial::distance_matrix(&s);
    assert!((dm.get(0, 3) - 2.0).abs() < 1e-9);
}

#[test]
fn test_center_without_cell_uses_origin() {
    let mut s = AtomicStructure::new(vec![Atom::new(NI, 2.0, 2.0, 2.0), Atom::new(NI, 4.0, 2.0, 2.0)]);
    s.center();
    assert!((s.atoms[0].position.x + 1.0).abs() < 1e-12);
    assert!((s.atoms[1].position.x - 1.0).abs() < 1e-12);
    assert!(s.atoms[0].position.y.abs() < 1e-12);
}

#[test]
fn test_prepared_leaves_original() {
    let s = centred_triangle();
    let p = s.prepared(40.0);
    assert_eq!(s, centred_triangle());
    assert_eq!(p.cell, Cell::cubic(40.0));
    assert!((p.atoms[3].position.y - 20.0).abs() < 1e-9);
}

#[test]
fn test_random_cluster_creation() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let s = AtomicStructure::random(&[(PT, 5), (NI, 5)], 6.0, 2.0, &mut rng);

    assert!(s.is_some(), "Structure creation failed");
    let s = s.unwrap();
    assert_eq!(s.len(), 10);
    assert_eq!(s.count_of(PT), 5);
    assert_eq!(s.count_of(NI), 5);
    assert_eq!(s.unique_numbers(), vec![NI, PT]);

    let dm = spatial::distance_matrix(&s);
    for i in 0..s.len() {
        for j in (i + 1)..s.len() {
            assert!(dm.get(i, j) >= 2.0);
        }
    }
}

#[test]
fn test_random_cluster_reproducible() {
    let a = random_cluster(9, 4, 4);
    let b = random_cluster(9, 4, 4);
    assert_eq!(a, b);
}
