use std::io::Cursor;
use std::path::PathBuf;

use particle_fingerprint::core::domain::Cell;
use particle_fingerprint::engine::generator::GeneratorState;
use particle_fingerprint::io::{model, xyz};
use particle_fingerprint::{FingerprintError, FingerprintGenerator, FingerprintOptions};

use crate::common::{centred_triangle, random_cluster, NI, PT};

mod common;

const TWO_FRAMES: &str = "\
4
Lattice=\"20.0 0.0 0.0 0.0 20.0 0.0 0.0 0.0 20.0\" Properties=species:S:1:pos:R:3
Pt1  2.0  0.0  0.0
pt  -1.0  1.7320508075688772  0.0
78  -1.0 -1.7320508075688772  0.0
Ni   0.0  0.0  0.0

2
dimer
Fe 0.0 0.0 0.0
Fe 2.5 0.0 0.0
";

fn temp_stem(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("particle_fingerprint_{}_{}", name, std::process::id()))
}

#[test]
fn test_read_frames() {
    let frames = xyz::read_frames(Cursor::new(TWO_FRAMES), "inline").unwrap();
    assert_eq!(frames.len(), 2);

    let triangle = &frames[0];
    assert_eq!(triangle.atomic_numbers(), vec![PT, PT, PT, NI]);
    assert_eq!(triangle.cell, Cell::cubic(20.0));
    assert!((triangle.atoms[1].position.y - 3.0_f64.sqrt()).abs() < 1e-12);

    let dimer = &frames[1];
    assert_eq!(dimer.atomic_numbers(), vec![26, 26]);
    assert_eq!(dimer.cell, Cell::default());
    assert_eq!(
        dimer.info.data.get("comment"),
        Some(&serde_json::Value::from("dimer"))
    );
}

#[test]
fn test_plain_xyz_fingerprints() {
    let frames = xyz::read_frames(Cursor::new("2\nplain\nFe 0 0 0\nFe 2.5 0 0\n"), "plain").unwrap();
    let gen = FingerprintGenerator::new(FingerprintOptions::default()).unwrap();
    assert_eq!(gen.nearest_neighbour_vec(&frames[0]).unwrap(), vec![2.0]);
}

#[test]
fn test_parse_element_tokens() {
    assert_eq!(xyz::parse_element("Ni"), Some(NI));
    assert_eq!(xyz::parse_element("NI"), Some(NI));
    assert_eq!(xyz::parse_element("Ni12"), Some(NI));
    assert_eq!(xyz::parse_element("28"), Some(NI));
    assert_eq!(xyz::parse_element("0"), None);
    assert_eq!(xyz::parse_element("Qq"), None);
    assert_eq!(xyz::parse_element("N1i"), None);
}

#[test]
fn test_read_errors() {
    let cases = [
        "x\ncomment\n",
        "2\ncomment\nNi 0 0 0\n",
        "1\ncomment\nNi 0 0\n",
        "1\ncomment\nZz 0 0 0\n",
        "1\ncomment\nNi 0 a 0\n",
        "1\nLattice=\"1 2 3\"\nNi 0 0 0\n",
    ];
    for text in cases {
        let err = xyz::read_frames(Cursor::new(text), "bad").unwrap_err();
        assert!(matches!(err, FingerprintError::Xyz { .. }), "accepted {:?}", text);
    }
}

#[test]
fn test_write_then_read_frame() {
    let s = centred_triangle();
    let text = xyz::write_frame(&s, "triangle");
    let frames = xyz::read_frames(Cursor::new(text), "written").unwrap();
    assert_eq!(frames[0].atomic_numbers(), s.atomic_numbers());
    for (a, b) in frames[0].atoms.iter().zip(&s.atoms) {
        assert!((a.position - b.position).norm() < 1e-7);
    }
}

#[test]
fn test_fingerprint_file_round_trip() {
    let gen = FingerprintGenerator::new(FingerprintOptions::default()).unwrap();
    let vectors: Vec<Vec<f64>> = (0..3)
        .map(|seed| gen.rdf_vec(&random_cluster(seed, 5, 5)).unwrap())
        .collect();

    let stem = temp_stem("vectors");
    let path = model::write(&stem, &vectors).unwrap();
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));

    let back: Vec<Vec<f64>> = model::read(&stem).unwrap();
    // Bit-identical, not merely close.
    assert_eq!(back, vectors);
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_state_bytes_round_trip() {
    let gen = FingerprintGenerator::new(FingerprintOptions {
        dx: 0.35,
        rmax: 7.3,
        ..FingerprintOptions::default().with_atom_types(vec![PT, NI])
    })
    .unwrap();
    let state = gen.state();

    let bytes = model::to_bytes(&state).unwrap();
    let back: GeneratorState = model::from_bytes(&bytes).unwrap();
    assert_eq!(back, state);
    assert_eq!(back.pinned_elements, None);
}

#[test]
fn test_structure_round_trip() {
    let mut s = random_cluster(11, 4, 3);
    s.info.neighbor_list = Some(particle_fingerprint::analysis::neighbors::build_neighbor_list(&s, 0.2).unwrap());
    let bytes = model::to_bytes(&s).unwrap();
    let back: particle_fingerprint::AtomicStructure = model::from_bytes(&bytes).unwrap();
    assert_eq!(back, s);
}

#[test]
fn test_read_missing_model() {
    let err = model::read::<Vec<f64>>(temp_stem("does_not_exist")).unwrap_err();
    assert!(matches!(err, FingerprintError::Io { .. }));
}
