use std::collections::BTreeMap;

use nalgebra::{Matrix3, Point3, Vector3};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

// --- Physics Types ---

/// A single atom: species identity plus Cartesian position (Å).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub number: u8,
    pub position: Point3<f64>,
}

impl Atom {
    pub fn new(number: u8, x: f64, y: f64, z: f64) -> Self {
        Self {
            number,
            position: Point3::new(x, y, z),
        }
    }
}

/// Simulation box. Columns are the cell vectors a, b, c.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub vectors: Matrix3<f64>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            vectors: Matrix3::zeros(),
        }
    }
}

impl Cell {
    pub fn new(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> Self {
        Self {
            vectors: Matrix3::from_columns(&[a, b, c]),
        }
    }

    /// Isotropic box of edge `edge`.
    pub fn cubic(edge: f64) -> Self {
        Self {
            vectors: Matrix3::from_diagonal_element(edge),
        }
    }

    pub fn volume(&self) -> f64 {
        self.vectors.determinant().abs()
    }

    /// Geometric centre of the box, (a + b + c) / 2.
    pub fn center(&self) -> Point3<f64> {
        Point3::from(self.vectors.column_sum() * 0.5)
    }
}

/// Bonded partners per atom. Entry `i` holds the indices bonded to atom `i`;
/// an atom never lists itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborList {
    pub neighbors: Vec<Vec<usize>>,
}

impl NeighborList {
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Coordination number of atom `index` (0 if the index is not covered).
    pub fn degree(&self, index: usize) -> usize {
        self.neighbors.get(index).map_or(0, Vec::len)
    }
}

/// Auxiliary side-channel carried with a structure between generator calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureInfo {
    /// Neighbour list attached by `get_nl` runs or supplied by the caller.
    pub neighbor_list: Option<NeighborList>,
    /// Arbitrary caller data.
    pub data: BTreeMap<String, serde_json::Value>,
}

// --- The Core Entity ---

/// A particle: ordered atoms, a cell and an auxiliary store.
///
/// Generator methods that need a re-celled, centred structure take `&mut self`
/// and rewrite the cell, the positions and possibly `info.neighbor_list` in place.
/// Use [`AtomicStructure::prepared`] to obtain such a structure as a new value instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtomicStructure {
    pub atoms: Vec<Atom>,
    pub cell: Cell,
    pub info: StructureInfo,
}

impl AtomicStructure {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self {
            atoms,
            ..Default::default()
        }
    }

    pub fn with_cell(mut self, cell: Cell) -> Self {
        self.cell = cell;
        self
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atomic_numbers(&self) -> Vec<u8> {
        self.atoms.iter().map(|a| a.number).collect()
    }

    /// Distinct atomic numbers present, ascending.
    pub fn unique_numbers(&self) -> Vec<u8> {
        let mut numbers = self.atomic_numbers();
        numbers.sort_unstable();
        numbers.dedup();
        numbers
    }

    /// Number of atoms with atomic number `number`.
    pub fn count_of(&self, number: u8) -> usize {
        self.atoms.iter().filter(|a| a.number == number).count()
    }

    pub fn set_cubic_cell(&mut self, edge: f64) {
        self.cell = Cell::cubic(edge);
    }

    /// Translates the atoms so the centre of their bounding box coincides with
    /// the cell centre. For a singular cell the bounding box is centred on the origin.
    ///
    /// **Invariant**: Modifies positions in-place. Does NOT reorder atoms.
    pub fn center(&mut self) {
        if self.atoms.is_empty() {
            return;
        }

        match self.cell.vectors.try_inverse() {
            Some(inverse) => {
                // Work in fractional space so skewed cells centre along the cell axes.
                let (lo, hi) = bounding_box(self.atoms.iter().map(|a| inverse * a.position.coords));
                let shift_frac = Vector3::repeat(0.5) - (lo + hi) * 0.5;
                let shift = self.cell.vectors * shift_frac;
                for atom in &mut self.atoms {
                    atom.position += shift;
                }
            }
            None => {
                let (lo, hi) = bounding_box(self.atoms.iter().map(|a| a.position.coords));
                let shift = -(lo + hi) * 0.5;
                for atom in &mut self.atoms {
                    atom.position += shift;
                }
            }
        }
    }

    /// Returns a copy with a cubic cell of edge `cell_size` and centred atoms.
    pub fn prepared(&self, cell_size: f64) -> Self {
        let mut out = self.clone();
        out.set_cubic_cell(cell_size);
        out.center();
        out
    }

    /// Random cluster with the given composition, placed by random sequential
    /// adsorption inside a cube of half-edge `box_size` and centred on the origin.
    ///
    /// # Arguments
    /// * `composition`: `(atomic_number, count)` pairs, e.g. `[(78, 6), (28, 6)]`.
    /// * `min_distance`: no two atoms end up closer than this.
    ///
    /// Returns `None` when an atom cannot be placed within 100 attempts.
    pub fn random<R: Rng + ?Sized>(
        composition: &[(u8, usize)],
        box_size: f64,
        min_distance: f64,
        rng: &mut R,
    ) -> Option<Self> {
        let mut to_place: Vec<u8> = composition
            .iter()
            .flat_map(|&(number, count)| std::iter::repeat(number).take(count))
            .collect();
        to_place.shuffle(rng);

        let limit_sq = min_distance * min_distance;
        let mut atoms: Vec<Atom> = Vec::with_capacity(to_place.len());

        for number in to_place {
            let mut placed = false;

            for _ in 0..100 {
                let pos = Point3::new(
                    rng.gen_range(-box_size..box_size),
                    rng.gen_range(-box_size..box_size),
                    rng.gen_range(-box_size..box_size),
                );
                let clash = atoms
                    .iter()
                    .any(|existing| (pos - existing.position).norm_squared() < limit_sq);

                if !clash {
                    atoms.push(Atom {
                        number,
                        position: pos,
                    });
                    placed = true;
                    break;
                }
            }
            if !placed {
                return None;
            }
        }

        // Center the cluster
        if !atoms.is_empty() {
            let mut com = Vector3::zeros();
            for a in &atoms {
                com += a.position.coords;
            }
            com /= atoms.len() as f64;
            for a in &mut atoms {
                a.position -= com;
            }
        }

        Some(Self::new(atoms))
    }
}

fn bounding_box(points: impl Iterator<Item = Vector3<f64>>) -> (Vector3<f64>, Vector3<f64>) {
    let mut lo = Vector3::repeat(f64::INFINITY);
    let mut hi = Vector3::repeat(f64::NEG_INFINITY);
    for p in points {
        lo = lo.inf(&p);
        hi = hi.sup(&p);
    }
    (lo, hi)
}
