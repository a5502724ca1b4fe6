use serde::{Deserialize, Serialize};

use crate::error::{FingerprintError, Result};

/// Element symbols and covalent radii (Å, Cordero et al. 2008), indexed by atomic number.
/// Index 0 is the dummy species `X`.
const ELEMENTS: [(&str, f64); 97] = [
    ("X", 0.20),
    ("H", 0.31), ("He", 0.28), ("Li", 1.28), ("Be", 0.96), ("B", 0.84),
    ("C", 0.76), ("N", 0.71), ("O", 0.66), ("F", 0.57), ("Ne", 0.58),
    ("Na", 1.66), ("Mg", 1.41), ("Al", 1.21), ("Si", 1.11), ("P", 1.07),
    ("S", 1.05), ("Cl", 1.02), ("Ar", 1.06), ("K", 2.03), ("Ca", 1.76),
    ("Sc", 1.70), ("Ti", 1.60), ("V", 1.53), ("Cr", 1.39), ("Mn", 1.39),
    ("Fe", 1.32), ("Co", 1.26), ("Ni", 1.24), ("Cu", 1.32), ("Zn", 1.22),
    ("Ga", 1.22), ("Ge", 1.20), ("As", 1.19), ("Se", 1.20), ("Br", 1.20),
    ("Kr", 1.16), ("Rb", 2.20), ("Sr", 1.95), ("Y", 1.90), ("Zr", 1.75),
    ("Nb", 1.64), ("Mo", 1.54), ("Tc", 1.47), ("Ru", 1.46), ("Rh", 1.42),
    ("Pd", 1.39), ("Ag", 1.45), ("Cd", 1.44), ("In", 1.42), ("Sn", 1.39),
    ("Sb", 1.39), ("Te", 1.38), ("I", 1.39), ("Xe", 1.40), ("Cs", 2.44),
    ("Ba", 2.15), ("La", 2.07), ("Ce", 2.04), ("Pr", 2.03), ("Nd", 2.01),
    ("Pm", 1.99), ("Sm", 1.98), ("Eu", 1.98), ("Gd", 1.96), ("Tb", 1.94),
    ("Dy", 1.92), ("Ho", 1.92), ("Er", 1.89), ("Tm", 1.90), ("Yb", 1.87),
    ("Lu", 1.87), ("Hf", 1.75), ("Ta", 1.70), ("W", 1.62), ("Re", 1.51),
    ("Os", 1.44), ("Ir", 1.41), ("Pt", 1.36), ("Au", 1.36), ("Hg", 1.32),
    ("Tl", 1.45), ("Pb", 1.46), ("Bi", 1.48), ("Po", 1.40), ("At", 1.50),
    ("Rn", 1.50), ("Fr", 2.60), ("Ra", 2.21), ("Ac", 2.15), ("Th", 2.06),
    ("Pa", 2.00), ("U", 1.96), ("Np", 1.90), ("Pu", 1.87), ("Am", 1.80),
    ("Cm", 1.69),
];

pub fn covalent_radius(number: u8) -> Option<f64> {
    ELEMENTS.get(number as usize).map(|&(_, r)| r)
}

pub fn symbol(number: u8) -> Option<&'static str> {
    ELEMENTS.get(number as usize).map(|&(s, _)| s)
}

/// Case-insensitive symbol lookup ("pt", "PT" and "Pt" all give 78).
pub fn atomic_number(symbol: &str) -> Option<u8> {
    ELEMENTS
        .iter()
        .position(|(s, _)| s.eq_ignore_ascii_case(symbol))
        .and_then(|idx| u8::try_from(idx).ok())
        .filter(|&z| z > 0)
}

/// A flattened 2D matrix of squared bond cutoffs between the species of one structure.
/// Access is O(1) via `index = i * N + j`, where `i`, `j` index `species()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutoffGrid {
    species: Vec<u8>,
    /// Stores (r_cov_i + r_cov_j + dx)^2
    cutoff_matrix_sq: Vec<f64>,
}

impl CutoffGrid {
    /// Builds the grid for the distinct atomic numbers in `numbers`.
    /// `dx`: margin added to the summed covalent radii.
    pub fn new(numbers: &[u8], dx: f64) -> Result<Self> {
        let mut species = numbers.to_vec();
        species.sort_unstable();
        species.dedup();

        let radii = species
            .iter()
            .map(|&z| covalent_radius(z).ok_or(FingerprintError::UnknownElement(z)))
            .collect::<Result<Vec<f64>>>()?;

        let n = species.len();
        let mut grid = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                let cutoff = radii[i] + radii[j] + dx;
                grid[i * n + j] = cutoff * cutoff;
            }
        }

        Ok(Self {
            species,
            cutoff_matrix_sq: grid,
        })
    }

    pub fn species(&self) -> &[u8] {
        &self.species
    }

    /// Index of `number` within `species()`.
    #[inline]
    pub fn index_of(&self, number: u8) -> Option<usize> {
        self.species.binary_search(&number).ok()
    }

    /// Squared distance below which two atoms of the given atomic numbers are bonded.
    /// `None` when either number was not part of the grid.
    #[inline]
    pub fn get_cutoff_sq(&self, a: u8, b: u8) -> Option<f64> {
        let n = self.species.len();
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        Some(self.cutoff_matrix_sq[i * n + j])
    }
}
