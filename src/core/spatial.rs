use nalgebra::{DMatrix, Point3};
use serde::{Deserialize, Serialize};

use crate::core::domain::AtomicStructure;

/// Symmetric N×N matrix of interatomic distances with a zero diagonal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    inner: DMatrix<f64>,
}

impl DistanceMatrix {
    /// Number of atoms covered.
    pub fn n(&self) -> usize {
        self.inner.nrows()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.inner[(i, j)]
    }

    /// Distances from atom `i` to every atom, in atom order.
    pub fn row(&self, i: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.n()).map(move |j| self.inner[(i, j)])
    }

    /// True when the matrix is symmetric within `tol` and its diagonal is exactly zero.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        let n = self.n();
        (0..n).all(|i| {
            self.inner[(i, i)] == 0.0
                && ((i + 1)..n).all(|j| (self.inner[(i, j)] - self.inner[(j, i)]).abs() <= tol)
        })
    }
}

#[inline]
pub fn distance(p1: &Point3<f64>, p2: &Point3<f64>) -> f64 {
    nalgebra::distance(p1, p2)
}

/// Full Euclidean distance matrix of a structure. Clusters are treated as
/// non-periodic, so no minimum-image convention is applied.
pub fn distance_matrix(structure: &AtomicStructure) -> DistanceMatrix {
    let atoms = &structure.atoms;
    let n = atoms.len();
    let mut inner = DMatrix::<f64>::zeros(n, n);

    for i in 0..n {
        for j in (i + 1)..n {
            let d = distance(&atoms[i].position, &atoms[j].position);
            inner[(i, j)] = d;
            inner[(j, i)] = d;
        }
    }

    DistanceMatrix { inner }
}
