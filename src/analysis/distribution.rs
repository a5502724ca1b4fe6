use crate::core::domain::AtomicStructure;
use crate::core::spatial;
use crate::engine::providers::DistributionProvider;
use crate::error::{FingerprintError, Result};

/// Radial shell histogram around the cell centre.
///
/// The first `nbin - 1` bins split `(0, max_distance)` into equal open shells; the
/// last bin collects atoms beyond `max_distance`. Atoms exactly on a shell
/// boundary fall in no bin.
#[derive(Debug, Clone, Copy)]
pub struct ShellDistribution {
    pub max_distance: f64,
}

impl Default for ShellDistribution {
    fn default() -> Self {
        Self { max_distance: 8.0 }
    }
}

impl DistributionProvider for ShellDistribution {
    fn distribution(
        &self,
        structure: &AtomicStructure,
        nbin: usize,
        exclude: &[u8],
    ) -> Result<Vec<f64>> {
        if nbin < 2 {
            return Err(FingerprintError::InvalidOptions(format!(
                "distribution needs at least 2 bins, got {}",
                nbin
            )));
        }

        let center = structure.cell.center();
        let width = self.max_distance / (nbin - 1) as f64;
        let mut bins = vec![0.0; nbin];

        for atom in structure.atoms.iter().filter(|a| !exclude.contains(&a.number)) {
            let d = spatial::distance(&atom.position, &center);
            for (k, bin) in bins.iter_mut().take(nbin - 1).enumerate() {
                let lower = k as f64 * width;
                let upper = (k + 1) as f64 * width;
                if lower < d && d < upper {
                    *bin += 1.0;
                }
            }
            if d > self.max_distance {
                bins[nbin - 1] += 1.0;
            }
        }

        Ok(bins)
    }
}
