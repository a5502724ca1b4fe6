use crate::analysis::neighbors;
use crate::core::domain::AtomicStructure;
use crate::engine::providers::ConnectivityProvider;
use crate::error::Result;

/// Counts atoms by coordination number, read from the attached neighbour list.
#[derive(Debug, Clone, Copy)]
pub struct CoordinationCounts {
    /// Margin used when no neighbour list is attached and one has to be built.
    pub dx: f64,
}

impl Default for CoordinationCounts {
    fn default() -> Self {
        Self { dx: 0.2 }
    }
}

impl ConnectivityProvider for CoordinationCounts {
    /// Entry `c` of the result is the number of counted atoms with exactly `c`
    /// bonds; atoms with `max_conn` or more bonds share the last entry.
    fn connectivity_counts(
        &self,
        structure: &AtomicStructure,
        max_conn: usize,
        exclude: &[u8],
    ) -> Result<Vec<f64>> {
        let nl = neighbors::attached_or_built(structure, self.dx)?;
        let mut counts = vec![0.0; max_conn + 1];

        for (i, atom) in structure.atoms.iter().enumerate() {
            if exclude.contains(&atom.number) {
                continue;
            }
            counts[nl.degree(i).min(max_conn)] += 1.0;
        }

        Ok(counts)
    }
}
