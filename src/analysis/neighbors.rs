use std::borrow::Cow;

use crate::core::chemistry::CutoffGrid;
use crate::core::domain::{AtomicStructure, NeighborList};
use crate::engine::providers::NeighborListProvider;
use crate::error::Result;

/// Two atoms are bonded when closer than `r_cov(a) + r_cov(b) + dx`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CovalentNeighborList;

impl NeighborListProvider for CovalentNeighborList {
    fn neighbor_list(&self, structure: &AtomicStructure, dx: f64) -> Result<NeighborList> {
        build_neighbor_list(structure, dx)
    }
}

/// Builds the covalent neighbour list. Fails with `UnknownElement` if a species
/// has no tabulated radius.
pub fn build_neighbor_list(structure: &AtomicStructure, dx: f64) -> Result<NeighborList> {
    let atoms = &structure.atoms;
    let grid = CutoffGrid::new(&structure.atomic_numbers(), dx)?;
    let mut neighbors = vec![Vec::new(); atoms.len()];

    for i in 0..atoms.len() {
        for j in (i + 1)..atoms.len() {
            let Some(limit_sq) = grid.get_cutoff_sq(atoms[i].number, atoms[j].number) else {
                continue;
            };
            let dist_sq = (atoms[i].position - atoms[j].position).norm_squared();

            if dist_sq < limit_sq {
                neighbors[i].push(j);
                neighbors[j].push(i);
            }
        }
    }

    Ok(NeighborList { neighbors })
}

/// The neighbour list stored on the structure, or a freshly built one when none is attached.
pub fn attached_or_built(structure: &AtomicStructure, dx: f64) -> Result<Cow<'_, NeighborList>> {
    match &structure.info.neighbor_list {
        Some(nl) if nl.len() == structure.len() => Ok(Cow::Borrowed(nl)),
        Some(nl) => {
            log::warn!(
                "Attached neighbour list covers {} atoms but structure has {}; rebuilding",
                nl.len(),
                structure.len()
            );
            build_neighbor_list(structure, dx).map(Cow::Owned)
        }
        None => build_neighbor_list(structure, dx).map(Cow::Owned),
    }
}
