use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::rdf;
use crate::core::domain::AtomicStructure;
use crate::core::spatial::DistanceMatrix;
use crate::engine::elements::{layout_for, ElementResolver, ElementSet};
use crate::engine::options::FingerprintOptions;
use crate::engine::providers::Providers;
use crate::error::{FingerprintError, Result};

// --- Constants ---

/// Window of the aggregate RDF used to locate the nearest-neighbour peak.
pub const CUTOFF_RDF_RMAX: f64 = 10.0;
pub const CUTOFF_RDF_NBINS: usize = 200;
/// Added to the RDF peak distance to obtain the bond cutoff.
pub const NN_MARGIN: f64 = 0.2;
/// Pairs at or below this distance are not bonds in the bond-count fingerprint.
pub const MIN_BOND_DISTANCE: f64 = 0.1;
/// Atoms with more bonded neighbours are dropped from the bond-count fingerprint.
pub const MAX_COORDINATION: usize = 12;

/// The five fingerprint strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintKind {
    NearestNeighbour,
    BondCount,
    Distribution,
    Connections,
    Rdf,
}

impl FingerprintKind {
    pub const ALL: [FingerprintKind; 5] = [
        FingerprintKind::NearestNeighbour,
        FingerprintKind::BondCount,
        FingerprintKind::Distribution,
        FingerprintKind::Connections,
        FingerprintKind::Rdf,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FingerprintKind::NearestNeighbour => "nearest_neighbour",
            FingerprintKind::BondCount => "bond_count",
            FingerprintKind::Distribution => "distribution",
            FingerprintKind::Connections => "connections",
            FingerprintKind::Rdf => "rdf",
        }
    }

    /// One label per vector entry, in vector order.
    ///
    /// For [`FingerprintKind::Rdf`] `elements` must be the composition of the
    /// structure itself, since the partial RDF layout ignores the configured set.
    pub fn labels(self, elements: &ElementSet, options: &FingerprintOptions) -> Vec<String> {
        let els: Vec<u8> = elements.iter().collect();
        let mut out = Vec::new();
        match self {
            FingerprintKind::NearestNeighbour => {
                for a in &els {
                    for b in &els {
                        out.push(format!("nn_{}_{}", a, b));
                    }
                }
            }
            FingerprintKind::BondCount => {
                for c in 0..options.max_bonds {
                    for a in &els {
                        for b in &els {
                            out.push(format!("bond_{}_{}_{}", c, a, b));
                        }
                    }
                }
            }
            FingerprintKind::Distribution => {
                for a in &els {
                    for k in 0..options.nbin {
                        out.push(format!("dist_x{}_{}", a, k));
                    }
                }
            }
            FingerprintKind::Connections => {
                for a in &els {
                    for c in 0..=options.max_bonds {
                        out.push(format!("conn_x{}_{}", a, c));
                    }
                }
            }
            FingerprintKind::Rdf => {
                for a in &els {
                    for b in &els {
                        for k in 0..options.nbins {
                            out.push(format!("rdf_{}_{}_{}", a, b, k));
                        }
                    }
                }
            }
        }
        out
    }
}

impl std::fmt::Display for FingerprintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Persistable snapshot of a generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorState {
    pub options: FingerprintOptions,
    /// Inferred element set pinned so far (never set for explicit configurations).
    pub pinned_elements: Option<ElementSet>,
}

/// Turns atomic structures into fingerprint vectors.
///
/// Configured once, then called per structure. `distribution_vec` and
/// `connections_vec` take the structure mutably: they may replace its cell,
/// re-centre its atoms and attach a neighbour list to `info`.
#[derive(Debug)]
pub struct FingerprintGenerator {
    options: FingerprintOptions,
    providers: Providers,
    elements: ElementResolver,
}

impl FingerprintGenerator {
    pub fn new(options: FingerprintOptions) -> Result<Self> {
        Self::with_providers(options, Providers::default())
    }

    pub fn with_providers(options: FingerprintOptions, providers: Providers) -> Result<Self> {
        options.validate()?;
        let explicit = options.atom_types.clone().map(ElementSet::from);
        let elements = ElementResolver::new(explicit, options.inference);
        log::debug!(
            "Fingerprint generator ready (rdf backend: {}, elements: {:?})",
            providers.rdf.name(),
            elements.explicit().map(ElementSet::as_slice)
        );
        Ok(Self {
            options,
            providers,
            elements,
        })
    }

    pub fn from_state(state: GeneratorState) -> Result<Self> {
        let generator = Self::new(state.options)?;
        if let Some(set) = state.pinned_elements {
            generator.elements.pin(set);
        }
        Ok(generator)
    }

    pub fn state(&self) -> GeneratorState {
        GeneratorState {
            options: self.options.clone(),
            pinned_elements: match self.elements.explicit() {
                Some(_) => None,
                None => self.elements.current(),
            },
        }
    }

    pub fn options(&self) -> &FingerprintOptions {
        &self.options
    }

    /// The explicit element set, or the inferred one once pinned.
    pub fn resolved_elements(&self) -> Option<ElementSet> {
        self.elements.current()
    }

    /// Drops a pinned inferred element set.
    pub fn reset_elements(&self) {
        self.elements.reset();
    }

    /// Bond cutoff: distance of the aggregate RDF maximum over 0–10 Å (200 bins) plus 0.2 Å.
    ///
    /// Only the peak position is used, so structures without a cell are accepted.
    pub fn nearest_neighbour_cutoff(&self, dm: &DistanceMatrix) -> f64 {
        let curve = rdf::pair_profile(dm, CUTOFF_RDF_RMAX, CUTOFF_RDF_NBINS);
        let peak = curve.first_peak().unwrap_or(0.0);
        log::debug!("RDF peak at {:.3} Å, bond cutoff {:.3} Å", peak, peak + NN_MARGIN);
        peak + NN_MARGIN
    }

    fn distances(&self, structure: &AtomicStructure) -> Result<DistanceMatrix> {
        let dm = self.providers.distances.distance_matrix(structure)?;
        if dm.n() != structure.len() {
            return Err(FingerprintError::ShapeMismatch {
                provider: "distance matrix",
                expected: structure.len(),
                actual: dm.n(),
            });
        }
        Ok(dm)
    }

    /// Layout index of every atom; `None` for types outside the element set.
    fn type_indices(elements: &ElementSet, structure: &AtomicStructure) -> Vec<Option<usize>> {
        let types: Vec<Option<usize>> = structure
            .atoms
            .iter()
            .map(|a| elements.index_of(a.number))
            .collect();
        let missing = types.iter().filter(|t| t.is_none()).count();
        if missing > 0 {
            log::warn!(
                "{} atom(s) have types outside the element set {:?} and are ignored",
                missing,
                elements.as_slice()
            );
        }
        types
    }

    /// Nearest neighbour average, flattened row-major (E×E).
    ///
    /// Entry `(i, j)` is the mean number of type-`j` atoms within the bond cutoff
    /// of a type-`i` atom. Every atom counts itself (distance 0).
    pub fn nearest_neighbour_vec(&self, structure: &AtomicStructure) -> Result<Vec<f64>> {
        let elements = layout_for(self.elements.explicit(), structure);
        let e = elements.len();
        let dm = self.distances(structure)?;
        let cutoff = self.nearest_neighbour_cutoff(&dm);
        let types = Self::type_indices(&elements, structure);

        let mut nnmat = vec![0.0; e * e];
        for (i, row) in types.iter().enumerate() {
            let Some(row) = *row else { continue };
            for (j, d) in dm.row(i).enumerate() {
                if d < cutoff {
                    if let Some(column) = types[j] {
                        nnmat[row * e + column] += 1.0;
                    }
                }
            }
        }

        for (row, number) in elements.iter().enumerate() {
            let count = structure.count_of(number);
            // A type with no atoms keeps a zero row.
            if count > 0 {
                for v in &mut nnmat[row * e..(row + 1) * e] {
                    *v /= count as f64;
                }
            }
        }

        Ok(nnmat)
    }

    /// Bond counting resolved by coordination: `T[ln][type_i][type_j]`, flattened.
    ///
    /// `ln` is the number of neighbours of atom `i` in `(0.1, cutoff)`. Atoms with
    /// more than 12 such neighbours (or `ln >= max_bonds`) are skipped.
    pub fn bond_count_vec(&self, structure: &AtomicStructure) -> Result<Vec<f64>> {
        let elements = layout_for(self.elements.explicit(), structure);
        let e = elements.len();
        let max_bonds = self.options.max_bonds;
        let dm = self.distances(structure)?;
        let cutoff = self.nearest_neighbour_cutoff(&dm);
        let types = Self::type_indices(&elements, structure);

        let mut tensor = vec![0.0; max_bonds * e * e];
        for (i, row) in types.iter().enumerate() {
            let Some(row) = *row else { continue };
            let neighbors: Vec<usize> = dm
                .row(i)
                .enumerate()
                .filter(|&(_, d)| MIN_BOND_DISTANCE < d && d < cutoff)
                .map(|(j, _)| j)
                .collect();

            let ln = neighbors.len();
            if ln > MAX_COORDINATION || ln >= max_bonds {
                continue;
            }
            for j in neighbors {
                if let Some(column) = types[j] {
                    tensor[(ln * e + row) * e + column] += 1.0;
                }
            }
        }

        Ok(tensor)
    }

    /// Attaches a freshly built neighbour list when `get_nl` is set.
    fn attach_neighbor_list(&self, structure: &mut AtomicStructure) -> Result<()> {
        if self.options.get_nl {
            let nl = self
                .providers
                .neighbors
                .neighbor_list(structure, self.options.dx)?;
            structure.info.neighbor_list = Some(nl);
        }
        Ok(())
    }

    /// Per-element spatial distribution, `nbin` values per element.
    ///
    /// Forces a cubic cell of `cell_size`, centres the atoms, then for each element
    /// `i` histograms every atom that is not of type `i`.
    pub fn distribution_vec(&self, structure: &mut AtomicStructure) -> Result<Vec<f64>> {
        structure.set_cubic_cell(self.options.cell_size);
        structure.center();
        self.attach_neighbor_list(structure)?;

        let elements = self.elements.resolve(structure);
        let nbin = self.options.nbin;
        let mut fp = Vec::with_capacity(elements.len() * nbin);

        for number in elements.iter() {
            let hist = self
                .providers
                .distribution
                .distribution(structure, nbin, &[number])?;
            if hist.len() != nbin {
                return Err(FingerprintError::ShapeMismatch {
                    provider: "distribution",
                    expected: nbin,
                    actual: hist.len(),
                });
            }
            fp.extend(hist);
        }

        Ok(fp)
    }

    /// Per-element coordination counts, `max_bonds + 1` values per element.
    ///
    /// Without `get_nl` the attached neighbour list is used. If there is none, or it
    /// does not cover every atom, one is built with `dx` for this call only and the
    /// previous value is put back afterwards.
    pub fn connections_vec(&self, structure: &mut AtomicStructure) -> Result<Vec<f64>> {
        self.attach_neighbor_list(structure)?;
        let elements = self.elements.resolve(structure);

        let usable = matches!(
            &structure.info.neighbor_list,
            Some(nl) if nl.len() == structure.len()
        );
        let previous = if usable {
            None
        } else {
            if let Some(stale) = &structure.info.neighbor_list {
                log::warn!(
                    "Attached neighbour list covers {} atoms but structure has {}; rebuilding",
                    stale.len(),
                    structure.len()
                );
            }
            let nl = self
                .providers
                .neighbors
                .neighbor_list(structure, self.options.dx)?;
            Some(structure.info.neighbor_list.replace(nl))
        };

        let result = self.collect_connections(structure, &elements);

        if let Some(previous) = previous {
            structure.info.neighbor_list = previous;
        }
        result
    }

    fn collect_connections(
        &self,
        structure: &AtomicStructure,
        elements: &ElementSet,
    ) -> Result<Vec<f64>> {
        let max_bonds = self.options.max_bonds;
        let mut fp = Vec::with_capacity(elements.len() * (max_bonds + 1));

        for number in elements.iter() {
            let conn = self
                .providers
                .connectivity
                .connectivity_counts(structure, max_bonds, &[number])?;
            if conn.len() != max_bonds + 1 {
                return Err(FingerprintError::ShapeMismatch {
                    provider: "connectivity",
                    expected: max_bonds + 1,
                    actual: conn.len(),
                });
            }
            fp.extend(conn);
        }

        Ok(fp)
    }

    /// Concatenated partial RDFs over every ordered pair of the species present in
    /// `structure` (ascending, same-species pairs included), `nbins` values each.
    pub fn rdf_vec(&self, structure: &AtomicStructure) -> Result<Vec<f64>> {
        let present = structure.unique_numbers();
        let pairs: Vec<(u8, u8)> = present
            .iter()
            .flat_map(|&a| present.iter().map(move |&b| (a, b)))
            .collect();

        let nbins = self.options.nbins;
        let curves = self
            .providers
            .rdf
            .partial_rdfs(structure, self.options.rmax, nbins, &pairs)?;
        if curves.len() != pairs.len() {
            return Err(FingerprintError::ShapeMismatch {
                provider: "partial rdf",
                expected: pairs.len(),
                actual: curves.len(),
            });
        }

        let mut fp = Vec::with_capacity(pairs.len() * nbins);
        for curve in curves {
            if curve.len() != nbins {
                return Err(FingerprintError::ShapeMismatch {
                    provider: "partial rdf",
                    expected: nbins,
                    actual: curve.len(),
                });
            }
            fp.extend(curve);
        }

        Ok(fp)
    }

    pub fn generate(&self, kind: FingerprintKind, structure: &mut AtomicStructure) -> Result<Vec<f64>> {
        match kind {
            FingerprintKind::NearestNeighbour => self.nearest_neighbour_vec(structure),
            FingerprintKind::BondCount => self.bond_count_vec(structure),
            FingerprintKind::Distribution => self.distribution_vec(structure),
            FingerprintKind::Connections => self.connections_vec(structure),
            FingerprintKind::Rdf => self.rdf_vec(structure),
        }
    }

    /// Fingerprints every structure in parallel; results keep input order.
    ///
    /// An inferred, pinned element set is resolved from the first structure
    /// before the parallel section, so the pinned layout does not depend on
    /// scheduling.
    pub fn generate_batch(
        &self,
        kind: FingerprintKind,
        structures: &mut [AtomicStructure],
    ) -> Result<Vec<Vec<f64>>> {
        if let (Some(first), FingerprintKind::Distribution | FingerprintKind::Connections) =
            (structures.first(), kind)
        {
            self.elements.resolve(first);
        }

        structures
            .par_iter_mut()
            .map(|structure| self.generate(kind, structure))
            .collect()
    }
}
