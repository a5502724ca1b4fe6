use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::domain::AtomicStructure;

/// Distinct atomic numbers laying out a fingerprint, always ascending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<u8>", into = "Vec<u8>")]
pub struct ElementSet(Vec<u8>);

impl ElementSet {
    pub fn new(numbers: impl IntoIterator<Item = u8>) -> Self {
        let mut v: Vec<u8> = numbers.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        Self(v)
    }

    pub fn from_structure(structure: &AtomicStructure) -> Self {
        Self(structure.unique_numbers())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position of `number` in the layout.
    #[inline]
    pub fn index_of(&self, number: u8) -> Option<usize> {
        self.0.binary_search(&number).ok()
    }

    pub fn contains(&self, number: u8) -> bool {
        self.index_of(number).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for ElementSet {
    fn from(v: Vec<u8>) -> Self {
        Self::new(v)
    }
}

impl From<ElementSet> for Vec<u8> {
    fn from(set: ElementSet) -> Self {
        set.0
    }
}

/// Behaviour of an inferred element set once it has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferencePolicy {
    /// The first structure fixes the set for every later call.
    #[default]
    PinFirst,
    /// Each structure contributes its own composition; nothing is cached.
    PerStructure,
}

/// Resolves the element set for distribution and connectivity fingerprints.
///
/// One-time initialization is double-checked under an `RwLock`, so concurrent
/// first calls agree on a single pinned set.
#[derive(Debug)]
pub struct ElementResolver {
    explicit: Option<ElementSet>,
    policy: InferencePolicy,
    pinned: RwLock<Option<ElementSet>>,
}

impl ElementResolver {
    pub fn new(explicit: Option<ElementSet>, policy: InferencePolicy) -> Self {
        Self {
            explicit,
            policy,
            pinned: RwLock::new(None),
        }
    }

    pub fn explicit(&self) -> Option<&ElementSet> {
        self.explicit.as_ref()
    }

    /// The explicit set, or the set pinned by an earlier call.
    pub fn current(&self) -> Option<ElementSet> {
        self.explicit.clone().or_else(|| self.pinned.read().clone())
    }

    pub fn resolve(&self, structure: &AtomicStructure) -> ElementSet {
        if let Some(set) = &self.explicit {
            return set.clone();
        }
        if self.policy == InferencePolicy::PerStructure {
            return ElementSet::from_structure(structure);
        }

        if let Some(set) = self.pinned.read().as_ref() {
            return set.clone();
        }
        let mut slot = self.pinned.write();
        slot.get_or_insert_with(|| {
            let set = ElementSet::from_structure(structure);
            log::debug!("Pinned inferred element set {:?}", set.as_slice());
            set
        })
        .clone()
    }

    /// Seeds the pinned set, e.g. from persisted state. Ignored when the set is explicit.
    pub fn pin(&self, set: ElementSet) {
        if self.explicit.is_none() {
            *self.pinned.write() = Some(set);
        }
    }

    /// Forgets a pinned set so the next structure re-infers it.
    pub fn reset(&self) {
        *self.pinned.write() = None;
    }
}

/// Layout for the nearest-neighbour and bond-count fingerprints: the explicit
/// set, or the structure's own composition.
pub(crate) fn layout_for(explicit: Option<&ElementSet>, structure: &AtomicStructure) -> ElementSet {
    explicit
        .cloned()
        .unwrap_or_else(|| ElementSet::from_structure(structure))
}
