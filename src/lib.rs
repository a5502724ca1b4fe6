//! Fixed-length structural fingerprints for atomic clusters and nanoparticles.
//!
//! The entry point is [`engine::generator::FingerprintGenerator`], configured once with
//! [`engine::options::FingerprintOptions`] and invoked per [`core::domain::AtomicStructure`].

pub mod analysis;
pub mod core;
pub mod engine;
pub mod error;
pub mod io;

pub use crate::core::domain::{Atom, AtomicStructure, Cell};
pub use crate::engine::elements::{ElementSet, InferencePolicy};
pub use crate::engine::generator::{FingerprintGenerator, FingerprintKind};
pub use crate::engine::options::FingerprintOptions;
pub use crate::error::{FingerprintError, Result};
