//! Built-in structural analyses backing the generator's collaborators.

pub mod connectivity;
pub mod distribution;
pub mod neighbors;
pub mod rdf;
