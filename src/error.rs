use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by fingerprint generation and its collaborators.
#[derive(Error, Debug)]
pub enum FingerprintError {
    /// The generator was configured with values it cannot bin with.
    #[error("Invalid fingerprint options: {0}")]
    InvalidOptions(String),

    /// No covalent radius is tabulated for this atomic number, so no neighbour
    /// list can be built for it.
    #[error("No covalent radius tabulated for atomic number {0}")]
    UnknownElement(u8),

    /// RDF normalization needs the cell volume. Clusters built without a cell
    /// have volume zero.
    #[error("Cell volume is {volume:.3e}; set a cell before computing an RDF")]
    DegenerateCell { volume: f64 },

    /// A collaborator returned a vector whose length does not match the layout
    /// the generator expects.
    #[error("{provider} returned {actual} values, expected {expected}")]
    ShapeMismatch {
        provider: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to parse XYZ from '{source_name}': {details}")]
    Xyz { source_name: String, details: String },

    #[error("I/O error at path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure raised by an injected collaborator, passed through untouched.
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FingerprintError>;
