//! Model persistence: any serializable object written to `{stem}.json` and read back.
//!
//! `serde_json` is built with `float_roundtrip`, so every `f64` the crate produces
//! (vectors, options, states) reads back bit-identical.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{FingerprintError, Result};

pub const FORMAT_VERSION: u32 = 1;

/// On-disk wrapper around a persisted object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    pub model: T,
}

/// `{stem}.json`, keeping any directory part of `stem`.
pub fn model_path(stem: impl AsRef<Path>) -> PathBuf {
    let mut name = stem.as_ref().as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

pub fn to_bytes<T: Serialize>(model: &T) -> Result<Vec<u8>> {
    let envelope = Envelope {
        format_version: FORMAT_VERSION,
        saved_at: Utc::now(),
        model,
    };
    Ok(serde_json::to_vec_pretty(&envelope)?)
}

pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_slice(bytes)?;
    if envelope.format_version != FORMAT_VERSION {
        log::warn!(
            "Model was written with format version {}, reading as version {}",
            envelope.format_version,
            FORMAT_VERSION
        );
    }
    Ok(envelope.model)
}

/// Writes `model` to `{stem}.json` and returns the path written.
pub fn write<T: Serialize>(stem: impl AsRef<Path>, model: &T) -> Result<PathBuf> {
    let path = model_path(stem);
    let io_err = |source| FingerprintError::Io {
        path: path.clone(),
        source,
    };

    let file = File::create(&path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&to_bytes(model)?).map_err(io_err)?;
    writer.flush().map_err(io_err)?;

    log::debug!("Wrote model to {}", path.display());
    Ok(path)
}

/// Reads the object stored at `{stem}.json`.
pub fn read<T: DeserializeOwned>(stem: impl AsRef<Path>) -> Result<T> {
    let path = model_path(stem);
    let bytes = std::fs::read(&path).map_err(|source| FingerprintError::Io {
        path: path.clone(),
        source,
    })?;
    from_bytes(&bytes)
}
