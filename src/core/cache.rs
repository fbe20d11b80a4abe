// src/core/cache.rs

//! # Binary Cache Codec
//!
//! Every persisted record (option state, project and solution generation records) goes
//! through the same pipeline: `bincode` encoding, `lz4` compression with a size header,
//! then an atomic replace through a temporary file in the target directory.

use log::trace;
use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to read cache file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to replace file '{path}': {source}")]
    Persist {
        path: String,
        #[source]
        source: tempfile::PersistError,
    },
    #[error("Cache file '{0}' is empty.")]
    Empty(String),
    #[error("Failed to decompress cache file '{path}': {source}. It might be corrupt.")]
    Decompress {
        path: String,
        #[source]
        source: lz4_flex::block::DecompressError,
    },
    /// The record was written by an incompatible version or is corrupt.
    #[error("Failed to decode from binary format: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("Failed to encode to binary format: {0}")]
    Encode(#[from] bincode::error::EncodeError),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Reads and decodes a compressed binary record.
pub fn read_cache<T: DeserializeOwned>(path: &Path) -> CacheResult<T> {
    let compressed_bytes = fs::read(path).map_err(|e| CacheError::Read {
        path: path.display().to_string(),
        source: e,
    })?;

    if compressed_bytes.is_empty() {
        return Err(CacheError::Empty(path.display().to_string()));
    }

    let bytes = lz4_flex::decompress_size_prepended(&compressed_bytes).map_err(|e| {
        CacheError::Decompress {
            path: path.display().to_string(),
            source: e,
        }
    })?;
    trace!(
        "Decompressed '{}' from {} to {} bytes.",
        path.display(),
        compressed_bytes.len(),
        bytes.len()
    );

    let (value, _): (T, usize) =
        bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
    Ok(value)
}

/// Encodes, compresses and atomically writes a binary record.
pub fn write_cache<T: Serialize>(path: &Path, value: &T) -> CacheResult<()> {
    let bytes = bincode::serde::encode_to_vec(value, bincode::config::standard())?;
    let compressed_bytes = lz4_flex::compress_prepend_size(&bytes);
    trace!(
        "Compressed record for '{}' from {} to {} bytes.",
        path.display(),
        bytes.len(),
        compressed_bytes.len()
    );
    write_file_atomic(path, &compressed_bytes)
}

/// Writes `contents` to `path` through a temporary sibling file, creating parent
/// directories as needed. Readers never observe a half written file.
pub fn write_file_atomic(path: &Path, contents: &[u8]) -> CacheResult<()> {
    let write_error = |e: io::Error| CacheError::Write {
        path: path.display().to_string(),
        source: e,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(write_error)?;

    let mut temp_file = NamedTempFile::new_in(parent).map_err(write_error)?;
    temp_file.write_all(contents).map_err(write_error)?;
    temp_file.flush().map_err(write_error)?;
    temp_file.persist(path).map_err(|e| CacheError::Persist {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

/// Last-modified time of a file, or `None` if it cannot be read.
pub fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
