//! A JSON-backed `ArchiveReader` (spec §6 "Input — Environment" names the
//! bytecode reader an external collaborator, specified only through the
//! `ArchiveReader` trait; a real JVM-class-format parser is out of scope per
//! spec §1). This reader lets `mm_cli` exercise the engine against a
//! pre-parsed symbol dump — a JSON array of `RawClass` — instead of raw
//! `.class`/`.jar` bytes.

use std::fs;
use std::path::Path;

use crate::environment::{ArchiveReader, RawClass};
use crate::errors::IoError;

/// Reads `path` as a JSON array of `RawClass`.
pub struct JsonArchiveReader;

impl ArchiveReader for JsonArchiveReader {
    fn read(&self, path: &Path) -> Result<Vec<RawClass>, IoError> {
        let bytes = fs::read(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
        serde_json::from_slice(&bytes).map_err(|e| IoError::MalformedEntry {
            archive: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
