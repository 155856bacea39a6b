//! mm_io — the boundary between the matching core and the archive reader.
//!
//! The bytecode reader itself (parsing a JAR's class entries into the symbol
//! model) is an external collaborator per the engine's scope: this crate
//! specifies only the `ArchiveReader` interface the core consumes and the
//! assembly of raw parsed data into an immutable `mm_core::Environment`.
//! No file or network I/O happens during matching — this is strictly a
//! pre-step (see `mm_pipeline` for the matching core itself).

pub mod environment;
pub mod errors;
pub mod fixtures;
#[cfg(feature = "serde")]
pub mod json_reader;

pub use environment::{load_environment, ArchiveReader, RawClass, RawField, RawMethod};
pub use errors::IoError;
#[cfg(feature = "serde")]
pub use json_reader::JsonArchiveReader;
