//! I/O error type for the environment loader (spec §7 "Input errors").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("path error: {0}")]
    Path(String),

    #[error("archive reader error for {archive}: {message}")]
    Reader { archive: String, message: String },

    #[error("malformed class entry in {archive}: {message}")]
    MalformedEntry { archive: String, message: String },

    #[error(transparent)]
    Model(#[from] mm_core::ModelError),
}
