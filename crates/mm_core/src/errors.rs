//! Error types shared by the symbol model and match tables.

use thiserror::Error;

/// Errors raised while constructing or parsing symbol-model values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("malformed class key: {0}")]
    MalformedClassKey(String),
    #[error("malformed method key: {0}")]
    MalformedMethodKey(String),
    #[error("malformed field key: {0}")]
    MalformedFieldKey(String),
    #[error("malformed descriptor: {0}")]
    MalformedDescriptor(String),
}
