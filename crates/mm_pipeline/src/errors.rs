//! Engine-level errors (spec §7). Precondition violations — confirming an
//! entry with no target, or whose target is already claimed — are
//! programmer errors and abort the run via `Err`. Convergence failure is
//! not an error: it is recorded as a warning on the `RunSummary` and the
//! (partial) Result Bundle is still returned.

use thiserror::Error;

use mm_core::TablesError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("class {0}: {1}")]
    Class(String, #[source] TablesError),
    #[error("method {0}: {1}")]
    Method(String, #[source] TablesError),
    #[error("field {0}: {1}")]
    Field(String, #[source] TablesError),
    #[error("iteration cap ({0}) reached with changes still occurring")]
    ConvergenceWarning(u32),
}
