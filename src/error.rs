//! Crate-level error taxonomy (spec.md §7).
//!
//! Each module defines its own narrow error enum; [`CoreError`] is the
//! composition point at the [`crate::service`] boundary, the same shape
//! as the teacher's `contracts::persistence::PersistenceError` — a plain
//! enum with a hand-written [`std::fmt::Display`] impl rather than a
//! `thiserror` derive.

use crate::generation::GenerationError;
use crate::lifecycle::LifecycleError;
use crate::pipeline::PipelineError;
use crate::store::RepositoryError;

/// Top-level error returned by [`crate::service::GameService`] methods.
///
/// Maps onto spec.md §7's HTTP status buckets: `Validation`/`Authorization`
/// become 4xx, `Repository` becomes 500, the others carry their own
/// module-specific detail for the caller to classify.
#[derive(Debug)]
pub enum CoreError {
    /// Caller-facing input/state validation failure (4xx).
    Validation(String),
    /// Not a participant / not the owner / not the recipient (403).
    Authorization(String),
    /// Resource does not exist (404).
    NotFound(String),
    /// Turn-pipeline failure that is not a recoverable script error.
    Pipeline(PipelineError),
    /// Battle-lifecycle constraint violation.
    Lifecycle(LifecycleError),
    /// Attack-generation failure (LLM, validation, credits).
    Generation(GenerationError),
    /// Persistence-layer failure; the prior committed state is unchanged.
    Repository(RepositoryError),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
            Self::Authorization(msg) => write!(f, "authorization error: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Pipeline(e) => write!(f, "pipeline error: {e}"),
            Self::Lifecycle(e) => write!(f, "lifecycle error: {e}"),
            Self::Generation(e) => write!(f, "generation error: {e}"),
            Self::Repository(e) => write!(f, "repository error: {e}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<PipelineError> for CoreError {
    fn from(e: PipelineError) -> Self {
        Self::Pipeline(e)
    }
}

impl From<LifecycleError> for CoreError {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

impl From<GenerationError> for CoreError {
    fn from(e: GenerationError) -> Self {
        Self::Generation(e)
    }
}

impl From<RepositoryError> for CoreError {
    fn from(e: RepositoryError) -> Self {
        Self::Repository(e)
    }
}
