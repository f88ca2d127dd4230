//! # Engine Error Types
//!
//! The error surface callers match on: either a business rule said no
//! (`Core`) or the storage layer failed (`Db`).

use thiserror::Error;

use atrium_core::{CoreError, ValidationError};
use atrium_db::DbError;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A business rule or lifecycle rule rejected the operation. Pre-commit
    /// by construction: nothing was mutated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database operation failed.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
