//! Pipeline error types

use gallerystore::StoreError;
use thiserror::Error;

use super::Stage;
use crate::generation::GenerationError;

/// Errors returned by controller operations
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Nothing to do: the input is empty")]
    EmptyQuery,

    #[error("Another operation is still running")]
    Busy,

    #[error("Cannot {op} while in the {stage} view")]
    Unavailable { op: &'static str, stage: Stage },

    #[error("No fact numbered {0}")]
    UnknownFact(usize),

    #[error("No gallery item with id {0}")]
    UnknownItem(String),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Gallery write failed: {0}")]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Caller errors: the operation was never attempted
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PipelineError::EmptyQuery
                | PipelineError::Busy
                | PipelineError::Unavailable { .. }
                | PipelineError::UnknownFact(_)
                | PipelineError::UnknownItem(_)
        )
    }
}
