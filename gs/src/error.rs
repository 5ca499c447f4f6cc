//! Gallery store error types

use thiserror::Error;

/// Errors that can occur while reading or writing the gallery
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// Check if retrying the same write could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Io(_) => true,
            StoreError::Unavailable(_) => true,
            StoreError::Task(_) => true,
            StoreError::Json(_) => false,
            StoreError::NotFound(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        assert!(StoreError::Unavailable("offline".to_string()).is_transient());
        assert!(StoreError::Io(std::io::Error::other("disk")).is_transient());
        assert!(!StoreError::NotFound("abc".to_string()).is_transient());
    }

    #[test]
    fn test_display() {
        let err = StoreError::NotFound("0193-abc".to_string());
        assert_eq!(err.to_string(), "Record not found: 0193-abc");
    }
}
