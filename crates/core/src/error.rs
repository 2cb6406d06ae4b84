//! Error types for the core domain

use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Invalid entity reference: {0:?}")]
    InvalidEntityRef(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
