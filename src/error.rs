use thiserror::Error;

/// Rule tree error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Unknown value '{value}' for dimension '{dimension}'")]
    UnknownValue { dimension: String, value: String },

    #[error("Dimension '{dimension}' mixes set and scalar constraints")]
    ConstraintKindMismatch { dimension: String },

    #[error("Expected {expected} dimensions, got {actual}")]
    DimensionCountMismatch { expected: usize, actual: usize },

    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),
}

pub type Result<T> = std::result::Result<T, TreeError>;
