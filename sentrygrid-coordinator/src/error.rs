#[derive(thiserror::Error, Debug)]
pub enum CoordinatorError {
    #[error("embedding dimension mismatch: global track centroid is {expected}, update carried {got}")]
    DimMismatch { expected: usize, got: usize },
    #[error("update embedding must be valid to seed or bind a global track")]
    InvalidEmbedding,
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;
