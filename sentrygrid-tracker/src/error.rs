#[derive(thiserror::Error, Debug)]
pub enum TrackerError {
    #[error("detection embeddings length ({got}) does not match detections length ({expected})")]
    DetectionEmbeddingLenMismatch { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, TrackerError>;
