#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid camera id {0:?}: must be 1-64 chars of [A-Za-z0-9_-]")]
    InvalidCameraId(String),
    #[error("bounding box out of frame bounds")]
    BBoxOutOfBounds,
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    EmbeddingDimMismatch { expected: usize, got: usize },
    #[error("invalid polygon: {0:?}")]
    InvalidPolygon(PolygonError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Mirrors the typed codes the config-store adapter must return on ROI
/// validation. Kept here (not in `sentrygrid-rules`) so both the rule
/// engine and whatever sits in front of it agree on the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PolygonError {
    InsufficientPoints,
    CoordinateOutOfRange,
    AreaTooSmall,
    SelfIntersection,
}
