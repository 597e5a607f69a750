#[derive(thiserror::Error, Debug)]
pub enum ReidError {
    #[error(transparent)]
    Backend(#[from] sentrygrid_adapters::EmbedderError),
    #[error("embedder returned dimension {got}, engine configured for {expected}")]
    DimMismatch { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, ReidError>;
