#[derive(thiserror::Error, Debug)]
pub enum FrameSourceError {
    #[error("no frame yet")]
    NoFrameYet,
    #[error("connection lost")]
    ConnectionLost,
    #[error("unsupported operation")]
    Unsupported,
}

impl FrameSourceError {
    /// `NoFrameYet` is the only non-terminal variant; everything else
    /// means the caller should treat the source as dead and let the
    /// owning pipeline's reconnect logic take over.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FrameSourceError::NoFrameYet)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DetectorError {
    #[error("model unavailable")]
    ModelUnavailable,
    #[error("input too large")]
    InputTooLarge,
    #[error("transient backend error: {0}")]
    TransientBackendError(String),
}

#[derive(thiserror::Error, Debug)]
pub enum EmbedderError {
    #[error("model unavailable")]
    ModelUnavailable,
    #[error("transient backend error: {0}")]
    TransientBackendError(String),
}
