#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io { path: std::path::PathBuf, #[source] source: std::io::Error },
    #[error("malformed camera config record: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("path expansion failed: {0}")]
    ShellExpand(#[from] shellexpand::LookupError<std::env::VarError>),
    #[error("unknown camera id: {0}")]
    NotFound(sentrygrid_types::CameraId),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
