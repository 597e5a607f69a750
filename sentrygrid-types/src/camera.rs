use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Opaque, globally unique camera identifier.
///
/// Immutable for the camera's lifetime; validated once at construction so
/// every other component can treat it as already-correct.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CameraId(String);

impl CameraId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty()
            || raw.len() > 64
            || !raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(Error::InvalidCameraId(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CameraId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CameraId {
    type Error = Error;
    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CameraId> for String {
    fn from(value: CameraId) -> Self {
        value.0
    }
}

/// Status surfaced by listing APIs: always reflects current state with
/// per-item detail, including the transient error that took a camera
/// offline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CameraStatus {
    Online,
    Offline,
    Error(String),
}
