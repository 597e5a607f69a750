use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectionConfig {
    pub confidence_threshold: f32,
    pub nms_threshold: f32,
    pub backend: String,
    pub model_path: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            nms_threshold: 0.5,
            backend: "cpu".to_string(),
            model_path: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    pub fps: f32,
    pub quality: u8,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { fps: 15.0, quality: 80, max_width: 1280, max_height: 720 }
    }
}

/// On-disk persisted record for one camera. Workspace-internal, so unlike
/// the wire alarm types, unknown fields are a hard error rather than
/// silently dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraConfigRecord {
    pub camera_id: String,
    pub name: String,
    pub rtsp_url: String,
    pub protocol: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub width: u32,
    pub height: u32,
    pub fps: f32,
    pub enabled: bool,
    pub detection_enabled: bool,
    pub recording_enabled: bool,
    #[serde(default)]
    pub detection_config: DetectionConfig,
    #[serde(default)]
    pub stream_config: StreamConfig,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl CameraConfigRecord {
    pub fn new(camera_id: impl Into<String>, rtsp_url: impl Into<String>) -> Self {
        Self {
            camera_id: camera_id.into(),
            name: String::new(),
            rtsp_url: rtsp_url.into(),
            protocol: "rtsp".to_string(),
            username: None,
            password: None,
            width: 1280,
            height: 720,
            fps: 15.0,
            enabled: true,
            detection_enabled: true,
            recording_enabled: false,
            detection_config: DetectionConfig::default(),
            stream_config: StreamConfig::default(),
            updated_at: chrono::Utc::now(),
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
