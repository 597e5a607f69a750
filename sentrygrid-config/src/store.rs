use crate::camera_record::CameraConfigRecord;
use crate::error::Result;
use sentrygrid_types::CameraId;

/// Generic namespaced key/value persistence, plus typed helpers for the
/// one record shape the core actually needs: camera configuration.
/// Implementations decide their own storage medium; `sentrygrid-config`
/// ships one backed by a JSON document per key on disk.
pub trait ConfigStore: Send + Sync {
    fn get(&self, namespace: &str, key: &str, default: &str) -> String;
    fn put(&self, namespace: &str, key: &str, value: &str) -> bool;
    fn list(&self, namespace: &str) -> Vec<(String, String)>;
    fn delete(&self, namespace: &str, key: &str) -> bool;

    fn get_camera_config(&self, camera_id: &CameraId) -> Option<CameraConfigRecord>;
    fn save_camera_config(&self, camera_id: &CameraId, record: CameraConfigRecord) -> Result<()>;
    /// Ids with a persisted, non-soft-deleted record. Order is
    /// unspecified.
    fn list_camera_ids(&self) -> Vec<CameraId>;
    /// Soft-delete: flips `enabled` off and stamps `deleted_at`, rather
    /// than removing the file. A subsequent `save_camera_config` for the
    /// same id clears `deleted_at` again.
    fn delete_camera_config(&self, camera_id: &CameraId) -> Result<bool>;
}
