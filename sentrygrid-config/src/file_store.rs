use crate::camera_record::CameraConfigRecord;
use crate::error::{ConfigError, Result};
use crate::store::ConfigStore;
use sentrygrid_types::CameraId;
use std::fs;
use std::path::{Path, PathBuf};

const CAMERA_NAMESPACE: &str = "cameras";

/// `ConfigStore` backed by one JSON document per key, under
/// `base_dir/<namespace>/<key>.json`. `base_dir` may contain shell
/// variables and `~`; it is expanded once at construction.
pub struct FileConfigStore {
    base_dir: PathBuf,
}

impl FileConfigStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let raw = base_dir.as_ref().to_string_lossy().into_owned();
        let expanded = shellexpand::full(&raw)?;
        let base_dir = PathBuf::from(expanded.into_owned());
        fs::create_dir_all(&base_dir).map_err(|source| ConfigError::Io { path: base_dir.clone(), source })?;
        Ok(Self { base_dir })
    }

    fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.base_dir.join(namespace)
    }

    fn entry_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.namespace_dir(namespace).join(format!("{key}.json"))
    }

    fn read_raw(&self, namespace: &str, key: &str) -> Option<String> {
        fs::read_to_string(self.entry_path(namespace, key)).ok()
    }

    fn write_raw(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        let dir = self.namespace_dir(namespace);
        fs::create_dir_all(&dir).map_err(|source| ConfigError::Io { path: dir.clone(), source })?;
        let path = self.entry_path(namespace, key);
        fs::write(&path, value).map_err(|source| ConfigError::Io { path, source })
    }
}

impl ConfigStore for FileConfigStore {
    fn get(&self, namespace: &str, key: &str, default: &str) -> String {
        self.read_raw(namespace, key).unwrap_or_else(|| default.to_string())
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> bool {
        self.write_raw(namespace, key, value).is_ok()
    }

    fn list(&self, namespace: &str) -> Vec<(String, String)> {
        let dir = self.namespace_dir(namespace);
        let Ok(entries) = fs::read_dir(&dir) else { return Vec::new() };
        let mut out = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            if let Ok(value) = fs::read_to_string(&path) {
                out.push((key.to_string(), value));
            }
        }
        out
    }

    fn delete(&self, namespace: &str, key: &str) -> bool {
        fs::remove_file(self.entry_path(namespace, key)).is_ok()
    }

    fn get_camera_config(&self, camera_id: &CameraId) -> Option<CameraConfigRecord> {
        let raw = self.read_raw(CAMERA_NAMESPACE, camera_id.as_str())?;
        serde_json::from_str(&raw).ok()
    }

    fn save_camera_config(&self, camera_id: &CameraId, record: CameraConfigRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(&record)?;
        self.write_raw(CAMERA_NAMESPACE, camera_id.as_str(), &json)
    }

    fn list_camera_ids(&self) -> Vec<CameraId> {
        self.list(CAMERA_NAMESPACE)
            .into_iter()
            .filter_map(|(key, raw)| {
                let record: CameraConfigRecord = serde_json::from_str(&raw).ok()?;
                if record.is_deleted() {
                    return None;
                }
                CameraId::new(key).ok()
            })
            .collect()
    }

    fn delete_camera_config(&self, camera_id: &CameraId) -> Result<bool> {
        let Some(mut record) = self.get_camera_config(camera_id) else { return Ok(false) };
        if record.is_deleted() {
            return Ok(true);
        }
        record.enabled = false;
        record.deleted_at = Some(chrono::Utc::now());
        record.updated_at = record.deleted_at.unwrap();
        self.save_camera_config(camera_id, record)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (FileConfigStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::new(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn generic_get_returns_default_when_missing() {
        let (store, _dir) = store();
        assert_eq!(store.get("ns", "missing", "fallback"), "fallback");
    }

    #[test]
    fn put_then_get_round_trips() {
        let (store, _dir) = store();
        assert!(store.put("ns", "k1", "v1"));
        assert_eq!(store.get("ns", "k1", "fallback"), "v1");
    }

    #[test]
    fn delete_removes_generic_entry() {
        let (store, _dir) = store();
        store.put("ns", "k1", "v1");
        assert!(store.delete("ns", "k1"));
        assert_eq!(store.get("ns", "k1", "fallback"), "fallback");
    }

    #[test]
    fn camera_config_save_then_get_is_semantically_identical() {
        let (store, _dir) = store();
        let id = CameraId::new("cam1").unwrap();
        let record = CameraConfigRecord::new("cam1", "rtsp://example/cam1");
        store.save_camera_config(&id, record.clone()).unwrap();
        let back = store.get_camera_config(&id).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn list_camera_ids_excludes_soft_deleted() {
        let (store, _dir) = store();
        let cam1 = CameraId::new("cam1").unwrap();
        let cam2 = CameraId::new("cam2").unwrap();
        store.save_camera_config(&cam1, CameraConfigRecord::new("cam1", "rtsp://a")).unwrap();
        store.save_camera_config(&cam2, CameraConfigRecord::new("cam2", "rtsp://b")).unwrap();
        store.delete_camera_config(&cam1).unwrap();

        let ids = store.list_camera_ids();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0], cam2);
    }

    #[test]
    fn deleted_camera_config_is_still_readable_directly() {
        let (store, _dir) = store();
        let id = CameraId::new("cam1").unwrap();
        store.save_camera_config(&id, CameraConfigRecord::new("cam1", "rtsp://a")).unwrap();
        store.delete_camera_config(&id).unwrap();

        let record = store.get_camera_config(&id).unwrap();
        assert!(!record.enabled);
        assert!(record.is_deleted());
    }

    #[test]
    fn deleting_unknown_camera_is_a_no_op() {
        let (store, _dir) = store();
        let id = CameraId::new("ghost").unwrap();
        assert!(!store.delete_camera_config(&id).unwrap());
    }

    #[test]
    fn save_after_delete_clears_deleted_at() {
        let (store, _dir) = store();
        let id = CameraId::new("cam1").unwrap();
        store.save_camera_config(&id, CameraConfigRecord::new("cam1", "rtsp://a")).unwrap();
        store.delete_camera_config(&id).unwrap();
        store.save_camera_config(&id, CameraConfigRecord::new("cam1", "rtsp://a")).unwrap();

        let ids = store.list_camera_ids();
        assert_eq!(ids.len(), 1);
    }
}
