use crate::update::{CrossCameraUpdate, TrackEnded};
use sentrygrid_types::{CameraId, GlobalId, GlobalTrack, TrackId};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinatorConfig {
    /// Minimum cosine similarity to an existing global's centroid required
    /// to bind rather than seed a new identity.
    pub reid_threshold: f32,
    pub max_track_age_s: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self { reid_threshold: 0.75, max_track_age_s: 30 }
    }
}

#[derive(Default)]
pub struct CoordinatorInner {
    globals: HashMap<GlobalId, GlobalTrack>,
    member_index: HashMap<(CameraId, TrackId), GlobalId>,
    pub(crate) merges_total: u64,
    pub(crate) splits_total: u64,
}

impl CoordinatorInner {
    pub fn active_globals(&self) -> usize {
        self.globals.len()
    }

    pub fn get(&self, global_id: &GlobalId) -> Option<&GlobalTrack> {
        self.globals.get(global_id)
    }

    pub fn find_owner(&self, camera_id: &CameraId, track_id: TrackId) -> Option<GlobalId> {
        self.member_index.get(&(camera_id.clone(), track_id)).cloned()
    }

    /// Binds the update to the global track it already belongs to, to the
    /// best-matching existing global above `reid_threshold`, or seeds a
    /// fresh global track if neither applies. Returns the resulting
    /// `GlobalId`.
    pub fn bind_or_seed(&mut self, update: CrossCameraUpdate, config: &CoordinatorConfig) -> GlobalId {
        let key = (update.camera_id.clone(), update.track_id);

        if let Some(owner) = self.member_index.get(&key).cloned() {
            if let Some(global) = self.globals.get_mut(&owner) {
                global.bind(update.camera_id, update.track_id, &update.embedding, update.last_seen_ts);
                return owner;
            }
            self.member_index.remove(&key);
        }

        let best = self
            .globals
            .iter()
            .filter(|(_, g)| !g.is_expired(update.last_seen_ts))
            .filter_map(|(id, g)| {
                g.centroid_embedding
                    .cosine_similarity(&update.embedding)
                    .map(|sim| (id.clone(), sim))
            })
            .filter(|(_, sim)| *sim >= config.reid_threshold)
            .max_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((global_id, _)) = best {
            let global = self.globals.get_mut(&global_id).expect("id came from iterating globals");
            global.bind(update.camera_id.clone(), update.track_id, &update.embedding, update.last_seen_ts);
            self.member_index.insert(key, global_id.clone());
            self.merges_total += 1;
            return global_id;
        }

        let global_id = GlobalId::new_random();
        let ttl = Duration::from_secs(config.max_track_age_s);
        let global = GlobalTrack::new_seed(
            global_id.clone(),
            update.camera_id.clone(),
            update.track_id,
            update.embedding,
            update.last_seen_ts,
            ttl,
        );
        self.globals.insert(global_id.clone(), global);
        self.member_index.insert(key, global_id.clone());
        global_id
    }

    /// Removes one member immediately, e.g. when its owning pipeline
    /// purges the local track. Deletes the global track if it was the
    /// last member; otherwise counts it as a split.
    pub fn on_track_ended(&mut self, ended: &TrackEnded) {
        let Some(global_id) = self.member_index.remove(&(ended.camera_id.clone(), ended.track_id)) else {
            return;
        };
        let Some(global) = self.globals.get_mut(&global_id) else {
            return;
        };
        if global.drop_member(&ended.camera_id, ended.track_id) {
            self.globals.remove(&global_id);
        } else {
            self.splits_total += 1;
        }
    }

    /// Drops whole global tracks that have gone stale (no member reported
    /// in over its ttl), removing their member-index entries too. Returns
    /// the number of global tracks removed.
    pub fn expire(&mut self, now: Duration) -> usize {
        let expired: Vec<GlobalId> = self
            .globals
            .iter()
            .filter(|(_, g)| g.is_expired(now))
            .map(|(id, _)| id.clone())
            .collect();
        for global_id in &expired {
            if let Some(global) = self.globals.remove(global_id) {
                for (camera_id, track_id) in global.members() {
                    self.member_index.remove(&(camera_id.clone(), *track_id));
                }
            }
        }
        expired.len()
    }

    pub fn reset(&mut self) {
        self.globals.clear();
        self.member_index.clear();
        self.merges_total = 0;
        self.splits_total = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentrygrid_types::Embedding;

    fn upd(cam: &str, track: u64, vec_: Vec<f32>, ts: u64) -> CrossCameraUpdate {
        CrossCameraUpdate {
            camera_id: CameraId::new(cam).unwrap(),
            track_id: TrackId(track),
            embedding: Embedding::new(vec_, true),
            last_seen_ts: Duration::from_secs(ts),
        }
    }

    #[test]
    fn first_update_seeds_a_new_global() {
        let mut inner = CoordinatorInner::default();
        let config = CoordinatorConfig::default();
        let id = inner.bind_or_seed(upd("cam1", 1, vec![1.0, 0.0], 0), &config);
        assert_eq!(inner.active_globals(), 1);
        assert!(inner.get(&id).unwrap().contains(&CameraId::new("cam1").unwrap(), TrackId(1)));
    }

    #[test]
    fn similar_embedding_from_another_camera_binds_to_same_global() {
        let mut inner = CoordinatorInner::default();
        let config = CoordinatorConfig::default();
        let id1 = inner.bind_or_seed(upd("cam1", 1, vec![1.0, 0.0], 0), &config);
        let id2 = inner.bind_or_seed(upd("cam2", 9, vec![0.99, 0.01], 1), &config);
        assert_eq!(id1, id2);
        assert_eq!(inner.active_globals(), 1);
        assert_eq!(inner.merges_total, 1);
    }

    #[test]
    fn dissimilar_embedding_seeds_a_second_global() {
        let mut inner = CoordinatorInner::default();
        let config = CoordinatorConfig::default();
        inner.bind_or_seed(upd("cam1", 1, vec![1.0, 0.0], 0), &config);
        inner.bind_or_seed(upd("cam2", 2, vec![0.0, 1.0], 0), &config);
        assert_eq!(inner.active_globals(), 2);
        assert_eq!(inner.merges_total, 0);
    }

    #[test]
    fn repeated_update_for_same_member_rebinds_not_merges() {
        let mut inner = CoordinatorInner::default();
        let config = CoordinatorConfig::default();
        inner.bind_or_seed(upd("cam1", 1, vec![1.0, 0.0], 0), &config);
        inner.bind_or_seed(upd("cam1", 1, vec![1.0, 0.0], 1), &config);
        assert_eq!(inner.active_globals(), 1);
        assert_eq!(inner.merges_total, 0);
    }

    #[test]
    fn track_ended_removes_member_and_splits_if_others_remain() {
        let mut inner = CoordinatorInner::default();
        let config = CoordinatorConfig::default();
        let cam1 = CameraId::new("cam1").unwrap();
        inner.bind_or_seed(upd("cam1", 1, vec![1.0, 0.0], 0), &config);
        inner.bind_or_seed(upd("cam2", 2, vec![0.99, 0.01], 0), &config);
        inner.on_track_ended(&TrackEnded { camera_id: cam1, track_id: TrackId(1) });
        assert_eq!(inner.active_globals(), 1);
        assert_eq!(inner.splits_total, 1);
    }

    #[test]
    fn track_ended_removes_global_when_last_member() {
        let mut inner = CoordinatorInner::default();
        let config = CoordinatorConfig::default();
        let cam1 = CameraId::new("cam1").unwrap();
        inner.bind_or_seed(upd("cam1", 1, vec![1.0, 0.0], 0), &config);
        inner.on_track_ended(&TrackEnded { camera_id: cam1, track_id: TrackId(1) });
        assert_eq!(inner.active_globals(), 0);
    }

    #[test]
    fn expire_drops_stale_globals() {
        let mut inner = CoordinatorInner::default();
        let config = CoordinatorConfig { reid_threshold: 0.75, max_track_age_s: 10 };
        inner.bind_or_seed(upd("cam1", 1, vec![1.0, 0.0], 0), &config);
        let removed = inner.expire(Duration::from_secs(11));
        assert_eq!(removed, 1);
        assert_eq!(inner.active_globals(), 0);
    }

    #[test]
    fn reset_clears_all_state() {
        let mut inner = CoordinatorInner::default();
        let config = CoordinatorConfig::default();
        inner.bind_or_seed(upd("cam1", 1, vec![1.0, 0.0], 0), &config);
        inner.reset();
        assert_eq!(inner.active_globals(), 0);
        assert_eq!(inner.merges_total, 0);
    }
}
