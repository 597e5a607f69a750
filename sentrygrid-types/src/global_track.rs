use crate::camera::CameraId;
use crate::embedding::Embedding;
use crate::track::{GlobalId, TrackId};
use std::collections::BTreeSet;
use std::time::Duration;

/// A fused, cross-camera identity.
///
/// A `(camera_id, local_track_id)` pair belongs to at most one
/// `GlobalTrack` — enforced by the coordinator, which is the sole mutator;
/// `centroid_embedding` is the running mean of member embeddings,
/// re-normalised to unit length on every update.
#[derive(Clone, Debug)]
pub struct GlobalTrack {
    pub global_id: GlobalId,
    members: BTreeSet<(CameraId, TrackId)>,
    pub centroid_embedding: Embedding,
    pub last_update_ts: Duration,
    pub ttl: Duration,
}

impl GlobalTrack {
    pub fn new_seed(
        global_id: GlobalId,
        camera_id: CameraId,
        track_id: TrackId,
        embedding: Embedding,
        now: Duration,
        ttl: Duration,
    ) -> Self {
        let mut members = BTreeSet::new();
        members.insert((camera_id, track_id));
        Self {
            global_id,
            members,
            centroid_embedding: embedding,
            last_update_ts: now,
            ttl,
        }
    }

    pub fn members(&self) -> impl Iterator<Item = &(CameraId, TrackId)> {
        self.members.iter()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, camera_id: &CameraId, track_id: TrackId) -> bool {
        self.members.contains(&(camera_id.clone(), track_id))
    }

    pub fn bind(&mut self, camera_id: CameraId, track_id: TrackId, embedding: &Embedding, now: Duration) {
        let n = self.members.len();
        self.centroid_embedding = Embedding::running_mean_update(&self.centroid_embedding, n, embedding);
        self.members.insert((camera_id, track_id));
        self.last_update_ts = now;
    }

    /// Drop a member whose local track ended or whose `last_seen_ts` aged
    /// out past `max_track_age`. Returns true if this was the last member,
    /// in which case the caller should delete the `GlobalTrack`.
    pub fn drop_member(&mut self, camera_id: &CameraId, track_id: TrackId) -> bool {
        self.members.remove(&(camera_id.clone(), track_id));
        self.members.is_empty()
    }

    pub fn is_expired(&self, now: Duration) -> bool {
        now.saturating_sub(self.last_update_ts) > self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_adds_member_and_updates_centroid() {
        let cam = CameraId::new("cam1").unwrap();
        let e0 = Embedding::new(vec![1.0, 0.0], true);
        let mut gt = GlobalTrack::new_seed(
            GlobalId::new_random(),
            cam.clone(),
            TrackId(1),
            e0,
            Duration::from_secs(0),
            Duration::from_secs(30),
        );
        assert_eq!(gt.member_count(), 1);

        let e1 = Embedding::new(vec![0.0, 1.0], true);
        gt.bind(cam.clone(), TrackId(2), &e1, Duration::from_secs(1));
        assert_eq!(gt.member_count(), 2);
        assert!(gt.contains(&cam, TrackId(2)));
    }

    #[test]
    fn drop_last_member_reports_empty() {
        let cam = CameraId::new("cam1").unwrap();
        let e0 = Embedding::new(vec![1.0, 0.0], true);
        let mut gt = GlobalTrack::new_seed(
            GlobalId::new_random(),
            cam.clone(),
            TrackId(1),
            e0,
            Duration::from_secs(0),
            Duration::from_secs(30),
        );
        assert!(gt.drop_member(&cam, TrackId(1)));
    }

    #[test]
    fn expiry_uses_ttl() {
        let cam = CameraId::new("cam1").unwrap();
        let e0 = Embedding::new(vec![1.0, 0.0], true);
        let gt = GlobalTrack::new_seed(
            GlobalId::new_random(),
            cam,
            TrackId(1),
            e0,
            Duration::from_secs(0),
            Duration::from_secs(30),
        );
        assert!(!gt.is_expired(Duration::from_secs(29)));
        assert!(gt.is_expired(Duration::from_secs(31)));
    }
}
