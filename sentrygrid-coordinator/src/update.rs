use sentrygrid_types::{CameraId, Embedding, TrackId};
use std::time::Duration;

/// One camera's report of a local track's current appearance, submitted to
/// the coordinator's inbox on every tick the track carries a fresh
/// embedding.
#[derive(Clone, Debug)]
pub struct CrossCameraUpdate {
    pub camera_id: CameraId,
    pub track_id: TrackId,
    pub embedding: Embedding,
    pub last_seen_ts: Duration,
}

/// Reported when a camera's pipeline drops a local track (purge or
/// pipeline stop), so the coordinator can remove it from its owning
/// `GlobalTrack` without waiting for TTL expiry.
#[derive(Clone, Debug)]
pub struct TrackEnded {
    pub camera_id: CameraId,
    pub track_id: TrackId,
}
