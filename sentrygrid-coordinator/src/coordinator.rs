use crate::inbox::Inbox;
use crate::inner::{CoordinatorConfig, CoordinatorInner};
use crate::stats::CoordinatorStats;
use crate::update::{CrossCameraUpdate, TrackEnded};
use sentrygrid_types::{CameraId, GlobalId, GlobalTrack, TrackId};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DEFAULT_INBOX_CAPACITY: usize = 1024;

/// Cross-camera identity registry. Cheap to clone: every clone shares the
/// same inner state through `Arc`, handing out handles onto one shared
/// table rather than copying it.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<parking_lot::RwLock<CoordinatorInner>>,
    inbox: Arc<Inbox>,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self::with_inbox_capacity(config, DEFAULT_INBOX_CAPACITY)
    }

    pub fn with_inbox_capacity(config: CoordinatorConfig, inbox_capacity: usize) -> Self {
        Self {
            inner: Arc::new(parking_lot::RwLock::new(CoordinatorInner::default())),
            inbox: Arc::new(Inbox::new(inbox_capacity)),
            config,
        }
    }

    /// Non-blocking submit from a per-camera pipeline tick. Drops the
    /// oldest queued update once the inbox is full.
    pub fn submit(&self, update: CrossCameraUpdate) {
        self.inbox.push(update);
    }

    pub fn on_track_ended(&self, camera_id: &CameraId, track_id: TrackId) {
        self.inner.write().on_track_ended(&TrackEnded { camera_id: camera_id.clone(), track_id });
    }

    pub fn find_owner(&self, camera_id: &CameraId, track_id: TrackId) -> Option<GlobalId> {
        self.inner.read().find_owner(camera_id, track_id)
    }

    pub fn global_track(&self, global_id: &GlobalId) -> Option<GlobalTrack> {
        self.inner.read().get(global_id).cloned()
    }

    pub fn expire(&self, now: Duration) -> usize {
        self.inner.write().expire(now)
    }

    pub fn stats(&self) -> CoordinatorStats {
        let inner = self.inner.read();
        CoordinatorStats {
            active_globals: inner.active_globals(),
            merges_total: inner.merges_total,
            splits_total: inner.splits_total,
            inbox_drops: self.inbox.drops(),
        }
    }

    /// Atomically clears every global track, member index entry, and
    /// lifetime counter. Queued-but-unprocessed inbox updates are left
    /// alone; they will seed fresh globals once drained.
    pub fn reset(&self) {
        self.inner.write().reset();
    }

    /// Applies one queued update directly, without going through the
    /// inbox. Exposed for tests and for callers that want synchronous,
    /// backpressure-free submission.
    pub fn apply(&self, update: CrossCameraUpdate) -> GlobalId {
        self.inner.write().bind_or_seed(update, &self.config)
    }

    /// Drains the inbox until `cancel` fires, applying each update to the
    /// registry as it arrives. Intended to run as a single long-lived
    /// background task per coordinator instance.
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                update = self.inbox.recv() => {
                    self.inner.write().bind_or_seed(update, &self.config);
                }
            }
        }
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
    fn apply_seeds_and_reports_stats() {
        let coord = Coordinator::new(CoordinatorConfig::default());
        coord.apply(upd("cam1", 1, vec![1.0, 0.0], 0));
        assert_eq!(coord.stats().active_globals, 1);
    }

    #[test]
    fn clone_shares_state() {
        let coord = Coordinator::new(CoordinatorConfig::default());
        let clone = coord.clone();
        coord.apply(upd("cam1", 1, vec![1.0, 0.0], 0));
        assert_eq!(clone.stats().active_globals, 1);
    }

    #[test]
    fn reset_is_visible_through_every_clone() {
        let coord = Coordinator::new(CoordinatorConfig::default());
        let clone = coord.clone();
        coord.apply(upd("cam1", 1, vec![1.0, 0.0], 0));
        clone.reset();
        assert_eq!(coord.stats().active_globals, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn submitted_update_is_applied_by_run_loop() {
        let coord = Coordinator::new(CoordinatorConfig::default());
        let cancel = CancellationToken::new();
        let runner = {
            let coord = coord.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { coord.run(cancel).await })
        };

        coord.submit(upd("cam1", 1, vec![1.0, 0.0], 0));

        for _ in 0..100 {
            if coord.stats().active_globals == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(coord.stats().active_globals, 1);

        cancel.cancel();
        runner.await.unwrap();
    }
}
