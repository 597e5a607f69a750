use crate::monitor::{MonitorAccumulator, MonitorConfig, MonitorSnapshot, ResourceProbe};
use crate::ports::PortPool;
use crate::result::{AddResult, RemoveResult};
use sentrygrid_adapters::{Detector, Embedder, FrameSource};
use sentrygrid_alarms::AlarmSink;
use sentrygrid_config::ConfigStore;
use sentrygrid_coordinator::Coordinator;
use sentrygrid_pipeline::{PipelineConfig, PipelineHandle, PipelineState};
use sentrygrid_types::{CameraId, PipelineMetricsSnapshot, Rule, ROI};
use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DEFAULT_LIFECYCLE_WORKERS: usize = 4;
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(20);
const STARTUP_POLL_ITERATIONS: u32 = 50;

#[derive(Clone, Debug, PartialEq)]
pub struct ManagerConfig {
    /// Bound on concurrently in-flight lifecycle operations (spawn/stop),
    /// so a burst of `add`/`remove` calls can't pile up unbounded
    /// blocking joins.
    pub lifecycle_workers: usize,
    pub mjpeg_port_range: RangeInclusive<u16>,
    pub monitor: MonitorConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            lifecycle_workers: DEFAULT_LIFECYCLE_WORKERS,
            mjpeg_port_range: 20000..=20099,
            monitor: MonitorConfig::default(),
        }
    }
}

/// Everything needed to start one camera's pipeline, bundled so `add`
/// takes a single owned argument.
pub struct PipelineSpawnArgs {
    pub config: PipelineConfig,
    pub source: Box<dyn FrameSource>,
    pub detector: Box<dyn Detector>,
    pub embedder: Box<dyn Embedder>,
    pub rois: Vec<ROI>,
    pub rules: Vec<Rule>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineInfo {
    pub camera_id: CameraId,
    pub state: PipelineState,
    pub metrics: PipelineMetricsSnapshot,
    pub mjpeg_port: u16,
}

struct Entry {
    handle: PipelineHandle,
    mjpeg_port: u16,
}

/// Owns the collection of per-camera pipelines. Single-writer (this
/// struct's own methods), many-reader: the pipeline table is a
/// `RwLock`, so `list`/`get` never contend with each other, only with
/// `add`/`remove`.
pub struct PipelineManager {
    pipelines: Arc<parking_lot::RwLock<HashMap<CameraId, Entry>>>,
    pending: Arc<parking_lot::Mutex<HashSet<CameraId>>>,
    ports: Arc<PortPool>,
    coordinator: Coordinator,
    alarm_sink: Arc<dyn AlarmSink + Send + Sync>,
    lifecycle_sem: Arc<tokio::sync::Semaphore>,
    monitor_snapshot: Arc<parking_lot::RwLock<HashMap<CameraId, MonitorSnapshot>>>,
    monitor_config: MonitorConfig,
    /// When set, a `StartFailed` add rolls back any persisted camera
    /// record for the id via a soft-delete, so a caller that writes
    /// config before calling `add` never leaves an orphaned enabled
    /// record behind.
    config_store: Option<Arc<dyn ConfigStore>>,
}

impl PipelineManager {
    pub fn new(config: ManagerConfig, coordinator: Coordinator, alarm_sink: Arc<dyn AlarmSink + Send + Sync>) -> Arc<Self> {
        Self::with_config_store(config, coordinator, alarm_sink, None)
    }

    pub fn with_config_store(
        config: ManagerConfig,
        coordinator: Coordinator,
        alarm_sink: Arc<dyn AlarmSink + Send + Sync>,
        config_store: Option<Arc<dyn ConfigStore>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            pipelines: Arc::new(parking_lot::RwLock::new(HashMap::new())),
            pending: Arc::new(parking_lot::Mutex::new(HashSet::new())),
            ports: Arc::new(PortPool::new(config.mjpeg_port_range.clone())),
            coordinator,
            alarm_sink,
            lifecycle_sem: Arc::new(tokio::sync::Semaphore::new(config.lifecycle_workers.max(1))),
            monitor_snapshot: Arc::new(parking_lot::RwLock::new(HashMap::new())),
            monitor_config: config.monitor,
            config_store,
        })
    }

    /// Idempotent under concurrent retry: at most one startup for a given
    /// id is ever in flight, guarded by the pending-operations set. A
    /// second caller racing the first gets `Duplicate` immediately rather
    /// than waiting on the first's outcome.
    pub async fn add(&self, camera_id: CameraId, args: PipelineSpawnArgs) -> AddResult {
        {
            let mut pending = self.pending.lock();
            if self.pipelines.read().contains_key(&camera_id) {
                return AddResult::Duplicate;
            }
            if !pending.insert(camera_id.clone()) {
                return AddResult::Duplicate;
            }
        }

        let result = self.add_inner(&camera_id, args).await;
        self.pending.lock().remove(&camera_id);
        result
    }

    async fn add_inner(&self, camera_id: &CameraId, args: PipelineSpawnArgs) -> AddResult {
        let Some(port) = self.ports.reserve() else {
            tracing::warn!(camera = %camera_id, "mjpeg port pool exhausted");
            return self.start_failed(camera_id, None);
        };

        let permit = match self.lifecycle_sem.clone().acquire_owned().await {
            Ok(p) => p,
            Err(_) => return self.start_failed(camera_id, Some(port)),
        };

        let coordinator = self.coordinator.clone();
        let alarm_sink = self.alarm_sink.clone();
        let camera_id_owned = camera_id.clone();
        let spawned = tokio::task::spawn_blocking(move || {
            sentrygrid_pipeline::spawn(
                camera_id_owned,
                args.config,
                args.source,
                args.detector,
                args.embedder,
                args.rois,
                args.rules,
                coordinator,
                alarm_sink,
            )
        })
        .await;
        drop(permit);

        let handle = match spawned {
            Ok(handle) => handle,
            Err(_) => return self.start_failed(camera_id, Some(port)),
        };

        if !Self::wait_for_start(&handle).await {
            let _ = tokio::task::spawn_blocking(move || handle.stop()).await;
            return self.start_failed(camera_id, Some(port));
        }

        self.pipelines.write().insert(camera_id.clone(), Entry { handle, mjpeg_port: port });
        AddResult::Ok
    }

    /// Releases the reserved port (if any) and, when a config store is
    /// wired up, soft-deletes any persisted record for `camera_id` so a
    /// failed start never leaves an orphaned enabled record behind.
    fn start_failed(&self, camera_id: &CameraId, port: Option<u16>) -> AddResult {
        if let Some(port) = port {
            self.ports.release(port);
        }
        if let Some(store) = &self.config_store {
            if let Err(err) = store.delete_camera_config(camera_id) {
                tracing::warn!(camera = %camera_id, error = %err, "failed to roll back camera config after failed start");
            }
        }
        AddResult::StartFailed
    }

    /// Polls briefly for the pipeline to leave `Starting`, so a pipeline
    /// whose initial connection test fails fast is reported as
    /// `StartFailed` rather than silently parked. A slow-but-healthy
    /// source that is still `Starting` after the grace window is treated
    /// as having started; its real state keeps updating in the table.
    async fn wait_for_start(handle: &PipelineHandle) -> bool {
        for _ in 0..STARTUP_POLL_ITERATIONS {
            match handle.state() {
                PipelineState::Stopped => return false,
                PipelineState::Starting => tokio::time::sleep(STARTUP_POLL_INTERVAL).await,
                _ => return true,
            }
        }
        true
    }

    pub async fn remove(&self, camera_id: &CameraId) -> RemoveResult {
        let entry = self.pipelines.write().remove(camera_id);
        let Some(entry) = entry else { return RemoveResult::NotFound };

        let permit = self.lifecycle_sem.clone().acquire_owned().await.ok();
        let _ = tokio::task::spawn_blocking(move || entry.handle.stop()).await;
        drop(permit);
        self.ports.release(entry.mjpeg_port);
        RemoveResult::Ok
    }

    pub fn list(&self) -> Vec<CameraId> {
        self.pipelines.read().keys().cloned().collect()
    }

    pub fn get(&self, camera_id: &CameraId) -> Option<PipelineInfo> {
        let pipelines = self.pipelines.read();
        let entry = pipelines.get(camera_id)?;
        Some(PipelineInfo {
            camera_id: camera_id.clone(),
            state: entry.handle.state(),
            metrics: entry.handle.metrics(),
            mjpeg_port: entry.mjpeg_port,
        })
    }

    pub fn get_mjpeg_port(&self, camera_id: &CameraId) -> Option<u16> {
        self.pipelines.read().get(camera_id).map(|e| e.mjpeg_port)
    }

    /// Clears the coordinator's cross-camera identity table. Per-camera
    /// pipelines and their local tracks are untouched.
    pub fn reset_cross_camera(&self) {
        self.coordinator.reset();
    }

    pub fn monitor_snapshot(&self, camera_id: &CameraId) -> Option<MonitorSnapshot> {
        self.monitor_snapshot.read().get(camera_id).cloned()
    }

    /// Runs the cadence loop until `cancel` fires: every `config.monitor`
    /// interval, samples `probe` and each pipeline's own metrics,
    /// updating per-camera cycle-time health.
    pub async fn run_monitor(self: Arc<Self>, probe: Arc<dyn ResourceProbe>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(crate::monitor::interval_duration(&self.monitor_config));
        let target_interval_ms = self.monitor_config.target_interval_ms;
        let mut accumulators: HashMap<CameraId, MonitorAccumulator> = HashMap::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let gauges = probe.sample();
                    let ids = self.list();
                    let mut snapshot = self.monitor_snapshot.write();
                    for id in &ids {
                        let acc = accumulators.entry(id.clone()).or_insert_with(|| MonitorAccumulator::new(target_interval_ms));
                        snapshot.insert(id.clone(), acc.record_cycle(gauges));
                    }
                    let live: HashSet<_> = ids.into_iter().collect();
                    accumulators.retain(|id, _| live.contains(id));
                    snapshot.retain(|id, _| live.contains(id));
                }
            }
        }
    }
}
