use crate::config::PipelineConfig;
use crate::metrics::MetricsAccumulator;
use crate::state::PipelineState;
use chrono::{DateTime, Timelike, Utc};
use sentrygrid_adapters::{Detector, Embedder, FrameSource};
use sentrygrid_alarms::AlarmSink;
use sentrygrid_coordinator::{Coordinator, CrossCameraUpdate};
use sentrygrid_reid::ReidEngine;
use sentrygrid_rules::RuleEngine;
use sentrygrid_tracker::Tracker;
use sentrygrid_types::{CameraId, PipelineMetricsSnapshot, Rule, TrackState, ROI};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn wall_clock_seconds(ts: DateTime<Utc>) -> u32 {
    ts.time().num_seconds_from_midnight()
}

const BACKOFF_SHIFT_CAP: u32 = 16;

fn backoff_delay_ms(base_ms: u64, max_ms: u64, consecutive_failures: u32) -> u64 {
    base_ms.saturating_mul(1 << consecutive_failures.min(BACKOFF_SHIFT_CAP)).min(max_ms)
}

/// Handle the manager holds onto a running per-camera pipeline. The
/// worker itself lives on a dedicated OS thread since every call into the
/// frame source, detector, and embedder is blocking by contract.
pub struct PipelineHandle {
    camera_id: CameraId,
    state: Arc<parking_lot::RwLock<PipelineState>>,
    metrics: Arc<parking_lot::Mutex<PipelineMetricsSnapshot>>,
    stop_tx: std_mpsc::Sender<()>,
    join: Option<std::thread::JoinHandle<()>>,
}

impl PipelineHandle {
    pub fn camera_id(&self) -> &CameraId {
        &self.camera_id
    }

    pub fn state(&self) -> PipelineState {
        *self.state.read()
    }

    pub fn metrics(&self) -> PipelineMetricsSnapshot {
        *self.metrics.lock()
    }

    /// Signals the worker thread to stop and blocks until it exits,
    /// guaranteeing the frame source, detector, and embedder have been
    /// dropped by the time this returns.
    pub fn stop(mut self) {
        let _ = self.stop_tx.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for PipelineHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

pub fn spawn(
    camera_id: CameraId,
    config: PipelineConfig,
    source: Box<dyn FrameSource>,
    detector: Box<dyn Detector>,
    embedder: Box<dyn Embedder>,
    rois: Vec<ROI>,
    rules: Vec<Rule>,
    coordinator: Coordinator,
    alarm_sink: Arc<dyn AlarmSink + Send + Sync>,
) -> PipelineHandle {
    let state = Arc::new(parking_lot::RwLock::new(PipelineState::Idle));
    let metrics = Arc::new(parking_lot::Mutex::new(PipelineMetricsSnapshot::default()));
    let (stop_tx, stop_rx) = std_mpsc::channel();

    let state_bg = state.clone();
    let metrics_bg = metrics.clone();
    let camera_id_bg = camera_id.clone();

    let join = std::thread::Builder::new()
        .name(format!("sentrygrid-pipeline-{camera_id_bg}"))
        .spawn(move || {
            run(
                camera_id_bg,
                config,
                source,
                detector,
                embedder,
                rois,
                rules,
                coordinator,
                alarm_sink,
                state_bg,
                metrics_bg,
                stop_rx,
            )
        })
        .expect("spawning pipeline worker thread");

    PipelineHandle { camera_id, state, metrics, stop_tx, join: Some(join) }
}

#[allow(clippy::too_many_arguments)]
fn run(
    camera_id: CameraId,
    config: PipelineConfig,
    mut source: Box<dyn FrameSource>,
    mut detector: Box<dyn Detector>,
    embedder: Box<dyn Embedder>,
    rois: Vec<ROI>,
    rules: Vec<Rule>,
    coordinator: Coordinator,
    alarm_sink: Arc<dyn AlarmSink + Send + Sync>,
    state: Arc<parking_lot::RwLock<PipelineState>>,
    metrics: Arc<parking_lot::Mutex<PipelineMetricsSnapshot>>,
    stop_rx: std_mpsc::Receiver<()>,
) {
    *state.write() = PipelineState::Starting;

    let frame_budget = Duration::from_secs_f32(1.0 / config.source.target_fps.max(1.0));
    if source.test_connection(frame_budget.max(Duration::from_millis(200))).is_err() {
        tracing::warn!(camera = %camera_id, "pipeline failed initial connection test");
        *state.write() = PipelineState::Stopped;
        return;
    }

    *state.write() = PipelineState::Running;

    let mut tracker = Tracker::new(camera_id.clone(), config.tracker);
    let mut reid = ReidEngine::new(embedder);
    let mut rule_engine = RuleEngine::new(camera_id.clone(), config.rules);
    for roi in rois {
        rule_engine.put_roi(roi);
    }
    for rule in rules {
        rule_engine.put_rule(rule);
    }

    let mut acc = MetricsAccumulator::new();
    let mut consecutive_failures: u32 = 0;
    let mut tick: u64 = 0;

    loop {
        if stop_rx.try_recv().is_ok() {
            break;
        }

        let deadline = Instant::now() + frame_budget;
        let frame = match source.next(deadline) {
            Ok(frame) => frame,
            Err(err) if !err.is_terminal() => continue,
            Err(err) => {
                consecutive_failures += 1;
                acc.record_dropped();
                tracing::warn!(camera = %camera_id, error = %err, consecutive_failures, "frame source error");
                if *state.read() == PipelineState::Running {
                    *state.write() = PipelineState::Degraded;
                }
                if consecutive_failures >= config.max_consecutive_failures {
                    tracing::error!(camera = %camera_id, "giving up after repeated frame source failures");
                    break;
                }
                std::thread::sleep(Duration::from_millis(backoff_delay_ms(
                    config.backoff_base_ms,
                    config.backoff_max_ms,
                    consecutive_failures,
                )));
                continue;
            }
        };

        if consecutive_failures > 0 {
            consecutive_failures = 0;
            *state.write() = PipelineState::Running;
        }

        let inference_start = Instant::now();
        tick += 1;

        let detections = if tick % config.detection_interval.max(1) as u64 == 0 {
            match detector.detect(&frame, &config.thresholds) {
                Ok(d) => d,
                Err(err) => {
                    tracing::warn!(camera = %camera_id, error = %err, "detector error, treating tick as no detections");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let summary = match tracker.update(frame.sequence_no, frame.capture_ts_ns, frame.width, frame.height, &detections, None) {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!(camera = %camera_id, error = %err, "tracker update failed");
                acc.record_dropped();
                continue;
            }
        };

        for track_id in &summary.purged {
            coordinator.on_track_ended(&camera_id, *track_id);
            rule_engine.purge_track(*track_id);
        }

        // Best-effort confidence per track: the score of whichever this
        // tick's detection overlaps it most, or its last known score on
        // ticks where the detector didn't run.
        let mut confidences = std::collections::HashMap::new();
        for track in tracker.tracks().iter() {
            if track.state != TrackState::Confirmed {
                continue;
            }
            let best = detections
                .iter()
                .filter(|d| d.bbox.iou(&track.latest_bbox()) > 0.3)
                .map(|d| d.score)
                .fold(None, |acc: Option<f32>, score| Some(acc.map_or(score, |a| a.max(score))));
            if let Some(score) = best {
                confidences.insert(track.track_id, score);
            } else {
                confidences.entry(track.track_id).or_insert(1.0);
            }
        }

        for track_id in tracker.tracks().iter().map(|t| t.track_id).collect::<Vec<_>>() {
            let Some(track) = tracker.track_mut(track_id) else { continue };
            if track.state != TrackState::Confirmed {
                continue;
            }
            match reid.ensure_embedding(&frame, track, frame.sequence_no) {
                Ok(true) | Ok(false) => {
                    if let Some(embedding) = track.embedding.clone() {
                        if embedding.valid {
                            coordinator.submit(CrossCameraUpdate {
                                camera_id: camera_id.clone(),
                                track_id,
                                embedding,
                                last_seen_ts: Duration::from_nanos(frame.capture_ts_ns),
                            });
                        }
                    }
                }
                Err(err) => tracing::warn!(camera = %camera_id, error = %err, "reid embedding failed"),
            }
        }

        let capture_ts = DateTime::<Utc>::from_timestamp(
            (frame.capture_ts_ns / 1_000_000_000) as i64,
            (frame.capture_ts_ns % 1_000_000_000) as u32,
        )
        .unwrap_or_else(Utc::now);
        let wall_clock_s = wall_clock_seconds(capture_ts);
        let now = Duration::from_nanos(frame.capture_ts_ns);

        let events = rule_engine.evaluate(now, wall_clock_s, capture_ts, tracker.tracks(), &confidences);
        for event in events {
            alarm_sink.submit(event);
        }

        acc.record_processed(inference_start.elapsed());
        let healthy = *state.read() == PipelineState::Running
            && acc.snapshot(true).current_fps >= config.source.target_fps * config.min_healthy_fps_fraction;
        *metrics.lock() = acc.snapshot(healthy);
    }

    *state.write() = PipelineState::Stopping;
    drop(tracker);
    drop(rule_engine);
    *state.write() = PipelineState::Stopped;
}
