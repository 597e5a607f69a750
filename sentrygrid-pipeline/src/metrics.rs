use sentrygrid_types::PipelineMetricsSnapshot;
use std::time::{Duration, Instant};

const FPS_SMOOTHING: f32 = 0.2;
const INFERENCE_SMOOTHING: f32 = 0.2;

/// Exponentially-smoothed fps and inference-time tracking, plus raw
/// frame counters. Smoothing avoids a single slow tick making `healthy`
/// flap.
pub struct MetricsAccumulator {
    processed_frames: u64,
    dropped_frames: u64,
    current_fps: f32,
    avg_inference_ms: f32,
    last_tick: Option<Instant>,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self {
            processed_frames: 0,
            dropped_frames: 0,
            current_fps: 0.0,
            avg_inference_ms: 0.0,
            last_tick: None,
        }
    }

    pub fn record_processed(&mut self, inference: Duration) {
        self.processed_frames += 1;
        let now = Instant::now();
        if let Some(prev) = self.last_tick {
            let dt = now.duration_since(prev).as_secs_f32();
            if dt > 0.0 {
                let instant_fps = 1.0 / dt;
                self.current_fps = if self.processed_frames <= 1 {
                    instant_fps
                } else {
                    FPS_SMOOTHING * instant_fps + (1.0 - FPS_SMOOTHING) * self.current_fps
                };
            }
        }
        self.last_tick = Some(now);

        let inference_ms = inference.as_secs_f32() * 1000.0;
        self.avg_inference_ms = if self.processed_frames <= 1 {
            inference_ms
        } else {
            INFERENCE_SMOOTHING * inference_ms + (1.0 - INFERENCE_SMOOTHING) * self.avg_inference_ms
        };
    }

    pub fn record_dropped(&mut self) {
        self.dropped_frames += 1;
    }

    pub fn snapshot(&self, healthy: bool) -> PipelineMetricsSnapshot {
        PipelineMetricsSnapshot {
            processed_frames: self.processed_frames,
            dropped_frames: self.dropped_frames,
            current_fps: self.current_fps,
            avg_inference_ms: self.avg_inference_ms,
            healthy,
        }
    }
}

impl Default for MetricsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
