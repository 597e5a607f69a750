/// Observable per-pipeline metrics, bundled so the manager's monitor
/// loop can sample them without reaching into pipeline internals.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PipelineMetricsSnapshot {
    pub processed_frames: u64,
    pub dropped_frames: u64,
    pub current_fps: f32,
    pub avg_inference_ms: f32,
    pub healthy: bool,
}
