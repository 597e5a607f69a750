use sentrygrid_adapters::SourceConfig;
use sentrygrid_rules::RuleEngineConfig;
use sentrygrid_tracker::TrackerConfig;
use sentrygrid_types::DetectionThresholds;

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub thresholds: DetectionThresholds,
    pub tracker: TrackerConfig,
    pub rules: RuleEngineConfig,
    /// Run the detector on every Nth frame; the tracker still advances
    /// every frame on prediction alone in between.
    pub detection_interval: u32,
    /// Number of consecutive source failures before the pipeline gives up
    /// and transitions from `Degraded` to `Stopped`.
    pub max_consecutive_failures: u32,
    /// Lower bound, as a fraction of `source.target_fps`, below which the
    /// pipeline reports itself unhealthy.
    pub min_healthy_fps_fraction: f32,
    /// Base reconnect delay while `Degraded`; doubles per consecutive
    /// failure up to `backoff_max_ms`.
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig {
                url: String::new(),
                protocol: sentrygrid_adapters::SourceProtocol::File,
                username: None,
                password: None,
                target_width: 640,
                target_height: 480,
                target_fps: 15.0,
                enabled: true,
            },
            thresholds: DetectionThresholds { confidence: 0.5, nms: 0.5 },
            tracker: TrackerConfig::default(),
            rules: RuleEngineConfig::default(),
            detection_interval: 1,
            max_consecutive_failures: 10,
            min_healthy_fps_fraction: 0.5,
            backoff_base_ms: 200,
            backoff_max_ms: 5_000,
        }
    }
}
