use anyhow::Context;
use clap::Parser;
use sentrygrid_adapters::{FixedDetector, FixedEmbedder, FixedFrameSource, SourceConfig, SourceProtocol};
use sentrygrid_alarms::{AlarmRouter, AlarmRouterConfig, AlarmSink};
use sentrygrid_config::{CameraConfigRecord, ConfigStore, FileConfigStore};
use sentrygrid_coordinator::Coordinator;
use sentrygrid_manager::{ManagerConfig, NullProbe, PipelineManager, PipelineSpawnArgs};
use sentrygrid_pipeline::PipelineConfig;
use sentrygrid_types::{AlarmChannelConfig, AlarmChannelKind, CameraId, WebSocketChannelTarget};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Runs the cross-camera analytics core against whatever camera records
/// are on disk under `--config-dir`, wiring each enabled camera to the
/// fixed-frame-source/detector/embedder stand-ins rather than a real
/// decode/inference backend. Useful for exercising the tracker, rule
/// engine, coordinator, and alarm router end to end without a camera.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Directory holding persisted camera config records (one JSON file
    /// per camera under `<config-dir>/cameras/`).
    #[arg(long, default_value = "./sentrygrid-data")]
    config_dir: std::path::PathBuf,

    /// If no camera records exist yet, seed one at this id so the demo
    /// has something to run.
    #[arg(long, default_value = "demo-cam")]
    seed_camera_id: String,

    /// Port the alarm websocket channel listens on.
    #[arg(long, default_value_t = 9700)]
    alarm_ws_port: u16,

    /// How long to run before shutting everything down cleanly.
    #[arg(long, default_value_t = 30)]
    run_seconds: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "sentrygrid=info,sentrygrid_manager=info,sentrygrid_pipeline=info,warn");
    }
    tracing_subscriber::registry()
        .with(fmt::layer().compact())
        .with(EnvFilter::from_default_env())
        .init();

    let opt = Cli::parse();

    let config_store: Arc<dyn ConfigStore> = Arc::new(
        FileConfigStore::new(&opt.config_dir).context("opening config store")?,
    );
    seed_demo_camera_if_empty(&config_store, &opt.seed_camera_id)?;

    let ws_channel = AlarmChannelConfig {
        id: "demo-ws".to_string(),
        enabled: true,
        priority: 0,
        kind: AlarmChannelKind::WebSocket(WebSocketChannelTarget {
            port: opt.alarm_ws_port,
            ping_interval_ms: 15_000,
            allow_fanout_zero: true,
        }),
    };
    let router = AlarmRouter::new(&[ws_channel], AlarmRouterConfig::default())
        .await
        .context("starting alarm router")?;
    let cancel = CancellationToken::new();
    let router_workers = router.spawn_workers(cancel.clone());
    let alarm_sink: Arc<dyn AlarmSink + Send + Sync> = Arc::new(router.clone());

    let coordinator = Coordinator::new(Default::default());
    let coordinator_task = {
        let coordinator = coordinator.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { coordinator.run(cancel).await })
    };

    let manager = PipelineManager::with_config_store(
        ManagerConfig::default(),
        coordinator.clone(),
        alarm_sink,
        Some(config_store.clone()),
    );
    let monitor_task = {
        let manager = manager.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { manager.run_monitor(Arc::new(NullProbe), cancel).await })
    };

    for camera_id in config_store.list_camera_ids() {
        let Some(record) = config_store.get_camera_config(&camera_id) else { continue };
        if !record.enabled {
            tracing::info!(camera = %camera_id, "skipping disabled camera");
            continue;
        }
        let args = spawn_args_for(&record);
        match manager.add(camera_id.clone(), args).await {
            sentrygrid_manager::AddResult::Ok => tracing::info!(camera = %camera_id, "pipeline started"),
            sentrygrid_manager::AddResult::Duplicate => tracing::warn!(camera = %camera_id, "already running"),
            sentrygrid_manager::AddResult::StartFailed => tracing::error!(camera = %camera_id, "failed to start"),
        }
    }

    tokio::time::sleep(Duration::from_secs(opt.run_seconds)).await;

    tracing::info!("shutting down");
    cancel.cancel();
    for camera_id in manager.list() {
        manager.remove(&camera_id).await;
    }
    let _ = coordinator_task.await;
    let _ = monitor_task.await;
    for worker in router_workers {
        let _ = worker.await;
    }

    Ok(())
}

/// Builds the demo pipeline inputs for one camera: an empty fixed frame
/// source (the pipeline reports `ConnectionLost` and degrades, which is
/// enough to exercise manager lifecycle/health reporting without a real
/// feed), a detector that finds nothing, and a 128-dim embedder.
fn spawn_args_for(record: &CameraConfigRecord) -> PipelineSpawnArgs {
    let mut config = PipelineConfig::default();
    config.source = SourceConfig {
        url: record.rtsp_url.clone(),
        protocol: match record.protocol.as_str() {
            "http" => SourceProtocol::Http,
            "file" => SourceProtocol::File,
            _ => SourceProtocol::Rtsp,
        },
        username: record.username.clone(),
        password: record.password.clone(),
        target_width: record.width,
        target_height: record.height,
        target_fps: record.fps,
        enabled: record.enabled,
    };
    config.thresholds.confidence = record.detection_config.confidence_threshold;
    config.thresholds.nms = record.detection_config.nms_threshold;

    PipelineSpawnArgs {
        config,
        source: Box::new(FixedFrameSource::new(Vec::new())),
        detector: Box::new(FixedDetector::new(Vec::new())),
        embedder: Box::new(FixedEmbedder::new(128)),
        rois: Vec::new(),
        rules: Vec::new(),
    }
}

fn seed_demo_camera_if_empty(store: &Arc<dyn ConfigStore>, camera_id: &str) -> anyhow::Result<()> {
    if !store.list_camera_ids().is_empty() {
        return Ok(());
    }
    let id = CameraId::new(camera_id).context("invalid seed camera id")?;
    let record = CameraConfigRecord::new(camera_id, "rtsp://127.0.0.1:8554/demo");
    store.save_camera_config(&id, record).context("seeding demo camera config")?;
    Ok(())
}
