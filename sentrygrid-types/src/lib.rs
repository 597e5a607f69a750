//! Shared data model for the video analytics core.
//!
//! Every type here is a plain value type; none owns a thread, a socket, or
//! a lock. Components that need shared ownership (`GlobalTrack` in the
//! coordinator, the pipeline table in the manager) wrap these in
//! `Arc`/`RwLock` at the call site rather than baking concurrency into the
//! data model itself.

pub mod alarm;
pub mod camera;
pub mod detection;
pub mod embedding;
pub mod error;
pub mod frame;
pub mod global_track;
pub mod roi;
pub mod rule;
pub mod status;
pub mod track;

pub use alarm::{
    AlarmChannelConfig, AlarmChannelKind, AlarmEvent, AlarmPayload, HttpChannelTarget,
    MqttChannelTarget, WebSocketChannelTarget, WireAlarmEvent,
};
pub use camera::{CameraId, CameraStatus};
pub use detection::{ClassId, Detection, DetectionThresholds};
pub use embedding::Embedding;
pub use error::{Error, PolygonError, Result};
pub use frame::{BBox, Frame};
pub use global_track::GlobalTrack;
pub use roi::{validate_polygon, TimeWindow, Vertex, ROI};
pub use rule::{Rule, RuleKind};
pub use status::PipelineMetricsSnapshot;
pub use track::{GlobalId, LocalTrack, TrackId, TrackState};
