//! Cross-camera identity fusion: binds local tracks from independent
//! per-camera pipelines into shared `GlobalTrack`s by appearance
//! similarity, behind a single cloneable handle shared by every pipeline.

pub mod coordinator;
pub mod error;
pub mod inbox;
pub mod inner;
pub mod stats;
pub mod update;

pub use coordinator::Coordinator;
pub use error::{CoordinatorError, Result};
pub use inner::CoordinatorConfig;
pub use stats::CoordinatorStats;
pub use update::{CrossCameraUpdate, TrackEnded};
