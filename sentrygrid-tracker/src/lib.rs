pub mod assignment;
pub mod error;
pub mod kalman;
pub mod tracker;

pub use error::{Result, TrackerError};
pub use tracker::{Tracker, TrackerConfig, TrackUpdateSummary};
