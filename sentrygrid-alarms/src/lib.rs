//! Fans confirmed alarm events out to HTTP, WebSocket, and MQTT
//! destinations with priority ordering, retry, and per-channel disposition
//! tracking.

pub mod channel;
pub mod channels;
pub mod error;
pub mod queue;
pub mod router;
pub mod stats;

pub use channel::Disposition;
pub use error::{AlarmError, Result};
pub use router::{AlarmRouter, AlarmRouterConfig, AlarmSink, DispatchOutcome};
pub use stats::AlarmStats;
