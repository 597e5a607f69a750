//! Trait contracts and mock implementations for the frame- and
//! inference-facing boundary of the core: `FrameSource` and `Detector`.
//! `Embedder` lives here too since it shares the same "wraps an inference
//! backend" shape as `Detector`, even though the distilled data model
//! groups it with reID rather than capture.

pub mod detector;
pub mod embedder;
pub mod error;
pub mod frame_source;

pub use detector::{Detector, FixedDetector};
pub use embedder::{Embedder, FixedEmbedder};
pub use error::{DetectorError, EmbedderError, FrameSourceError};
pub use frame_source::{FixedFrameSource, FrameSource, SourceConfig, SourceProtocol};
