#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("frame source: {0}")]
    Source(#[from] sentrygrid_adapters::FrameSourceError),
    #[error("detector: {0}")]
    Detector(#[from] sentrygrid_adapters::DetectorError),
    #[error("tracker: {0}")]
    Tracker(#[from] sentrygrid_tracker::TrackerError),
    #[error("reid: {0}")]
    Reid(#[from] sentrygrid_reid::ReidError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
