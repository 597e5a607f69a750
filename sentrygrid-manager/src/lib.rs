pub mod manager;
pub mod monitor;
pub mod ports;
pub mod result;

pub use manager::{ManagerConfig, PipelineInfo, PipelineManager, PipelineSpawnArgs};
pub use monitor::{MonitorConfig, MonitorSnapshot, NullProbe, ResourceGauges, ResourceProbe};
pub use ports::PortPool;
pub use result::{AddResult, RemoveResult};
