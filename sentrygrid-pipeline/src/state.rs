/// Per-camera pipeline lifecycle. `Degraded` is reachable only from
/// `Running`, when the frame source keeps failing but hasn't yet given up
/// for good; a subsequent healthy frame takes it back to `Running`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PipelineState {
    Idle,
    Starting,
    Running,
    Degraded,
    Stopping,
    Stopped,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Stopped)
    }
}
