#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CoordinatorStats {
    pub active_globals: usize,
    pub merges_total: u64,
    pub splits_total: u64,
    pub inbox_drops: u64,
}
