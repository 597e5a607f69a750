#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RuleEngineStats {
    pub rules_evaluated: u64,
    pub events_emitted: u64,
    pub suppressed_cooldown: u64,
    pub conflicts_resolved: u64,
}
