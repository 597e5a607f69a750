use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKind {
    Intrusion,
    Loitering,
    ZoneEntry,
    ZoneExit,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub rule_id: String,
    pub kind: RuleKind,
    pub roi_id: String,
    pub min_duration_s: f64,
    pub min_confidence: f32,
    pub enabled: bool,
}
