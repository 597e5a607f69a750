use crate::presence::Presence;
use crate::stats::RuleEngineStats;
use chrono::{DateTime, Utc};
use sentrygrid_types::{AlarmEvent, AlarmPayload, CameraId, LocalTrack, Rule, RuleKind, TrackId, ROI};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RuleEngineConfig {
    pub cooldown_s: f64,
    pub loiter_variance_threshold: f64,
}

impl Default for RuleEngineConfig {
    fn default() -> Self {
        Self { cooldown_s: 10.0, loiter_variance_threshold: 25.0 }
    }
}

struct Candidate {
    rule: Rule,
    priority: u8,
    start_key: u32,
}

/// Evaluates the enabled rules of one camera against its current tracks,
/// resolving overlapping-ROI conflicts to at most one event per
/// `(track, frame)` and suppressing repeats inside a per-`(rule, track)`
/// cooldown.
pub struct RuleEngine {
    camera_id: CameraId,
    rois: HashMap<String, ROI>,
    rules: Vec<Rule>,
    config: RuleEngineConfig,
    presence: HashMap<(String, TrackId), Presence>,
    cooldowns: HashMap<(String, TrackId), Duration>,
    stats: RuleEngineStats,
}

impl RuleEngine {
    pub fn new(camera_id: CameraId, config: RuleEngineConfig) -> Self {
        Self {
            camera_id,
            rois: HashMap::new(),
            rules: Vec::new(),
            config,
            presence: HashMap::new(),
            cooldowns: HashMap::new(),
            stats: RuleEngineStats::default(),
        }
    }

    pub fn put_roi(&mut self, roi: ROI) {
        self.rois.insert(roi.roi_id.clone(), roi);
    }

    pub fn remove_roi(&mut self, roi_id: &str) {
        self.rois.remove(roi_id);
    }

    pub fn put_rule(&mut self, rule: Rule) {
        if let Some(existing) = self.rules.iter_mut().find(|r| r.rule_id == rule.rule_id) {
            *existing = rule;
        } else {
            self.rules.push(rule);
        }
    }

    pub fn remove_rule(&mut self, rule_id: &str) {
        self.rules.retain(|r| r.rule_id != rule_id);
    }

    pub fn stats(&self) -> RuleEngineStats {
        self.stats
    }

    /// Drops all state keyed by `track_id` (presence, cooldowns) when its
    /// owning track ends.
    pub fn purge_track(&mut self, track_id: TrackId) {
        self.presence.retain(|(_, t), _| *t != track_id);
        self.cooldowns.retain(|(_, t), _| *t != track_id);
    }

    pub fn evaluate(
        &mut self,
        now: Duration,
        wall_clock_s: u32,
        capture_ts: DateTime<Utc>,
        tracks: &[LocalTrack],
        confidences: &HashMap<TrackId, f32>,
    ) -> Vec<AlarmEvent> {
        let mut events = Vec::new();

        for track in tracks {
            let center = track.latest_bbox().center();
            let mut candidates: Vec<Candidate> = Vec::new();

            for rule in &self.rules {
                if !rule.enabled {
                    continue;
                }
                let Some(roi) = self.rois.get(&rule.roi_id) else { continue };
                if !roi.is_active_at(wall_clock_s) {
                    continue;
                }
                self.stats.rules_evaluated += 1;

                let inside = roi.contains_point(center.0, center.1);
                let key = (rule.roi_id.clone(), track.track_id);
                let presence = self.presence.entry(key).or_insert_with(Presence::new);
                let crossed = presence.observe(inside, now, center);

                let satisfied = match rule.kind {
                    RuleKind::Intrusion => {
                        inside
                            && presence.duration_inside(now).is_some_and(|d| d.as_secs_f64() >= rule.min_duration_s)
                            && confidences.get(&track.track_id).copied().unwrap_or(0.0) >= rule.min_confidence
                    }
                    RuleKind::Loitering => {
                        inside
                            && presence.duration_inside(now).is_some_and(|d| d.as_secs_f64() >= rule.min_duration_s)
                            && presence.motion_variance().is_some_and(|v| v < self.config.loiter_variance_threshold)
                    }
                    RuleKind::ZoneEntry => crossed && inside,
                    RuleKind::ZoneExit => crossed && !inside,
                };

                if satisfied {
                    let start_key = roi.time_window.as_ref().map(|w| w.start_s).unwrap_or(u32::MAX);
                    candidates.push(Candidate { rule: rule.clone(), priority: roi.priority, start_key });
                }
            }

            if candidates.is_empty() {
                continue;
            }
            if candidates.len() > 1 {
                self.stats.conflicts_resolved += 1;
            }
            candidates.sort_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then_with(|| a.start_key.cmp(&b.start_key))
                    .then_with(|| a.rule.roi_id.cmp(&b.rule.roi_id))
            });
            let winner_priority = candidates[0].priority;
            let winner = candidates[0].rule.clone();

            let cooldown_key = (winner.rule_id.clone(), track.track_id);
            if let Some(last) = self.cooldowns.get(&cooldown_key) {
                if now.saturating_sub(*last).as_secs_f64() < self.config.cooldown_s {
                    self.stats.suppressed_cooldown += 1;
                    continue;
                }
            }
            self.cooldowns.insert(cooldown_key, now);
            self.stats.events_emitted += 1;

            events.push(AlarmEvent {
                event_id: uuid::Uuid::new_v4(),
                camera_id: self.camera_id.clone(),
                rule_id: winner.rule_id.clone(),
                kind: winner.kind,
                priority: winner_priority,
                capture_ts,
                payload: AlarmPayload {
                    track_id: Some(track.track_id),
                    roi_id: winner.roi_id.clone(),
                    global_id: track.suggested_global_id.clone(),
                    bounding_box: Some(track.latest_bbox()),
                    confidence: confidences.get(&track.track_id).copied(),
                },
                test_mode: false,
            });
        }

        events
    }
}
