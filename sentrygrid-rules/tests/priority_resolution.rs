use chrono::Utc;
use sentrygrid_rules::{RuleEngine, RuleEngineConfig};
use sentrygrid_types::{BBox, CameraId, ClassId, Rule, RuleKind, TimeWindow, TrackId, Vertex, ROI};
use std::collections::HashMap;
use std::time::Duration;

fn square(id: &str, priority: u8, time_window: Option<TimeWindow>) -> ROI {
    ROI::new(
        id,
        vec![
            Vertex { x: 0.0, y: 0.0 },
            Vertex { x: 100.0, y: 0.0 },
            Vertex { x: 100.0, y: 100.0 },
            Vertex { x: 0.0, y: 100.0 },
        ],
        priority,
        time_window,
        true,
    )
    .unwrap()
}

#[test]
fn higher_priority_roi_wins_when_both_active() {
    let mut engine = RuleEngine::new(CameraId::new("cam1").unwrap(), RuleEngineConfig::default());

    engine.put_roi(square("roi-a", 5, None));
    engine.put_roi(square("roi-b", 3, Some(TimeWindow { start_s: 9 * 3600, end_s: 17 * 3600 })));

    engine.put_rule(Rule {
        rule_id: "rule-a".into(),
        kind: RuleKind::Intrusion,
        roi_id: "roi-a".into(),
        min_duration_s: 0.0,
        min_confidence: 0.0,
        enabled: true,
    });
    engine.put_rule(Rule {
        rule_id: "rule-b".into(),
        kind: RuleKind::Intrusion,
        roi_id: "roi-b".into(),
        min_duration_s: 0.0,
        min_confidence: 0.0,
        enabled: true,
    });

    let track = sentrygrid_types::LocalTrack::new(
        TrackId(1),
        ClassId(0),
        BBox { x: 45, y: 45, w: 10, h: 10 },
        0,
        16,
    );
    let mut confidences = HashMap::new();
    confidences.insert(TrackId(1), 1.0_f32);

    let events = engine.evaluate(Duration::from_secs(0), 10 * 3600, Utc::now(), &[track], &confidences);

    assert_eq!(events.len(), 1, "exactly one event for the (track, frame) pair");
    assert_eq!(events[0].rule_id, "rule-a");
    assert_eq!(events[0].priority, 5);
    assert_eq!(engine.stats().conflicts_resolved, 1);
}

#[test]
fn cooldown_suppresses_repeat_within_window() {
    let mut engine = RuleEngine::new(CameraId::new("cam1").unwrap(), RuleEngineConfig { cooldown_s: 10.0, loiter_variance_threshold: 25.0 });
    engine.put_roi(square("roi-a", 5, None));
    engine.put_rule(Rule {
        rule_id: "rule-a".into(),
        kind: RuleKind::Intrusion,
        roi_id: "roi-a".into(),
        min_duration_s: 0.0,
        min_confidence: 0.0,
        enabled: true,
    });

    let track = sentrygrid_types::LocalTrack::new(TrackId(1), ClassId(0), BBox { x: 45, y: 45, w: 10, h: 10 }, 0, 16);
    let mut confidences = HashMap::new();
    confidences.insert(TrackId(1), 1.0_f32);

    let first = engine.evaluate(Duration::from_secs(0), 0, Utc::now(), &[track.clone()], &confidences);
    assert_eq!(first.len(), 1);

    let second = engine.evaluate(Duration::from_secs(1), 0, Utc::now(), &[track], &confidences);
    assert!(second.is_empty(), "repeat within cooldown must be suppressed");
    assert_eq!(engine.stats().suppressed_cooldown, 1);
}
