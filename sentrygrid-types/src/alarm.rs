use crate::camera::CameraId;
use crate::frame::BBox;
use crate::rule::RuleKind;
use crate::track::{GlobalId, TrackId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlarmPayload {
    pub track_id: Option<TrackId>,
    pub roi_id: String,
    pub global_id: Option<GlobalId>,
    pub bounding_box: Option<BBox>,
    pub confidence: Option<f32>,
}

/// Immutable once emitted: every field is set at construction and never
/// mutated; delivery state lives in `sentrygrid-alarms`, not here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlarmEvent {
    pub event_id: uuid::Uuid,
    pub camera_id: CameraId,
    pub rule_id: String,
    pub kind: RuleKind,
    pub priority: u8,
    pub capture_ts: DateTime<Utc>,
    pub payload: AlarmPayload,
    pub test_mode: bool,
}

/// The on-wire JSON shape, kept as a distinct type from [`AlarmEvent`] so
/// additive wire fields never force a breaking change to the in-process
/// type.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WireAlarmEvent {
    pub event_id: String,
    pub event_type: String,
    pub camera_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub priority: u8,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_id: Option<String>,
    pub test_mode: bool,
}

fn event_type_name(kind: RuleKind) -> &'static str {
    match kind {
        RuleKind::Intrusion => "intrusion",
        RuleKind::Loitering => "loitering",
        RuleKind::ZoneEntry => "zone_entry",
        RuleKind::ZoneExit => "zone_exit",
    }
}

impl From<&AlarmEvent> for WireAlarmEvent {
    fn from(e: &AlarmEvent) -> Self {
        WireAlarmEvent {
            event_id: e.event_id.to_string(),
            event_type: event_type_name(e.kind).to_string(),
            camera_id: e.camera_id.as_str().to_string(),
            rule_id: Some(e.rule_id.clone()),
            priority: e.priority,
            timestamp: e.capture_ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            bounding_box: e.payload.bounding_box,
            confidence: e.payload.confidence,
            track_id: e.payload.track_id.map(|t| t.0),
            global_id: e.payload.global_id.as_ref().map(|g| g.0.clone()),
            test_mode: e.test_mode,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpChannelTarget {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub timeout_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSocketChannelTarget {
    pub port: u16,
    pub ping_interval_ms: u64,
    /// Whether a push with zero connected clients should count as success.
    pub allow_fanout_zero: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttChannelTarget {
    pub broker: String,
    pub port: u16,
    pub topic: String,
    pub qos: u8,
    pub keepalive_s: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AlarmChannelKind {
    Http(HttpChannelTarget),
    WebSocket(WebSocketChannelTarget),
    Mqtt(MqttChannelTarget),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmChannelConfig {
    pub id: String,
    pub enabled: bool,
    pub priority: u8,
    pub kind: AlarmChannelKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_event_uses_snake_case_type_names() {
        let e = AlarmEvent {
            event_id: uuid::Uuid::nil(),
            camera_id: CameraId::new("cam1").unwrap(),
            rule_id: "r1".into(),
            kind: RuleKind::ZoneEntry,
            priority: 3,
            capture_ts: Utc::now(),
            payload: AlarmPayload {
                track_id: Some(TrackId(5)),
                roi_id: "roi1".into(),
                global_id: None,
                bounding_box: None,
                confidence: Some(0.9),
            },
            test_mode: false,
        };
        let wire: WireAlarmEvent = (&e).into();
        assert_eq!(wire.event_type, "zone_entry");
        assert_eq!(wire.track_id, Some(5));
        let json = serde_json::to_string(&wire).unwrap();
        assert!(json.contains("\"event_type\":\"zone_entry\""));
        assert!(!json.contains("global_id"));
    }
}
