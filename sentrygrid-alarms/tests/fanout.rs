use sentrygrid_alarms::{AlarmRouter, AlarmRouterConfig, Disposition};
use sentrygrid_types::{
    AlarmChannelConfig, AlarmChannelKind, AlarmEvent, AlarmPayload, CameraId, HttpChannelTarget,
    MqttChannelTarget, RuleKind, WebSocketChannelTarget,
};

async fn spawn_ok_http_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = axum::Router::new().route("/alarm", axum::routing::post(|| async { axum::http::StatusCode::OK }));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/alarm")
}

fn test_event() -> AlarmEvent {
    AlarmEvent {
        event_id: uuid::Uuid::new_v4(),
        camera_id: CameraId::new("cam1").unwrap(),
        rule_id: "rule1".into(),
        kind: RuleKind::Intrusion,
        priority: 9,
        capture_ts: chrono::Utc::now(),
        payload: AlarmPayload { track_id: None, roi_id: "roi1".into(), global_id: None, bounding_box: None, confidence: None },
        test_mode: true,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn one_ok_one_broker_down_one_empty_fanout_is_partial() {
    let http_url = spawn_ok_http_server().await;

    let configs = vec![
        AlarmChannelConfig {
            id: "http-ok".into(),
            enabled: true,
            priority: 5,
            kind: AlarmChannelKind::Http(HttpChannelTarget { url: http_url, headers: vec![], timeout_ms: 500 }),
        },
        AlarmChannelConfig {
            id: "mqtt-down".into(),
            enabled: true,
            priority: 5,
            kind: AlarmChannelKind::Mqtt(MqttChannelTarget {
                broker: "127.0.0.1".into(),
                port: 19999,
                topic: "sentrygrid/alarms".into(),
                qos: 0,
                keepalive_s: 5,
                username: None,
                password: None,
            }),
        },
        AlarmChannelConfig {
            id: "ws-empty".into(),
            enabled: true,
            priority: 5,
            kind: AlarmChannelKind::WebSocket(WebSocketChannelTarget {
                port: 0,
                ping_interval_ms: 1000,
                allow_fanout_zero: false,
            }),
        },
    ];

    // Keep retries from stretching this test out: the broker-down and
    // empty-fanout channels cannot succeed no matter how long we wait.
    let router = AlarmRouter::new(
        &configs,
        AlarmRouterConfig { workers: 1, retry_max: 0, backoff_base_ms: 1, backoff_max_ms: 1 },
    )
    .await
    .unwrap();

    let outcome = router.test_fire(test_event()).await;

    assert_eq!(outcome.delivered.len(), 1, "delivered: {:?}", outcome.delivered);
    assert_eq!(outcome.failed.len(), 2, "failed: {:?}", outcome.failed);
    assert_eq!(outcome.disposition, Disposition::Partial);
    assert!(outcome.delivered.contains(&"http-ok".to_string()));
    assert!(outcome.failed.contains(&"mqtt-down".to_string()));
    assert!(outcome.failed.contains(&"ws-empty".to_string()));
}
