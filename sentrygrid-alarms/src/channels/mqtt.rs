use crate::error::{AlarmError, Result};
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use sentrygrid_types::{MqttChannelTarget, WireAlarmEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn qos_from_u8(qos: u8) -> QoS {
    match qos {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::ExactlyOnce,
    }
}

/// Publishes to a broker over a persistent connection. A background task
/// drives the event loop and tracks connectivity; `send` refuses to
/// publish while disconnected rather than letting `rumqttc` queue the
/// message indefinitely against a broker that may never come back.
pub struct MqttAlarmChannel {
    client: AsyncClient,
    target: MqttChannelTarget,
    connected: Arc<AtomicBool>,
}

impl MqttAlarmChannel {
    pub fn new(target: MqttChannelTarget) -> Self {
        let client_id = format!("sentrygrid-alarms-{}", uuid::Uuid::new_v4());
        let mut options = MqttOptions::new(client_id, target.broker.clone(), target.port);
        options.set_keep_alive(Duration::from_secs(target.keepalive_s as u64));
        if let Some(username) = &target.username {
            options.set_credentials(username.clone(), target.password.clone().unwrap_or_default());
        }

        let (client, mut eventloop) = AsyncClient::new(options, 64);
        let connected = Arc::new(AtomicBool::new(false));
        let connected_bg = connected.clone();

        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                        connected_bg.store(true, Ordering::Relaxed);
                    }
                    Ok(Event::Incoming(Incoming::Disconnect)) => {
                        connected_bg.store(false, Ordering::Relaxed);
                    }
                    Err(_) => {
                        connected_bg.store(false, Ordering::Relaxed);
                        tokio::time::sleep(Duration::from_millis(500)).await;
                    }
                    Ok(_) => {}
                }
            }
        });

        Self { client, target, connected }
    }

    pub async fn send(&self, event: &WireAlarmEvent) -> Result<()> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(AlarmError::MqttNotConnected);
        }
        let payload = serde_json::to_vec(event)?;
        self.client
            .publish(self.target.topic.clone(), qos_from_u8(self.target.qos), false, payload)
            .await?;
        Ok(())
    }
}
