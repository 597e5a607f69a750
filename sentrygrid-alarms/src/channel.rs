use crate::channels::http::HttpAlarmChannel;
use crate::channels::mqtt::MqttAlarmChannel;
use crate::channels::websocket::WebSocketAlarmChannel;
use crate::error::Result;
use sentrygrid_types::{AlarmChannelKind, WireAlarmEvent};

/// One outbound destination for alarm events, dispatched by matching on
/// the concrete kind rather than through a trait object — there are only
/// three transports and each needs its own connection-lifecycle state, so
/// static dispatch reads more plainly than `Box<dyn _>` plumbing.
pub enum ChannelImpl {
    Http(HttpAlarmChannel),
    WebSocket(WebSocketAlarmChannel),
    Mqtt(MqttAlarmChannel),
}

impl ChannelImpl {
    pub async fn send(&self, event: &WireAlarmEvent) -> Result<()> {
        match self {
            ChannelImpl::Http(c) => c.send(event).await,
            ChannelImpl::WebSocket(c) => c.send(event).await,
            ChannelImpl::Mqtt(c) => c.send(event).await,
        }
    }
}

pub async fn build_channel(kind: &AlarmChannelKind) -> std::io::Result<ChannelImpl> {
    Ok(match kind {
        AlarmChannelKind::Http(target) => ChannelImpl::Http(HttpAlarmChannel::new(target.clone())),
        AlarmChannelKind::WebSocket(target) => {
            ChannelImpl::WebSocket(WebSocketAlarmChannel::new(target.clone()).await?)
        }
        AlarmChannelKind::Mqtt(target) => ChannelImpl::Mqtt(MqttAlarmChannel::new(target.clone())),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    Delivered,
    Partial,
    Failed,
}
