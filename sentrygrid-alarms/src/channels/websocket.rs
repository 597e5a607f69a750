use crate::error::{AlarmError, Result};
use futures::{SinkExt, StreamExt};
use sentrygrid_types::{WebSocketChannelTarget, WireAlarmEvent};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

type ClientTx = mpsc::UnboundedSender<Message>;

/// Fans an event out to every client currently connected to this channel's
/// listener socket. A background accept loop registers new connections; a
/// per-client task owns the actual websocket sink so `send` only has to
/// push onto a channel and see whether the client is still around to read
/// it.
pub struct WebSocketAlarmChannel {
    clients: Arc<parking_lot::Mutex<Vec<ClientTx>>>,
    target: WebSocketChannelTarget,
}

impl WebSocketAlarmChannel {
    pub async fn new(target: WebSocketChannelTarget) -> std::io::Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", target.port)).await?;
        let clients: Arc<parking_lot::Mutex<Vec<ClientTx>>> = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let clients_for_accept = clients.clone();

        tokio::spawn(async move {
            loop {
                let Ok((stream, _addr)) = listener.accept().await else {
                    break;
                };
                let clients = clients_for_accept.clone();
                tokio::spawn(async move {
                    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    let (mut sink, mut stream) = ws.split();
                    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
                    clients.lock().push(tx);

                    loop {
                        tokio::select! {
                            outgoing = rx.recv() => {
                                match outgoing {
                                    Some(msg) if sink.send(msg).await.is_ok() => {}
                                    _ => break,
                                }
                            }
                            incoming = stream.next() => {
                                if incoming.is_none() {
                                    break;
                                }
                            }
                        }
                    }
                });
            }
        });

        Ok(Self { clients, target })
    }

    pub async fn send(&self, event: &WireAlarmEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        let message = Message::text(payload);

        let senders: Vec<ClientTx> = {
            let mut guard = self.clients.lock();
            guard.retain(|tx| !tx.is_closed());
            guard.clone()
        };

        let acked = senders.iter().filter(|tx| tx.send(message.clone()).is_ok()).count();

        if acked > 0 || self.target.allow_fanout_zero {
            Ok(())
        } else {
            Err(AlarmError::WebSocketNoClients)
        }
    }
}
