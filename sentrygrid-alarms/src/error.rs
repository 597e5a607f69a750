#[derive(thiserror::Error, Debug)]
pub enum AlarmError {
    #[error("http transport error: {0}")]
    Hyper(#[from] hyper::Error),
    #[error("http client error: {0}")]
    HyperClient(#[from] hyper_util::client::legacy::Error),
    #[error("http channel returned non-success status {0}")]
    HttpStatus(http::StatusCode),
    #[error("websocket fanout reached zero clients")]
    WebSocketNoClients,
    #[error("mqtt client is not connected to its broker")]
    MqttNotConnected,
    #[error("mqtt publish error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),
    #[error("failed to serialize alarm payload: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AlarmError>;
