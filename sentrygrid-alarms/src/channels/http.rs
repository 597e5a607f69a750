use crate::error::{AlarmError, Result};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use sentrygrid_types::{HttpChannelTarget, WireAlarmEvent};
use std::time::Duration;

/// Posts the wire event as JSON to a configured endpoint. Builds a fresh
/// client per send; the legacy client is a handle onto hyper's connector,
/// not a live connection, so there is nothing worth pooling across alarms.
pub struct HttpAlarmChannel {
    target: HttpChannelTarget,
}

impl HttpAlarmChannel {
    pub fn new(target: HttpChannelTarget) -> Self {
        Self { target }
    }

    pub async fn send(&self, event: &WireAlarmEvent) -> Result<()> {
        let body = serde_json::to_vec(event)?;
        let mut builder = http::Request::builder()
            .method(http::Method::POST)
            .uri(&self.target.url)
            .header(http::header::CONTENT_TYPE, "application/json");
        for (name, value) in &self.target.headers {
            builder = builder.header(name, value);
        }
        let request = builder
            .body(http_body_util::Full::new(bytes::Bytes::from(body)))
            .expect("well-formed request");

        let client = Client::builder(TokioExecutor::new()).build_http();
        let response = tokio::time::timeout(
            Duration::from_millis(self.target.timeout_ms),
            client.request(request),
        )
        .await
        .map_err(|_| AlarmError::HttpStatus(http::StatusCode::REQUEST_TIMEOUT))??;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AlarmError::HttpStatus(response.status()))
        }
    }
}
