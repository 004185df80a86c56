//! Webhook transport

use async_trait::async_trait;
use tracing::debug;

use super::payload::WebhookPayload;
use crate::error::RelayError;

/// Status codes the webhook answers with on success
pub const ACCEPTED_STATUS: [u16; 2] = [200, 204];

/// Raw answer from the webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_accepted(&self) -> bool {
        ACCEPTED_STATUS.contains(&self.status)
    }
}

/// Posts payloads to a webhook URL
///
/// Implementations only fail on transport problems; any HTTP answer,
/// successful or not, comes back as a [`TransportResponse`].
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post(&self, url: &str, payload: &WebhookPayload) -> Result<TransportResponse, RelayError>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        debug!("HttpTransport::new: called");
        let client = reqwest::Client::builder()
            .user_agent(concat!("procrelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self::with_client(client)
    }

    /// Transport over a preconfigured client (timeouts, proxies, ...)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn post(&self, url: &str, payload: &WebhookPayload) -> Result<TransportResponse, RelayError> {
        debug!(embeds = payload.embeds.len(), "HttpTransport::post: called");
        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        debug!(status, "HttpTransport::post: response received");
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_codes() {
        let ok = |status| TransportResponse {
            status,
            body: String::new(),
        };
        assert!(ok(200).is_accepted());
        assert!(ok(204).is_accepted());
        assert!(!ok(201).is_accepted());
        assert!(!ok(429).is_accepted());
        assert!(!ok(500).is_accepted());
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = HttpTransport::with_client(reqwest::Client::new());
        let payload = WebhookPayload {
            username: "PM2".to_string(),
            avatar_url: None,
            embeds: Vec::new(),
        };
        let result = transport.post(&format!("http://127.0.0.1:{}/hook", port), &payload).await;
        assert!(matches!(result, Err(RelayError::Network(_))));
    }
}
