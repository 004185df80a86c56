//! Notification delivery
//!
//! - [`payload`] - webhook JSON shape and formatting helpers
//! - [`transport`] - [`WebhookTransport`] trait and the reqwest implementation
//! - [`paste`] - [`PasteSink`] trait for oversized descriptions
//! - [`Dispatcher`] - resolves destination, builds the payload, sends it

mod dispatcher;
pub mod paste;
pub mod payload;
pub mod transport;

pub use dispatcher::{DispatchCounts, DispatchOutcome, Dispatcher, local_hostname};
pub use paste::{HttpPasteSink, PasteResponse, PasteSink};
pub use payload::{Embed, EmbedAuthor, EmbedFooter, MAX_DESCRIPTION_CHARS, OVERSIZED_PLACEHOLDER, WebhookPayload};
pub use transport::{ACCEPTED_STATUS, HttpTransport, TransportResponse, WebhookTransport};

#[cfg(test)]
pub mod mock {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tracing::debug;

    use super::*;
    use crate::error::RelayError;

    /// Records every post and answers with a fixed status (or fails)
    pub struct MockTransport {
        status: Option<u16>,
        calls: Mutex<Vec<(String, WebhookPayload)>>,
    }

    impl MockTransport {
        pub fn accepting() -> Self {
            Self::with_status(204)
        }

        pub fn with_status(status: u16) -> Self {
            Self {
                status: Some(status),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                status: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<(String, WebhookPayload)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WebhookTransport for MockTransport {
        async fn post(&self, url: &str, payload: &WebhookPayload) -> Result<TransportResponse, RelayError> {
            debug!(%url, "MockTransport::post: called");
            self.calls.lock().unwrap().push((url.to_string(), payload.clone()));
            match self.status {
                Some(status) => Ok(TransportResponse {
                    status,
                    body: String::new(),
                }),
                None => Err(RelayError::Transport("connection refused".to_string())),
            }
        }
    }

    /// Records uploads and returns a fixed link (or fails)
    pub struct MockPasteSink {
        url: Option<String>,
        uploads: Mutex<Vec<(String, String)>>,
    }

    impl MockPasteSink {
        pub fn returning(url: &str) -> Self {
            Self {
                url: Some(url.to_string()),
                uploads: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                url: None,
                uploads: Mutex::new(Vec::new()),
            }
        }

        pub fn uploads(&self) -> Vec<(String, String)> {
            self.uploads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PasteSink for MockPasteSink {
        async fn upload(&self, text: &str, language: &str) -> Result<String, RelayError> {
            self.uploads.lock().unwrap().push((text.to_string(), language.to_string()));
            PasteResponse {
                status: self.url.is_some(),
                url: self.url.clone(),
            }
            .into_url()
        }
    }
}
