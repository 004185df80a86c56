//! Message -> webhook delivery

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error, warn};

use super::paste::PasteSink;
use super::payload::{OVERSIZED_PLACEHOLDER, WebhookPayload, code_block, embed_for, is_oversized};
use super::transport::WebhookTransport;
use crate::config::RelayConfig;
use crate::domain::QueuedMessage;
use crate::error::RelayError;

/// Result of one send; never an error, failures are logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Webhook answered with an accepted status
    Sent,
    /// No destination configured for the kind
    Skipped,
    /// Webhook answered with some other status
    Rejected { status: u16 },
    /// Transport error
    Failed(String),
}

/// Dispatcher counters snapshot
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchCounts {
    pub sent: u64,
    pub skipped: u64,
    pub rejected: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct DispatchStats {
    sent: AtomicU64,
    skipped: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

/// Hostname for the embed author, or "unknown-host"
pub fn local_hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown-host".to_string())
}

/// Formats messages and posts them to their destination
pub struct Dispatcher {
    config: Arc<RelayConfig>,
    transport: Arc<dyn WebhookTransport>,
    paste: Option<Arc<dyn PasteSink>>,
    paste_language: String,
    host: String,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(config: Arc<RelayConfig>, transport: Arc<dyn WebhookTransport>) -> Self {
        debug!("Dispatcher::new: called");
        Self {
            config,
            transport,
            paste: None,
            paste_language: "text".to_string(),
            host: local_hostname(),
            stats: DispatchStats::default(),
        }
    }

    /// Route oversized descriptions through a paste sink
    pub fn with_paste(mut self, paste: Arc<dyn PasteSink>, language: impl Into<String>) -> Self {
        self.paste = Some(paste);
        self.paste_language = language.into();
        self
    }

    /// Override the host shown as embed author
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn counts(&self) -> DispatchCounts {
        DispatchCounts {
            sent: self.stats.sent.load(Ordering::Relaxed),
            skipped: self.stats.skipped.load(Ordering::Relaxed),
            rejected: self.stats.rejected.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        }
    }

    /// Body text: the description in a code block, or a paste link when too long
    pub async fn body_for(&self, description: &str) -> String {
        if !is_oversized(description) {
            return code_block(description);
        }

        let Some(paste) = &self.paste else {
            debug!("Dispatcher::body_for: oversized, no paste sink configured");
            return OVERSIZED_PLACEHOLDER.to_string();
        };

        match paste.upload(description, &self.paste_language).await {
            Ok(url) => {
                debug!(%url, "Dispatcher::body_for: uploaded oversized description");
                url
            }
            Err(e) => {
                warn!(error = %e, "Paste upload failed, using placeholder");
                OVERSIZED_PLACEHOLDER.to_string()
            }
        }
    }

    pub async fn build_payload(&self, msg: &QueuedMessage) -> WebhookPayload {
        let body = self.body_for(&msg.description).await;
        WebhookPayload {
            username: self.config.username.clone(),
            avatar_url: self.config.avatar_url.clone(),
            embeds: vec![embed_for(msg, body, &self.host)],
        }
    }

    /// Deliver one message, logging rather than returning failures
    pub async fn send(&self, msg: &QueuedMessage) -> DispatchOutcome {
        debug!(name = %msg.name, kind = %msg.kind, "Dispatcher::send: called");

        let Some(url) = self.config.webhook_for(&msg.kind) else {
            debug!(kind = %msg.kind, "Dispatcher::send: no destination, skipping");
            self.stats.skipped.fetch_add(1, Ordering::Relaxed);
            return DispatchOutcome::Skipped;
        };

        let payload = self.build_payload(msg).await;
        match self.transport.post(url, &payload).await {
            Ok(response) if response.is_accepted() => {
                debug!(status = response.status, "Dispatcher::send: delivered");
                self.stats.sent.fetch_add(1, Ordering::Relaxed);
                DispatchOutcome::Sent
            }
            Ok(response) => {
                let err = RelayError::Status {
                    status: response.status,
                    body: response.body,
                };
                error!(error = %err, kind = %msg.kind, "Webhook rejected notification");
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                DispatchOutcome::Rejected {
                    status: response.status,
                }
            }
            Err(e) => {
                error!(error = %e, kind = %msg.kind, "Webhook transport failed");
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                DispatchOutcome::Failed(e.to_string())
            }
        }
    }
}
