//! Webhook payload shape

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::QueuedMessage;

/// Descriptions longer than this (in characters) go to the paste sink
pub const MAX_DESCRIPTION_CHARS: usize = 4000;

/// Body used when an oversized description could not be uploaded
pub const OVERSIZED_PLACEHOLDER: &str = "output too large to display";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub author: EmbedAuthor,
    pub title: String,
    pub description: String,
    pub color: u32,
    pub footer: EmbedFooter,
    /// RFC 3339 event time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// "<process> - <Kind Label>"
pub fn title_for(msg: &QueuedMessage) -> String {
    format!("{} - {}", msg.name, msg.kind.label())
}

/// Wrap a description in a preformatted block
pub fn code_block(description: &str) -> String {
    format!("```\n{}\n```", description)
}

pub fn is_oversized(description: &str) -> bool {
    description.chars().count() > MAX_DESCRIPTION_CHARS
}

/// Build the embed for a message with an already-resolved body
pub fn embed_for(msg: &QueuedMessage, body: String, host: &str) -> Embed {
    let when = DateTime::<Utc>::from_timestamp(msg.timestamp, 0);
    Embed {
        author: EmbedAuthor { name: host.to_string() },
        title: title_for(msg),
        description: body,
        color: msg.kind.color(),
        footer: EmbedFooter {
            text: when
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| msg.timestamp.to_string()),
        },
        timestamp: when.map(|t| t.to_rfc3339()),
    }
}
