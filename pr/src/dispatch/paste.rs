//! Paste sink for oversized descriptions

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RelayError;

/// Uploads text and returns a link to it
#[async_trait]
pub trait PasteSink: Send + Sync {
    async fn upload(&self, text: &str, language: &str) -> Result<String, RelayError>;
}

#[derive(Debug, Serialize)]
struct PasteRequest<'a> {
    content: &'a str,
    language: &'a str,
}

/// Answer from the paste service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteResponse {
    pub status: bool,
    #[serde(default)]
    pub url: Option<String>,
}

impl PasteResponse {
    /// Decode a response body and extract the link
    pub fn parse(body: &str) -> Result<String, RelayError> {
        let parsed: PasteResponse = serde_json::from_str(body)?;
        parsed.into_url()
    }

    /// The link, if the upload succeeded
    pub fn into_url(self) -> Result<String, RelayError> {
        match (self.status, self.url) {
            (true, Some(url)) => Ok(url),
            (true, None) => Err(RelayError::Paste("service reported success without a url".to_string())),
            (false, _) => Err(RelayError::Paste("service reported failure".to_string())),
        }
    }
}

/// reqwest-backed paste sink posting `{content, language}` as JSON
pub struct HttpPasteSink {
    client: reqwest::Client,
    url: String,
}

impl HttpPasteSink {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        debug!(%url, "HttpPasteSink::new: called");
        let client = reqwest::Client::builder()
            .user_agent(concat!("procrelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client, url }
    }
}

#[async_trait]
impl PasteSink for HttpPasteSink {
    async fn upload(&self, text: &str, language: &str) -> Result<String, RelayError> {
        debug!(len = text.len(), %language, "HttpPasteSink::upload: called");
        let response = self
            .client
            .post(&self.url)
            .json(&PasteRequest { content: text, language })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            debug!(status, "HttpPasteSink::upload: error status");
            return Err(RelayError::Paste(format!("HTTP {}", status)));
        }

        let body = response.text().await?;
        PasteResponse::parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paste_response_success() {
        let resp: PasteResponse = serde_json::from_str(r#"{"status":true,"url":"https://paste.example/abc"}"#).unwrap();
        assert_eq!(resp.into_url().unwrap(), "https://paste.example/abc");
    }

    #[test]
    fn test_paste_response_failures() {
        let resp: PasteResponse = serde_json::from_str(r#"{"status":false}"#).unwrap();
        assert!(resp.into_url().is_err());

        let resp: PasteResponse = serde_json::from_str(r#"{"status":true}"#).unwrap();
        assert!(matches!(resp.into_url(), Err(RelayError::Paste(_))));
    }

    #[test]
    fn test_non_json_body_is_json_error() {
        let err = PasteResponse::parse("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, RelayError::Json(_)));

        let url = PasteResponse::parse(r#"{"status":true,"url":"https://paste.example/q"}"#).unwrap();
        assert_eq!(url, "https://paste.example/q");
    }

    #[test]
    fn test_paste_request_shape() {
        let body = serde_json::to_value(PasteRequest {
            content: "big",
            language: "text",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"content": "big", "language": "text"}));
    }
}
