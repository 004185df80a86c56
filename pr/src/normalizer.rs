//! Raw supervisor event -> queued message

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::RelayConfig;
use crate::domain::{QueuedMessage, now_secs};
use crate::source::RawEvent;

/// CSI, OSC and two-byte escape sequences
static ESCAPE_SEQUENCES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]")
        .expect("escape sequence pattern is valid")
});

/// Strip terminal escape sequences and stray control characters
///
/// Newlines and tabs survive; everything else below 0x20 (and DEL) goes.
pub fn sanitize(text: &str) -> String {
    ESCAPE_SEQUENCES
        .replace_all(text, "")
        .chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect()
}

/// Text form of a payload: strings verbatim, everything else as compact JSON
pub fn describe(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Applies self-exclusion, the process filter and kind toggles
pub struct EventNormalizer {
    config: Arc<RelayConfig>,
}

impl EventNormalizer {
    pub fn new(config: Arc<RelayConfig>) -> Self {
        debug!(name = %config.name, filter = ?config.process_filter, "EventNormalizer::new: called");
        Self { config }
    }

    /// Normalize with the current wall-clock second
    pub fn normalize(&self, event: RawEvent) -> Option<QueuedMessage> {
        self.normalize_at(event, now_secs())
    }

    /// Normalize with an explicit timestamp; None when the event is declined
    pub fn normalize_at(&self, event: RawEvent, timestamp: i64) -> Option<QueuedMessage> {
        debug!(process = %event.process_name, kind = %event.kind, "EventNormalizer::normalize_at: called");

        if event.process_name == self.config.name {
            debug!("EventNormalizer::normalize_at: own process, declining");
            return None;
        }

        if let Some(filter) = &self.config.process_filter {
            if *filter != event.process_name {
                debug!(%filter, "EventNormalizer::normalize_at: filtered out");
                return None;
            }
        }

        if !self.config.is_enabled(&event.kind) {
            debug!("EventNormalizer::normalize_at: kind disabled, declining");
            return None;
        }

        let text = match event.description {
            Some(description) => description,
            None => describe(&event.payload),
        };

        Some(QueuedMessage::new(event.process_name, event.kind, sanitize(&text), timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventSettings;
    use crate::domain::EventKind;
    use proptest::prelude::*;
    use serde_json::json;

    fn normalizer(f: impl FnOnce(&mut RelayConfig)) -> EventNormalizer {
        let mut config = RelayConfig::default();
        f(&mut config);
        EventNormalizer::new(Arc::new(config))
    }

    #[test]
    fn test_sanitize_strips_ansi() {
        assert_eq!(sanitize("\x1b[31mred\x1b[0m text"), "red text");
        assert_eq!(sanitize("\x1b]0;title\x07after"), "after");
        assert_eq!(sanitize("keep\nlines\tand tabs\r"), "keep\nlines\tand tabs");
        assert_eq!(sanitize("bell\x07 gone"), "bell gone");
    }

    #[test]
    fn test_describe_payloads() {
        assert_eq!(describe(&json!("plain")), "plain");
        assert_eq!(describe(&Value::Null), "");
        assert_eq!(describe(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(describe(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_normalize_produces_message() {
        let n = normalizer(|_| {});
        let event = RawEvent::new("api", EventKind::Error, json!("\x1b[31mfailed\x1b[0m"));
        let msg = n.normalize_at(event, 1_700_000_000).unwrap();

        assert_eq!(msg.name, "api");
        assert_eq!(msg.kind, EventKind::Error);
        assert_eq!(msg.description, "failed");
        assert_eq!(msg.timestamp, 1_700_000_000);
    }

    #[test]
    fn test_normalize_prefers_override_description() {
        let n = normalizer(|_| {});
        let mut event = RawEvent::new("api", EventKind::Restart, json!({"ignored": true}));
        event.description = Some("api restarted".to_string());
        assert_eq!(n.normalize_at(event, 1).unwrap().description, "api restarted");
    }

    #[test]
    fn test_normalize_excludes_own_process() {
        let n = normalizer(|c| c.name = "relay".to_string());
        assert!(n.normalize_at(RawEvent::new("relay", EventKind::Error, json!("x")), 1).is_none());
        assert!(n.normalize_at(RawEvent::new("api", EventKind::Error, json!("x")), 1).is_some());
    }

    #[test]
    fn test_normalize_applies_process_filter() {
        let n = normalizer(|c| c.process_filter = Some("api".to_string()));
        assert!(n.normalize_at(RawEvent::new("worker", EventKind::Error, json!("x")), 1).is_none());
        assert!(n.normalize_at(RawEvent::new("api", EventKind::Error, json!("x")), 1).is_some());
    }

    #[test]
    fn test_normalize_respects_toggles() {
        let n = normalizer(|_| {});
        assert!(n.normalize_at(RawEvent::new("api", EventKind::Log, json!("x")), 1).is_none());

        let n = normalizer(|c| {
            c.events.insert(
                EventKind::Log,
                EventSettings {
                    enabled: Some(true),
                    webhook: None,
                },
            );
        });
        assert!(n.normalize_at(RawEvent::new("api", EventKind::Log, json!("x")), 1).is_some());
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 .,:;!?/_-]{0,16}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_structured_payload_round_trips(payload in arb_json()) {
            prop_assume!(!payload.is_string() && !payload.is_null());
            let text = sanitize(&describe(&payload));
            let decoded: Value = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(decoded, payload);
        }
    }
}
