//! Event kinds relayed from the supervisor

use serde::{Deserialize, Serialize};

/// Embed color used when a kind has no entry of its own
pub const DEFAULT_COLOR: u32 = 0x607D8B;

/// Kind of a supervisor event
///
/// Known supervisor events get a dedicated variant. Anything else the bus
/// produces lands in `Other` so it still flows through the same lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Log,
    Error,
    Exception,
    Kill,
    Restart,
    RestartOverlimit,
    Delete,
    Stop,
    Exit,
    Start,
    Online,
    /// Synthetic kind emitted by the relay itself on queue overflow
    Suppressed,
    Other(String),
}

impl EventKind {
    /// Canonical config/wire name (kebab-case)
    pub fn as_str(&self) -> &str {
        match self {
            Self::Log => "log",
            Self::Error => "error",
            Self::Exception => "exception",
            Self::Kill => "kill",
            Self::Restart => "restart",
            Self::RestartOverlimit => "restart-overlimit",
            Self::Delete => "delete",
            Self::Stop => "stop",
            Self::Exit => "exit",
            Self::Start => "start",
            Self::Online => "online",
            Self::Suppressed => "suppressed",
            Self::Other(name) => name,
        }
    }

    /// Human-readable, proper-cased label ("Restart Overlimit")
    pub fn label(&self) -> String {
        self.as_str()
            .split(['-', '_', ' '])
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }

    /// Embed color for this kind
    pub fn color(&self) -> u32 {
        match self {
            Self::Log => 0x3498DB,
            Self::Error => 0xE74C3C,
            Self::Exception => 0xC0392B,
            Self::Kill => 0x992D22,
            Self::Restart => 0xF1C40F,
            Self::RestartOverlimit => 0xE67E22,
            Self::Delete => 0x95A5A6,
            Self::Stop => 0x7F8C8D,
            Self::Exit => 0xD35400,
            Self::Start => 0x2ECC71,
            Self::Online => 0x1ABC9C,
            Self::Suppressed => 0x9B59B6,
            Self::Other(_) => DEFAULT_COLOR,
        }
    }

    /// Whether the kind is enqueued when the config says nothing about it
    ///
    /// Log lines are opt-in. Unknown kinds only flow when listed explicitly.
    pub fn enabled_by_default(&self) -> bool {
        !matches!(self, Self::Log | Self::Other(_))
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "log" => Self::Log,
            "error" => Self::Error,
            "exception" => Self::Exception,
            "kill" => Self::Kill,
            "restart" => Self::Restart,
            "restart-overlimit" => Self::RestartOverlimit,
            "delete" => Self::Delete,
            "stop" => Self::Stop,
            "exit" => Self::Exit,
            "start" => Self::Start,
            "online" => Self::Online,
            "suppressed" => Self::Suppressed,
            _ => Self::Other(normalized),
        }
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        assert_eq!(EventKind::from("log"), EventKind::Log);
        assert_eq!(EventKind::from("ERROR"), EventKind::Error);
        assert_eq!(EventKind::from("restart overlimit"), EventKind::RestartOverlimit);
        assert_eq!(EventKind::from("restart_overlimit"), EventKind::RestartOverlimit);
    }

    #[test]
    fn test_parse_unknown_kind() {
        assert_eq!(EventKind::from("Reload Done"), EventKind::Other("reload-done".to_string()));
    }

    #[test]
    fn test_labels_are_proper_cased() {
        assert_eq!(EventKind::Log.label(), "Log");
        assert_eq!(EventKind::RestartOverlimit.label(), "Restart Overlimit");
        assert_eq!(EventKind::Other("reload-done".to_string()).label(), "Reload Done");
    }

    #[test]
    fn test_unknown_kind_uses_default_color() {
        assert_eq!(EventKind::Other("x".to_string()).color(), DEFAULT_COLOR);
        assert_ne!(EventKind::Error.color(), DEFAULT_COLOR);
    }

    #[test]
    fn test_default_toggles() {
        assert!(!EventKind::Log.enabled_by_default());
        assert!(!EventKind::Other("x".to_string()).enabled_by_default());
        assert!(EventKind::Error.enabled_by_default());
        assert!(EventKind::Kill.enabled_by_default());
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&EventKind::RestartOverlimit).unwrap();
        assert_eq!(json, "\"restart-overlimit\"");

        let kind: EventKind = serde_json::from_str("\"online\"").unwrap();
        assert_eq!(kind, EventKind::Online);
    }
}
