//! JSON-RPC protocol handling for the native peer channel
//!
//! The host wraps every message in `[...]` for resilience against stray
//! output on the shared pipe; this module accepts both bracketed and bare
//! JSON lines.

use serde::{Deserialize, Serialize};

use mirrorview_core::PeerMessage;

/// Strip the outer brackets from a peer message line
///
/// Returns the inner content if brackets are present.
pub(crate) fn strip_brackets(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        Some(&trimmed[1..trimmed.len() - 1])
    } else {
        None
    }
}

/// A raw peer message (before parsing into typed events)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawMessage {
    /// A response to a request we sent
    Response {
        id: serde_json::Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<serde_json::Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<serde_json::Value>,
    },
    /// An event from the peer (unsolicited)
    Event {
        event: String,
        params: serde_json::Value,
    },
}

impl RawMessage {
    /// Parse a JSON string into a RawMessage
    pub fn parse(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }
}

/// Parses a JSON-RPC message from the peer channel.
///
/// # Arguments
/// * `line` - Line from the peer channel (may or may not have brackets)
///
/// # Returns
/// * `Some(PeerMessage)` if valid JSON-RPC
/// * `None` if parsing fails
pub fn parse_peer_message(line: &str) -> Option<PeerMessage> {
    // Strip brackets if present, otherwise use line as-is
    let json = strip_brackets(line).unwrap_or(line);

    let raw = RawMessage::parse(json)?;
    match raw {
        RawMessage::Event { event, params } => Some(parse_event(&event, params)),
        RawMessage::Response { id, result, error } => {
            Some(PeerMessage::Response { id, result, error })
        }
    }
}

/// Parse an event by name and parameters
fn parse_event(event: &str, params: serde_json::Value) -> PeerMessage {
    match event {
        "selectionChanged" => serde_json::from_value(params.clone())
            .map(PeerMessage::SelectionChanged)
            .unwrap_or_else(|_| unknown_event(event, params)),
        "searchTextChanged" => serde_json::from_value(params.clone())
            .map(PeerMessage::SearchTextChanged)
            .unwrap_or_else(|_| unknown_event(event, params)),
        "searchActiveChanged" => serde_json::from_value(params.clone())
            .map(PeerMessage::SearchActiveChanged)
            .unwrap_or_else(|_| unknown_event(event, params)),
        "searchSubmitted" => serde_json::from_value(params.clone())
            .map(PeerMessage::SearchSubmitted)
            .unwrap_or_else(|_| unknown_event(event, params)),
        "contentAppeared" => serde_json::from_value(params.clone())
            .map(PeerMessage::ContentAppeared)
            .unwrap_or_else(|_| unknown_event(event, params)),
        _ => unknown_event(event, params),
    }
}

/// Create an unknown event fallback
fn unknown_event(event: &str, params: serde_json::Value) -> PeerMessage {
    PeerMessage::UnknownEvent {
        event: event.to_string(),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_brackets_valid() {
        assert_eq!(
            strip_brackets(r#"[{"event":"test"}]"#),
            Some(r#"{"event":"test"}"#)
        );
    }

    #[test]
    fn test_strip_brackets_whitespace() {
        assert_eq!(strip_brackets("  [content]  "), Some("content"));
    }

    #[test]
    fn test_strip_brackets_invalid() {
        assert_eq!(strip_brackets("no brackets"), None);
        assert_eq!(strip_brackets("[missing end"), None);
        assert_eq!(strip_brackets("missing start]"), None);
    }

    #[test]
    fn test_parse_selection_changed() {
        let json = r#"{"event":"selectionChanged","params":{"index":2}}"#;
        let msg = parse_peer_message(json).unwrap();
        assert!(matches!(msg, PeerMessage::SelectionChanged(_)));
        if let PeerMessage::SelectionChanged(e) = msg {
            assert_eq!(e.index, 2);
        }
    }

    #[test]
    fn test_parse_search_text_changed() {
        let json = r#"[{"event":"searchTextChanged","params":{"text":"hel"}}]"#;
        let msg = parse_peer_message(json).unwrap();
        if let PeerMessage::SearchTextChanged(e) = msg {
            assert_eq!(e.text, "hel");
        } else {
            panic!("Expected SearchTextChanged");
        }
    }

    #[test]
    fn test_parse_search_active_changed() {
        let json = r#"{"event":"searchActiveChanged","params":{"active":true}}"#;
        let msg = parse_peer_message(json).unwrap();
        if let PeerMessage::SearchActiveChanged(e) = msg {
            assert!(e.active);
        } else {
            panic!("Expected SearchActiveChanged");
        }
    }

    #[test]
    fn test_parse_search_submitted() {
        let json = r#"{"event":"searchSubmitted","params":{"text":"query"}}"#;
        let msg = parse_peer_message(json).unwrap();
        assert!(matches!(msg, PeerMessage::SearchSubmitted(_)));
    }

    #[test]
    fn test_parse_content_appeared() {
        let json = r#"{"event":"contentAppeared","params":{"index":0}}"#;
        let msg = parse_peer_message(json).unwrap();
        assert!(matches!(msg, PeerMessage::ContentAppeared(_)));
    }

    #[test]
    fn test_parse_response_success() {
        let json = r#"{"id":1,"result":{"width":88.5,"height":44.0}}"#;
        let msg = parse_peer_message(json).unwrap();
        assert!(msg.is_response());
        assert!(!msg.is_error());
    }

    #[test]
    fn test_parse_response_error() {
        let json = r#"{"id":1,"error":"view disposed"}"#;
        let msg = parse_peer_message(json).unwrap();
        assert!(msg.is_error());
    }

    #[test]
    fn test_unknown_event_fallback() {
        let json = r#"{"event":"some.future.event","params":{"foo":"bar"}}"#;
        let msg = parse_peer_message(json).unwrap();
        assert!(matches!(msg, PeerMessage::UnknownEvent { .. }));
        if let PeerMessage::UnknownEvent { event, .. } = msg {
            assert_eq!(event, "some.future.event");
        }
    }

    #[test]
    fn test_malformed_event_fallback() {
        // selectionChanged missing required fields
        let json = r#"{"event":"selectionChanged","params":{"incomplete":true}}"#;
        let msg = parse_peer_message(json).unwrap();
        // Should fall back to UnknownEvent, not panic
        assert!(matches!(msg, PeerMessage::UnknownEvent { .. }));
    }

    #[test]
    fn test_invalid_json_returns_none() {
        assert!(parse_peer_message("not json").is_none());
        assert!(parse_peer_message("{incomplete").is_none());
    }
}
