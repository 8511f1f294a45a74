//! Inbound peer event definitions
//!
//! The native peer reports user interaction back over its channel as named
//! events with camelCase JSON params. Parsing from the wire lives in the
//! channel crate; the typed shapes live here so every crate can consume
//! them without a channel dependency.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────
// Event Structs
// ─────────────────────────────────────────────────────────

/// The peer's selection moved (user tap or native-side transition)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionChanged {
    pub index: usize,
}

/// Text typed into the native search field
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTextChanged {
    pub text: String,
}

/// Native search affordance expanded or collapsed
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchActiveChanged {
    pub active: bool,
}

/// Search submitted (keyboard return)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSubmitted {
    pub text: String,
}

/// An item's content finished appearing on screen
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAppeared {
    pub index: usize,
}

// ─────────────────────────────────────────────────────────
// PeerMessage Enum
// ─────────────────────────────────────────────────────────

/// Fully typed message from the peer channel
#[derive(Debug, Clone)]
pub enum PeerMessage {
    // Interaction events
    SelectionChanged(SelectionChanged),
    SearchTextChanged(SearchTextChanged),
    SearchActiveChanged(SearchActiveChanged),
    SearchSubmitted(SearchSubmitted),
    ContentAppeared(ContentAppeared),

    // Responses to requests we sent
    Response {
        id: serde_json::Value,
        result: Option<serde_json::Value>,
        error: Option<serde_json::Value>,
    },

    // Fallback for unknown events
    UnknownEvent {
        event: String,
        params: serde_json::Value,
    },
}

impl PeerMessage {
    /// Check if this is a response (routed to the request tracker, not the
    /// event stream)
    pub fn is_response(&self) -> bool {
        matches!(self, PeerMessage::Response { .. })
    }

    /// Check if this message carries an error
    pub fn is_error(&self) -> bool {
        matches!(self, PeerMessage::Response { error: Some(_), .. })
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        match self {
            PeerMessage::SelectionChanged(e) => format!("selection -> {}", e.index),
            PeerMessage::SearchTextChanged(e) => format!("search text ({} chars)", e.text.len()),
            PeerMessage::SearchActiveChanged(e) => {
                if e.active {
                    "search activated".to_string()
                } else {
                    "search deactivated".to_string()
                }
            }
            PeerMessage::SearchSubmitted(e) => format!("search submitted ({} chars)", e.text.len()),
            PeerMessage::ContentAppeared(e) => format!("content appeared at {}", e.index),
            PeerMessage::Response { id, error, .. } => {
                if error.is_some() {
                    format!("Response #{}: error", id)
                } else {
                    format!("Response #{}: ok", id)
                }
            }
            PeerMessage::UnknownEvent { event, .. } => format!("Event: {}", event),
        }
    }
}

/// An interaction event delivered through a peer handle's event stream,
/// stamped at receive time
#[derive(Debug, Clone)]
pub struct PeerEvent {
    pub message: PeerMessage,
    pub received_at: DateTime<Local>,
}

impl PeerEvent {
    pub fn now(message: PeerMessage) -> Self {
        Self {
            message,
            received_at: Local::now(),
        }
    }
}
