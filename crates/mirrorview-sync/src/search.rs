//! Search affordance state machine
//!
//! One transition function serves both backends: [`SearchCore`] owns the
//! canonical `SearchSnapshot` and is parameterized over a [`SearchEffector`]
//! that mirrors transitions onto the rendition (native peer calls, or local
//! bookkeeping for the emulated backend). The core is the *single* mutator
//! of search state; peer events and program calls both funnel through it.
//!
//! Echo handling is equality-gated last-write-wins: a peer event that
//! matches the canonical state is a reflection of our own write and is
//! suppressed, so exactly one notification fires per real transition no
//! matter which side initiated it.

use std::sync::Mutex;

use mirrorview_channel::{PeerCommand, PeerHandle};
use mirrorview_core::prelude::*;
use mirrorview_core::SearchSnapshot;

/// Mirrors search transitions onto a rendition
#[trait_variant::make(SearchEffector: Send)]
pub trait LocalSearchEffector {
    /// Expand the search affordance
    async fn show(&self) -> Result<()>;

    /// Collapse the search affordance, optionally clearing the field
    async fn hide(&self, clear_text: bool) -> Result<()>;

    /// Push program-driven text into the field
    async fn push_text(&self, text: &str) -> Result<()>;
}

/// Application-visible search transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchChange {
    Activated,
    Deactivated,
    TextChanged(String),
    Submitted(String),
}

/// Canonical search state plus the transition function
pub struct SearchCore<E> {
    effector: E,
    state: SearchSnapshot,
}

impl<E: SearchEffector> SearchCore<E> {
    pub fn new(effector: E, placeholder: impl Into<String>) -> Self {
        Self {
            effector,
            state: SearchSnapshot {
                active: false,
                text: String::new(),
                placeholder: placeholder.into(),
            },
        }
    }

    pub fn state(&self) -> &SearchSnapshot {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn text(&self) -> &str {
        &self.state.text
    }

    pub fn effector(&self) -> &E {
        &self.effector
    }

    // ─────────────────────────────────────────────────────────
    // Program-driven transitions
    // ─────────────────────────────────────────────────────────

    /// Expand search. Idempotent: a second activation (from any trigger
    /// path) changes nothing and notifies nothing.
    pub async fn activate(&mut self) -> Option<SearchChange> {
        if self.state.active {
            return None;
        }
        self.state.active = true;

        if let Err(e) = self.effector.show().await {
            warn!("Search activation call failed: {}", e);
        }
        // Preserved text from the last session re-enters the field
        if !self.state.text.is_empty() {
            if let Err(e) = self.effector.push_text(&self.state.text).await {
                warn!("Search text restore failed: {}", e);
            }
        }
        Some(SearchChange::Activated)
    }

    /// Collapse search, preserving the field text for the next activation
    pub async fn deactivate(&mut self) -> Option<SearchChange> {
        if !self.state.active {
            return None;
        }
        self.state.active = false;

        if let Err(e) = self.effector.hide(false).await {
            warn!("Search deactivation call failed: {}", e);
        }
        Some(SearchChange::Deactivated)
    }

    /// Clear the field; with `deactivate` also collapse the affordance.
    ///
    /// This is the one path that discards text; plain [`deactivate`]
    /// keeps it.
    ///
    /// [`deactivate`]: SearchCore::deactivate
    pub async fn clear(&mut self, deactivate: bool) -> Vec<SearchChange> {
        let mut changes = Vec::new();

        if !self.state.text.is_empty() {
            self.state.text.clear();
            changes.push(SearchChange::TextChanged(String::new()));
        }

        if deactivate && self.state.active {
            self.state.active = false;
            if let Err(e) = self.effector.hide(true).await {
                warn!("Search clear call failed: {}", e);
            }
        } else if self.state.active {
            if let Err(e) = self.effector.push_text("").await {
                warn!("Search clear call failed: {}", e);
            }
        }

        changes
    }

    /// Program-driven text write; equality-gated so rewriting the same
    /// text never reaches the wire
    pub async fn set_text(&mut self, text: impl Into<String>) -> Option<SearchChange> {
        let text = text.into();
        if self.state.text == text {
            return None;
        }
        self.state.text = text.clone();

        if self.state.active {
            if let Err(e) = self.effector.push_text(&text).await {
                warn!("Search text push failed: {}", e);
            }
        }
        Some(SearchChange::TextChanged(text))
    }

    // ─────────────────────────────────────────────────────────
    // Peer-driven transitions (native events)
    // ─────────────────────────────────────────────────────────

    /// Text typed in the native field.
    ///
    /// Dropped while collapsed (a stray event from a dismissal animation
    /// must not resurrect state); suppressed when it matches the canonical
    /// text (echo of our own push).
    pub fn peer_text_changed(&mut self, text: String) -> Option<SearchChange> {
        if !self.state.active {
            debug!("Dropping search text event while collapsed");
            return None;
        }
        if self.state.text == text {
            return None;
        }
        self.state.text = text.clone();
        Some(SearchChange::TextChanged(text))
    }

    /// Native-side expand/collapse (user tapped the field or cancel).
    ///
    /// The peer already transitioned its own UI, so no effector call is
    /// made; matching state means this is an echo of our own transition.
    pub fn peer_active_changed(&mut self, active: bool) -> Option<SearchChange> {
        if self.state.active == active {
            return None;
        }
        self.state.active = active;
        Some(if active {
            SearchChange::Activated
        } else {
            SearchChange::Deactivated
        })
    }

    /// Return key in the native field
    pub fn peer_submitted(&mut self, text: String) -> Vec<SearchChange> {
        if !self.state.active {
            debug!("Dropping search submit while collapsed");
            return Vec::new();
        }
        let mut changes = Vec::new();
        if self.state.text != text {
            self.state.text = text.clone();
            changes.push(SearchChange::TextChanged(text.clone()));
        }
        changes.push(SearchChange::Submitted(text));
        changes
    }
}

// ─────────────────────────────────────────────────────────
// Effectors
// ─────────────────────────────────────────────────────────

/// Mirrors transitions onto the native peer over the method channel.
///
/// Call failures are transient (`PeerCall` class): logged by the core and
/// swallowed; the canonical state has already moved and the next real
/// transition converges the peer.
pub struct NativeSearchEffector {
    handle: std::sync::Arc<PeerHandle>,
}

impl NativeSearchEffector {
    pub fn new(handle: std::sync::Arc<PeerHandle>) -> Self {
        Self { handle }
    }
}

impl SearchEffector for NativeSearchEffector {
    async fn show(&self) -> Result<()> {
        self.handle.invoke(PeerCommand::ActivateSearch).await.map(|_| ())
    }

    async fn hide(&self, clear_text: bool) -> Result<()> {
        self.handle
            .invoke(PeerCommand::DeactivateSearch { clear_text })
            .await
            .map(|_| ())
    }

    async fn push_text(&self, text: &str) -> Result<()> {
        self.handle
            .invoke(PeerCommand::SetSearchText {
                text: text.to_string(),
            })
            .await
            .map(|_| ())
    }
}

/// In-process rendition state for the emulated backend; also the parity
/// test double. Records every call in order.
#[derive(Default)]
pub struct EmulatedSearchEffector {
    calls: Mutex<Vec<String>>,
}

impl EmulatedSearchEffector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls seen so far, in order (`show`, `hide(clear)`, `pushText(text)`)
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl SearchEffector for EmulatedSearchEffector {
    async fn show(&self) -> Result<()> {
        self.record("show".to_string());
        Ok(())
    }

    async fn hide(&self, clear_text: bool) -> Result<()> {
        self.record(format!("hide({})", clear_text));
        Ok(())
    }

    async fn push_text(&self, text: &str) -> Result<()> {
        self.record(format!("pushText({})", text));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> SearchCore<EmulatedSearchEffector> {
        SearchCore::new(EmulatedSearchEffector::new(), "Search")
    }

    #[tokio::test]
    async fn test_activate_is_idempotent() {
        let mut search = core();

        assert_eq!(search.activate().await, Some(SearchChange::Activated));
        // Second and third activations (any trigger path) are no-ops
        assert_eq!(search.activate().await, None);
        assert_eq!(search.activate().await, None);

        assert!(search.is_active());
        assert_eq!(search.effector().calls(), vec!["show"]);
    }

    #[tokio::test]
    async fn test_plain_deactivate_preserves_text() {
        let mut search = core();
        search.activate().await;
        search.set_text("drill bits").await;

        assert_eq!(search.deactivate().await, Some(SearchChange::Deactivated));
        assert_eq!(search.text(), "drill bits");

        // Text re-enters the field on the next activation
        search.activate().await;
        assert!(search
            .effector()
            .calls()
            .contains(&"pushText(drill bits)".to_string()));
    }

    #[tokio::test]
    async fn test_clear_with_deactivate_discards_text() {
        let mut search = core();
        search.activate().await;
        search.set_text("drill bits").await;

        let changes = search.clear(true).await;
        assert_eq!(
            changes,
            vec![SearchChange::TextChanged(String::new())]
        );
        assert!(!search.is_active());
        assert!(search.text().is_empty());
        assert!(search.effector().calls().contains(&"hide(true)".to_string()));
    }

    #[tokio::test]
    async fn test_deactivate_when_inactive_is_noop() {
        let mut search = core();
        assert_eq!(search.deactivate().await, None);
        assert!(search.effector().calls().is_empty());
    }

    #[tokio::test]
    async fn test_set_text_equality_gate() {
        let mut search = core();
        search.activate().await;

        assert!(search.set_text("abc").await.is_some());
        // Same text again: no notification, no wire call
        assert!(search.set_text("abc").await.is_none());
        let pushes = search
            .effector()
            .calls()
            .iter()
            .filter(|c| c.starts_with("pushText"))
            .count();
        assert_eq!(pushes, 1);
    }

    #[tokio::test]
    async fn test_stray_peer_text_dropped_while_collapsed() {
        let mut search = core();
        assert_eq!(search.peer_text_changed("ghost".into()), None);
        assert!(search.text().is_empty());
    }

    #[tokio::test]
    async fn test_peer_text_echo_suppressed() {
        let mut search = core();
        search.activate().await;
        search.set_text("abc").await;

        // The native field echoes our own push back; one notification total
        assert_eq!(search.peer_text_changed("abc".into()), None);
        assert_eq!(
            search.peer_text_changed("abcd".into()),
            Some(SearchChange::TextChanged("abcd".into()))
        );
    }

    #[tokio::test]
    async fn test_peer_activation_echo_suppressed() {
        let mut search = core();
        search.activate().await;

        // Echo of our own activation
        assert_eq!(search.peer_active_changed(true), None);
        // Real native-side collapse
        assert_eq!(
            search.peer_active_changed(false),
            Some(SearchChange::Deactivated)
        );
        assert!(!search.is_active());
    }

    #[tokio::test]
    async fn test_peer_submit_carries_final_text() {
        let mut search = core();
        search.activate().await;
        search.set_text("dri").await;

        let changes = search.peer_submitted("drill".into());
        assert_eq!(
            changes,
            vec![
                SearchChange::TextChanged("drill".into()),
                SearchChange::Submitted("drill".into()),
            ]
        );
        assert_eq!(search.text(), "drill");
    }

    #[tokio::test]
    async fn test_peer_submit_without_text_drift() {
        let mut search = core();
        search.activate().await;
        search.set_text("drill").await;

        let changes = search.peer_submitted("drill".into());
        assert_eq!(changes, vec![SearchChange::Submitted("drill".into())]);
    }
}
