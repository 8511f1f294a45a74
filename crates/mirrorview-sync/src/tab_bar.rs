//! Tab bar controller
//!
//! Sits above a `SyncController<TabBarSnapshot>` and a `SearchCore`,
//! mediating between the declarative item list, the rendition, and native
//! interaction events. Items are held in render order (search item last);
//! every index in this module, including the application-visible selection,
//! is a render-order index that never equals the search slot.
//!
//! Selection masking: the native rendition treats the search affordance as
//! a selectable tab, so tapping it fires a selection event for the search
//! slot. That event is intercepted here: the previous real selection is
//! restored on the peer, search activates, and the application never sees
//! a selection landing on the search slot.

use mirrorview_channel::PeerBinding;
use mirrorview_core::prelude::*;
use mirrorview_core::{
    ContentPatch, PatchOp, PeerEvent, PeerMessage, TabBarSnapshot, TabItem, TabLayout,
};

use crate::config::SyncSettings;
use crate::controller::{Backend, IntrinsicSize, PeerConnector, SyncController};
use crate::search::{
    EmulatedSearchEffector, NativeSearchEffector, SearchChange, SearchCore, SearchEffector,
};

/// Application-visible tab bar transition
#[derive(Debug, Clone, PartialEq)]
pub enum TabBarChange {
    /// A real (non-search) item was selected
    SelectionChanged(usize),
    Search(SearchChange),
    /// The peer reports content for an item became visible
    ContentAppeared(usize),
}

/// Search effector for whichever backend the mount chose
pub enum TabBarEffector {
    Native(NativeSearchEffector),
    Emulated(EmulatedSearchEffector),
}

impl TabBarEffector {
    /// Emulated call log, for parity assertions; `None` on native
    pub fn emulated_calls(&self) -> Option<Vec<String>> {
        match self {
            TabBarEffector::Native(_) => None,
            TabBarEffector::Emulated(e) => Some(e.calls()),
        }
    }
}

impl SearchEffector for TabBarEffector {
    async fn show(&self) -> Result<()> {
        match self {
            TabBarEffector::Native(e) => e.show().await,
            TabBarEffector::Emulated(e) => e.show().await,
        }
    }

    async fn hide(&self, clear_text: bool) -> Result<()> {
        match self {
            TabBarEffector::Native(e) => e.hide(clear_text).await,
            TabBarEffector::Emulated(e) => e.hide(clear_text).await,
        }
    }

    async fn push_text(&self, text: &str) -> Result<()> {
        match self {
            TabBarEffector::Native(e) => e.push_text(text).await,
            TabBarEffector::Emulated(e) => e.push_text(text).await,
        }
    }
}

pub struct TabBarController {
    sync: SyncController<TabBarSnapshot>,
    search: SearchCore<TabBarEffector>,
    /// Items in render order (search last)
    items: Vec<TabItem>,
    /// Render-order index of the selected item; never the search slot
    selected: usize,
    layout: TabLayout,
}

impl TabBarController {
    /// Mount a tab bar from its declarative description.
    ///
    /// Backend choice (and fallback on creation failure) happens inside the
    /// sync controller; the search effector follows whichever backend won.
    pub async fn mount(
        settings: SyncSettings,
        connector: Box<dyn PeerConnector>,
        native_supported: bool,
        items: Vec<TabItem>,
        selected: usize,
        layout: TabLayout,
        search_placeholder: impl Into<String>,
    ) -> Self {
        let items = render_order(items);
        let selected = clamp_selection(&items, selected);

        let mut sync = SyncController::new(settings, connector, native_supported);
        sync.mount(TabBarSnapshot::capture(&items, selected, layout))
            .await;

        let effector = match sync.handle() {
            Some(handle) => TabBarEffector::Native(NativeSearchEffector::new(handle)),
            None => TabBarEffector::Emulated(EmulatedSearchEffector::new()),
        };

        Self {
            sync,
            search: SearchCore::new(effector, search_placeholder),
            items,
            selected,
            layout,
        }
    }

    pub fn backend(&self) -> Backend {
        self.sync.backend()
    }

    pub fn intrinsic_size(&self) -> IntrinsicSize {
        self.sync.intrinsic_size()
    }

    /// Application-visible selection; by construction never the search slot
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn items(&self) -> &[TabItem] {
        &self.items
    }

    pub fn search(&self) -> &SearchCore<TabBarEffector> {
        &self.search
    }

    /// Inbound event stream (native backend only); yields `Some` once
    pub fn take_events(&self) -> Option<tokio::sync::mpsc::UnboundedReceiver<PeerEvent>> {
        self.sync.take_events()
    }

    /// Patch kinds applied by the most recent reconcile pass
    pub fn applied_kinds(&self) -> &[mirrorview_core::PatchKind] {
        self.sync.applied_kinds()
    }

    fn snapshot(&self) -> TabBarSnapshot {
        TabBarSnapshot::capture(&self.items, self.selected, self.layout)
    }

    fn search_slot(&self) -> Option<usize> {
        self.items.iter().position(|item| item.is_search)
    }

    async fn reconcile(&mut self) {
        let snapshot = self.snapshot();
        self.sync.update(snapshot).await;
    }

    // ─────────────────────────────────────────────────────────
    // Program-driven updates
    // ─────────────────────────────────────────────────────────

    /// Replace the item set (declaration order; search item is moved last)
    pub async fn set_items(&mut self, items: Vec<TabItem>) {
        self.items = render_order(items);
        self.selected = clamp_selection(&self.items, self.selected);
        self.reconcile().await;
    }

    /// Select a real item by render-order index. Selecting the search slot
    /// or an out-of-range index is ignored.
    pub async fn select(&mut self, index: usize) {
        if index == self.selected {
            return;
        }
        match self.items.get(index) {
            Some(item) if !item.is_search => {}
            _ => {
                warn!("Ignoring selection of index {}", index);
                return;
            }
        }
        self.selected = index;
        self.reconcile().await;
    }

    /// Update one item's badge. The diff engine recognizes this as the
    /// badge-only fast path, so it keeps flowing (one cheap call) even
    /// while search is expanded.
    pub async fn set_badge(&mut self, index: usize, badge: Option<i64>) {
        match self.items.get_mut(index) {
            Some(item) if !item.is_search => item.badge = badge,
            _ => {
                warn!("Ignoring badge update for index {}", index);
                return;
            }
        }
        self.reconcile().await;
    }

    pub async fn activate_search(&mut self) -> Option<SearchChange> {
        self.search.activate().await
    }

    pub async fn deactivate_search(&mut self) -> Option<SearchChange> {
        self.search.deactivate().await
    }

    pub async fn clear_search(&mut self, deactivate: bool) -> Vec<SearchChange> {
        self.search.clear(deactivate).await
    }

    pub async fn set_search_text(&mut self, text: impl Into<String>) -> Option<SearchChange> {
        self.search.set_text(text).await
    }

    // ─────────────────────────────────────────────────────────
    // Peer events
    // ─────────────────────────────────────────────────────────

    /// Feed one inbound peer event through the state machine, returning the
    /// application-visible changes it caused.
    pub async fn handle_event(&mut self, event: PeerEvent) -> Vec<TabBarChange> {
        match event.message {
            PeerMessage::SelectionChanged(e) => self.peer_selection(e.index).await,
            PeerMessage::SearchTextChanged(e) => self
                .search
                .peer_text_changed(e.text)
                .map(TabBarChange::Search)
                .into_iter()
                .collect(),
            PeerMessage::SearchActiveChanged(e) => self
                .search
                .peer_active_changed(e.active)
                .map(TabBarChange::Search)
                .into_iter()
                .collect(),
            PeerMessage::SearchSubmitted(e) => self
                .search
                .peer_submitted(e.text)
                .into_iter()
                .map(TabBarChange::Search)
                .collect(),
            PeerMessage::ContentAppeared(e) => vec![TabBarChange::ContentAppeared(e.index)],
            PeerMessage::Response { .. } => Vec::new(),
            PeerMessage::UnknownEvent { event, .. } => {
                debug!("Ignoring unknown peer event: {}", event);
                Vec::new()
            }
        }
    }

    async fn peer_selection(&mut self, index: usize) -> Vec<TabBarChange> {
        if Some(index) == self.search_slot() {
            // Masking: put the peer's highlight back on the real selection
            // first, then expand search, so the search slot is never left
            // looking selected.
            self.sync
                .apply_op(PatchOp::Content(ContentPatch::Selection {
                    index: self.selected,
                }))
                .await;
            return self
                .search
                .activate()
                .await
                .map(TabBarChange::Search)
                .into_iter()
                .collect();
        }

        if index >= self.items.len() {
            warn!("Peer selection out of range: {}", index);
            return Vec::new();
        }
        if index == self.selected {
            return Vec::new();
        }

        // The peer already moved; adopt its state instead of echoing a
        // selection patch back.
        self.selected = index;
        let snapshot = self.snapshot();
        self.sync.adopt(snapshot);
        vec![TabBarChange::SelectionChanged(index)]
    }

    pub async fn dispose(&mut self) {
        self.sync.dispose().await;
    }
}

/// Reorder declarative items so the search item sits in the last slot
fn render_order(mut items: Vec<TabItem>) -> Vec<TabItem> {
    items.sort_by_key(|item| item.is_search);
    items
}

/// Keep the selection on a real item
fn clamp_selection(items: &[TabItem], selected: usize) -> usize {
    match items.get(selected) {
        Some(item) if !item.is_search => selected,
        _ => 0,
    }
}

/// Connector used by embedders that already hold a binding
pub struct SingleBindingConnector {
    binding: std::sync::Mutex<Option<PeerBinding>>,
}

impl SingleBindingConnector {
    pub fn new(binding: PeerBinding) -> Self {
        Self {
            binding: std::sync::Mutex::new(Some(binding)),
        }
    }
}

impl PeerConnector for SingleBindingConnector {
    fn connect(&self) -> Result<PeerBinding> {
        self.binding
            .lock()
            .ok()
            .and_then(|mut b| b.take())
            .ok_or_else(|| Error::peer_creation("binding already consumed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorview_core::{IconSpec, PatchKind};

    fn items() -> Vec<TabItem> {
        vec![
            TabItem::new("Home", IconSpec::symbol("house")),
            TabItem::search("Search", IconSpec::symbol("magnifyingglass")),
            TabItem::new("Browse", IconSpec::symbol("square.grid.2x2")),
            TabItem::new("Library", IconSpec::symbol("books.vertical")),
        ]
    }

    struct NoPeer;
    impl PeerConnector for NoPeer {
        fn connect(&self) -> Result<PeerBinding> {
            Err(Error::peer_creation("no transport in test"))
        }
    }

    async fn emulated_bar() -> TabBarController {
        TabBarController::mount(
            SyncSettings::default(),
            Box::new(NoPeer),
            false,
            items(),
            0,
            TabLayout::default(),
            "Search",
        )
        .await
    }

    fn stamped(message: PeerMessage) -> PeerEvent {
        PeerEvent::now(message)
    }

    #[tokio::test]
    async fn test_render_order_puts_search_last() {
        let bar = emulated_bar().await;
        let labels: Vec<&str> = bar.items().iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["Home", "Browse", "Library", "Search"]);
        assert_eq!(bar.search_slot(), Some(3));
    }

    #[tokio::test]
    async fn test_select_search_slot_is_ignored() {
        let mut bar = emulated_bar().await;
        bar.select(3).await;
        assert_eq!(bar.selected_index(), 0);
    }

    #[tokio::test]
    async fn test_badge_update_uses_fast_path() {
        let mut bar = emulated_bar().await;
        bar.set_badge(1, Some(12)).await;

        assert_eq!(bar.applied_kinds(), &[PatchKind::Badge]);
        assert_eq!(bar.items()[1].badge, Some(12));
    }

    #[tokio::test]
    async fn test_badge_keeps_flowing_while_search_expanded() {
        let mut bar = emulated_bar().await;
        bar.activate_search().await;

        bar.set_badge(2, Some(5)).await;
        assert_eq!(bar.applied_kinds(), &[PatchKind::Badge]);
        assert!(bar.search().is_active());
    }

    #[tokio::test]
    async fn test_peer_selection_on_search_slot_is_masked() {
        let mut bar = emulated_bar().await;
        bar.select(1).await;

        let changes = bar
            .handle_event(stamped(PeerMessage::SelectionChanged(
                mirrorview_core::SelectionChanged { index: 3 },
            )))
            .await;

        // Selection restore then activation; app never sees index 3
        assert_eq!(changes, vec![TabBarChange::Search(SearchChange::Activated)]);
        assert_eq!(bar.selected_index(), 1);
        assert_eq!(bar.applied_kinds(), &[PatchKind::Content]);
        assert!(bar.search().is_active());
    }

    #[tokio::test]
    async fn test_masked_activation_is_idempotent() {
        let mut bar = emulated_bar().await;
        bar.activate_search().await;

        let changes = bar
            .handle_event(stamped(PeerMessage::SelectionChanged(
                mirrorview_core::SelectionChanged { index: 3 },
            )))
            .await;
        // Already active: selection restored, but no second notification
        assert!(changes.is_empty());
    }

    #[tokio::test]
    async fn test_peer_selection_on_real_item_is_adopted() {
        let mut bar = emulated_bar().await;

        let changes = bar
            .handle_event(stamped(PeerMessage::SelectionChanged(
                mirrorview_core::SelectionChanged { index: 2 },
            )))
            .await;

        assert_eq!(changes, vec![TabBarChange::SelectionChanged(2)]);
        assert_eq!(bar.selected_index(), 2);

        // Adopted, not echoed: the next reconcile of identical state is empty
        bar.set_items(items()).await;
        assert!(bar.applied_kinds().is_empty());
    }

    #[tokio::test]
    async fn test_app_selection_emits_selection_patch() {
        let mut bar = emulated_bar().await;
        bar.select(2).await;

        assert_eq!(bar.selected_index(), 2);
        assert_eq!(bar.applied_kinds(), &[PatchKind::Content]);
    }

    #[tokio::test]
    async fn test_item_count_change_is_structural() {
        let mut bar = emulated_bar().await;
        let mut fewer = items();
        fewer.pop();
        bar.set_items(fewer).await;

        assert_eq!(bar.applied_kinds(), &[PatchKind::Content]);
    }

    #[tokio::test]
    async fn test_search_events_route_through_core() {
        let mut bar = emulated_bar().await;
        bar.activate_search().await;

        let changes = bar
            .handle_event(stamped(PeerMessage::SearchTextChanged(
                mirrorview_core::SearchTextChanged { text: "dr".into() },
            )))
            .await;
        assert_eq!(
            changes,
            vec![TabBarChange::Search(SearchChange::TextChanged("dr".into()))]
        );

        let changes = bar
            .handle_event(stamped(PeerMessage::SearchSubmitted(
                mirrorview_core::SearchSubmitted { text: "dr".into() },
            )))
            .await;
        assert_eq!(
            changes,
            vec![TabBarChange::Search(SearchChange::Submitted("dr".into()))]
        );
    }

    #[tokio::test]
    async fn test_emulated_effector_records_transitions() {
        let mut bar = emulated_bar().await;
        bar.activate_search().await;
        bar.deactivate_search().await;

        let calls = bar.search().effector().emulated_calls().unwrap();
        assert_eq!(calls, vec!["show", "hide(false)"]);
    }

    #[tokio::test]
    async fn test_content_appeared_passthrough() {
        let mut bar = emulated_bar().await;
        let changes = bar
            .handle_event(stamped(PeerMessage::ContentAppeared(
                mirrorview_core::ContentAppeared { index: 1 },
            )))
            .await;
        assert_eq!(changes, vec![TabBarChange::ContentAppeared(1)]);
    }
}
