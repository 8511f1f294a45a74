//! Immutable property snapshots
//!
//! A snapshot is the flat, comparable record of every property that affects
//! a native peer's rendering. Snapshots are produced fresh on every
//! declarative rebuild and discarded after diffing; equality between the
//! previous and the new snapshot is the *sole* trigger for patch
//! computation, so all fields must be cheaply comparable (icons enter as
//! [`IconProxy`], never as rendered bytes).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::icon::{IconProxy, IconSpec};

/// Edge insets for control padding, in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeInsets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl EdgeInsets {
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            left: value,
            bottom: value,
            right: value,
        }
    }

    pub fn wire_params(&self) -> Value {
        json!({
            "top": self.top,
            "left": self.left,
            "bottom": self.bottom,
            "right": self.right,
        })
    }
}

/// Visual style of a native control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ButtonStyle {
    Plain,
    Gray,
    Tinted,
    Bordered,
    Filled,
}

impl ButtonStyle {
    pub fn wire_name(&self) -> &'static str {
        match self {
            ButtonStyle::Plain => "plain",
            ButtonStyle::Gray => "gray",
            ButtonStyle::Tinted => "tinted",
            ButtonStyle::Bordered => "bordered",
            ButtonStyle::Filled => "filled",
        }
    }
}

impl Default for ButtonStyle {
    fn default() -> Self {
        ButtonStyle::Plain
    }
}

/// Tab bar layout behavior (split placement and inter-item spacing)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabLayout {
    /// Render the search region split off from the item strip
    pub split: bool,
    pub spacing: Option<f64>,
}

impl TabLayout {
    pub fn wire_params(&self) -> Value {
        json!({ "split": self.split, "spacing": self.spacing })
    }
}

// ─────────────────────────────────────────────────────────
// Button
// ─────────────────────────────────────────────────────────

/// Snapshot of a standalone native button
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ButtonSnapshot {
    pub label: Option<String>,
    pub icon: Option<IconProxy>,
    pub style: ButtonStyle,
    pub padding: Option<EdgeInsets>,
    pub min_height: Option<f64>,
    pub border_radius: Option<f64>,
    pub enabled: bool,
    /// Affinity identifier for blended group effects
    pub group_id: Option<String>,
    pub badge: Option<i64>,
}

impl ButtonSnapshot {
    /// Full parameter set pushed at peer creation (never partial)
    pub fn create_params(&self) -> Value {
        json!({
            "label": self.label,
            "icon": self.icon,
            "style": self.style.wire_name(),
            "padding": self.padding.map(|p| p.wire_params()),
            "minHeight": self.min_height,
            "borderRadius": self.border_radius,
            "enabled": self.enabled,
            "groupId": self.group_id,
            "badge": self.badge,
        })
    }
}

// ─────────────────────────────────────────────────────────
// Tab Bar
// ─────────────────────────────────────────────────────────

/// Declarative properties of a single tab item
#[derive(Debug, Clone, PartialEq)]
pub struct TabItem {
    pub label: String,
    pub icon: IconSpec,
    /// Icon shown while the item is selected; falls back to `icon`
    pub active_icon: Option<IconSpec>,
    pub badge: Option<i64>,
    pub group_id: Option<String>,
    /// Marks this item as the dedicated search affordance
    pub is_search: bool,
}

impl TabItem {
    pub fn new(label: impl Into<String>, icon: IconSpec) -> Self {
        Self {
            label: label.into(),
            icon,
            active_icon: None,
            badge: None,
            group_id: None,
            is_search: false,
        }
    }

    pub fn search(label: impl Into<String>, icon: IconSpec) -> Self {
        Self {
            is_search: true,
            ..Self::new(label, icon)
        }
    }

    pub fn with_badge(mut self, badge: i64) -> Self {
        self.badge = Some(badge);
        self
    }
}

/// Comparable snapshot of one tab item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabItemSnapshot {
    pub label: String,
    pub icon: IconProxy,
    pub active_icon: Option<IconProxy>,
    pub badge: Option<i64>,
    pub group_id: Option<String>,
    pub is_search: bool,
}

impl From<&TabItem> for TabItemSnapshot {
    fn from(item: &TabItem) -> Self {
        Self {
            label: item.label.clone(),
            icon: item.icon.proxy(),
            active_icon: item.active_icon.as_ref().map(IconSpec::proxy),
            badge: item.badge,
            group_id: item.group_id.clone(),
            is_search: item.is_search,
        }
    }
}

/// Snapshot of a tab bar: items in *render* order, selection, layout
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TabBarSnapshot {
    pub items: Vec<TabItemSnapshot>,
    /// Selected index, in render order. Never points at the search slot.
    pub selected_index: usize,
    pub layout: TabLayout,
}

impl TabBarSnapshot {
    /// Capture declarative items into a snapshot.
    ///
    /// Items keep declaration order except the search item, which is always
    /// moved to the last (rightmost) slot. `selected_index` is given in
    /// declaration order over non-search items and carried through the
    /// reorder unchanged (the search slot is not selectable, so non-search
    /// relative order is what selection indexes).
    pub fn capture(items: &[TabItem], selected_index: usize, layout: TabLayout) -> Self {
        let mut regular: Vec<TabItemSnapshot> = Vec::with_capacity(items.len());
        let mut search: Vec<TabItemSnapshot> = Vec::new();
        for item in items {
            if item.is_search {
                search.push(item.into());
            } else {
                regular.push(item.into());
            }
        }
        regular.extend(search);
        Self {
            items: regular,
            selected_index,
            layout,
        }
    }

    /// Render-order index of the search slot, if a search item is present
    pub fn search_slot(&self) -> Option<usize> {
        self.items.iter().position(|item| item.is_search)
    }

    /// Full parameter set pushed at peer creation (never partial)
    pub fn create_params(&self) -> Value {
        json!({
            "items": self.items,
            "selectedIndex": self.selected_index,
            "layout": self.layout.wire_params(),
        })
    }
}

// ─────────────────────────────────────────────────────────
// Search
// ─────────────────────────────────────────────────────────

/// Snapshot of the search affordance's synchronized state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchSnapshot {
    pub active: bool,
    pub text: String,
    pub placeholder: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items_with_search() -> Vec<TabItem> {
        vec![
            TabItem::new("Home", IconSpec::symbol("house")),
            TabItem::search("Search", IconSpec::symbol("magnifyingglass")),
            TabItem::new("Browse", IconSpec::symbol("square.grid.2x2")),
        ]
    }

    #[test]
    fn test_snapshot_equality_is_field_by_field() {
        let a = ButtonSnapshot {
            label: Some("Done".into()),
            enabled: true,
            ..Default::default()
        };
        let b = a.clone();
        assert_eq!(a, b);

        let c = ButtonSnapshot {
            enabled: false,
            ..a.clone()
        };
        assert_ne!(a, c);
    }

    #[test]
    fn test_search_item_is_rendered_last() {
        let snapshot = TabBarSnapshot::capture(&items_with_search(), 0, TabLayout::default());
        let labels: Vec<&str> = snapshot.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["Home", "Browse", "Search"]);
        assert_eq!(snapshot.search_slot(), Some(2));
    }

    #[test]
    fn test_declaration_order_preserved_without_search() {
        let items = vec![
            TabItem::new("One", IconSpec::symbol("1.circle")),
            TabItem::new("Two", IconSpec::symbol("2.circle")),
        ];
        let snapshot = TabBarSnapshot::capture(&items, 1, TabLayout::default());
        let labels: Vec<&str> = snapshot.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["One", "Two"]);
        assert_eq!(snapshot.search_slot(), None);
    }

    #[test]
    fn test_capture_is_pure_and_repeatable() {
        let items = items_with_search();
        let a = TabBarSnapshot::capture(&items, 0, TabLayout::default());
        let b = TabBarSnapshot::capture(&items, 0, TabLayout::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_create_params_are_complete() {
        let snapshot = TabBarSnapshot::capture(&items_with_search(), 0, TabLayout::default());
        let params = snapshot.create_params();
        assert_eq!(params["items"].as_array().unwrap().len(), 3);
        assert_eq!(params["selectedIndex"], 0);
        assert_eq!(params["layout"]["split"], false);
    }

    #[test]
    fn test_item_badge_changes_snapshot_equality() {
        let items = items_with_search();
        let a = TabBarSnapshot::capture(&items, 0, TabLayout::default());

        let mut badged = items.clone();
        badged[0].badge = Some(3);
        let b = TabBarSnapshot::capture(&badged, 0, TabLayout::default());

        assert_ne!(a, b);
    }
}
