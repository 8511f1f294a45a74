//! Property diff engine
//!
//! Compares two snapshots and yields the minimal ordered list of patch
//! operations that brings a peer from the old state to the new one. Diffing
//! is fully synchronous and allocation-light; it runs on every declarative
//! rebuild, including per-frame rebuilds during theme animations, so the
//! no-redundant-call invariant here is load-bearing: equal snapshots must
//! produce zero operations.
//!
//! Ordering is stable by construction: style ops precede content/icon ops
//! (style affects how content is themed), and content/icon ops precede
//! layout ops (layout measurement is re-requested only after content
//! settles). Badge-only diffs are recognized as a distinct fast path so the
//! caller can route them to a lightweight peer call instead of a structural
//! rebuild.

use serde_json::{json, Value};

use crate::icon::IconProxy;
use crate::snapshot::{
    ButtonSnapshot, ButtonStyle, EdgeInsets, TabBarSnapshot, TabItemSnapshot, TabLayout,
};

/// Patch operation category, used for ordering and wire routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchKind {
    Style,
    Content,
    Icon,
    Badge,
    Enabled,
    Layout,
}

/// How expensive a patch is to apply on the peer side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostClass {
    /// Single-property update, no content rebuild
    Cheap,
    /// Rebuilds peer content or geometry
    Structural,
}

/// Content replacement payloads
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPatch {
    /// Full label + icon replacement for a standalone control
    Button {
        label: Option<String>,
        icon: Option<IconProxy>,
    },
    /// Full item-set rebuild (count changed, or items reordered)
    Items {
        items: Vec<TabItemSnapshot>,
        selected_index: usize,
    },
    /// Single item replaced in place
    Item { index: usize, item: TabItemSnapshot },
    /// Selection moved; items untouched
    Selection { index: usize },
}

/// Same-kind icon property update (cheap swap, no content rebuild)
#[derive(Debug, Clone, PartialEq)]
pub enum IconPatch {
    Button { icon: IconProxy },
    Item {
        index: usize,
        icon: IconProxy,
        active_icon: Option<IconProxy>,
    },
}

/// Geometry updates
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutPatch {
    Control {
        padding: Option<EdgeInsets>,
        min_height: Option<f64>,
        border_radius: Option<f64>,
    },
    TabBar(TabLayout),
}

/// One minimal, typed instruction bringing a peer from old to new state
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    Style {
        style: ButtonStyle,
        group_id: Option<String>,
    },
    Content(ContentPatch),
    Icon(IconPatch),
    Badge {
        /// Item index for tab bars; `None` for standalone controls
        index: Option<usize>,
        badge: Option<i64>,
    },
    Enabled(bool),
    Layout(LayoutPatch),
}

impl PatchOp {
    pub fn kind(&self) -> PatchKind {
        match self {
            PatchOp::Style { .. } => PatchKind::Style,
            PatchOp::Content(_) => PatchKind::Content,
            PatchOp::Icon(_) => PatchKind::Icon,
            PatchOp::Badge { .. } => PatchKind::Badge,
            PatchOp::Enabled(_) => PatchKind::Enabled,
            PatchOp::Layout(_) => PatchKind::Layout,
        }
    }

    pub fn cost(&self) -> CostClass {
        match self {
            PatchOp::Content(ContentPatch::Selection { .. }) => CostClass::Cheap,
            PatchOp::Content(_) | PatchOp::Layout(_) => CostClass::Structural,
            PatchOp::Style { .. } | PatchOp::Icon(_) | PatchOp::Badge { .. } | PatchOp::Enabled(_) => {
                CostClass::Cheap
            }
        }
    }

    /// Whether applying this op can change the peer's intrinsic size.
    ///
    /// The caller must re-request intrinsic size (once, debounced) after a
    /// reconcile pass that applied any such op.
    pub fn affects_intrinsic_size(&self) -> bool {
        match self {
            PatchOp::Content(ContentPatch::Selection { .. }) => false,
            PatchOp::Content(_) | PatchOp::Icon(_) | PatchOp::Layout(_) => true,
            PatchOp::Style { .. } | PatchOp::Badge { .. } | PatchOp::Enabled(_) => false,
        }
    }

    /// Stable emission order: style < content/icon < cheap flags < layout
    fn order_key(&self) -> u8 {
        match self.kind() {
            PatchKind::Style => 0,
            PatchKind::Content => 1,
            PatchKind::Icon => 2,
            PatchKind::Badge => 3,
            PatchKind::Enabled => 4,
            PatchKind::Layout => 5,
        }
    }

    /// Wire params for this op (the method routing lives in the channel layer)
    pub fn wire_params(&self) -> Value {
        match self {
            PatchOp::Style { style, group_id } => json!({
                "style": style.wire_name(),
                "groupId": group_id,
            }),
            PatchOp::Content(ContentPatch::Button { label, icon }) => json!({
                "label": label,
                "icon": icon,
            }),
            PatchOp::Content(ContentPatch::Items {
                items,
                selected_index,
            }) => json!({
                "items": items,
                "selectedIndex": selected_index,
            }),
            PatchOp::Content(ContentPatch::Item { index, item }) => json!({
                "index": index,
                "item": item,
            }),
            PatchOp::Content(ContentPatch::Selection { index }) => json!({
                "selectedIndex": index,
            }),
            PatchOp::Icon(IconPatch::Button { icon }) => json!({ "icon": icon }),
            PatchOp::Icon(IconPatch::Item {
                index,
                icon,
                active_icon,
            }) => json!({
                "index": index,
                "icon": icon,
                "activeIcon": active_icon,
            }),
            PatchOp::Badge { index, badge } => json!({
                "index": index,
                "badge": badge,
            }),
            PatchOp::Enabled(enabled) => json!({ "enabled": enabled }),
            PatchOp::Layout(LayoutPatch::Control {
                padding,
                min_height,
                border_radius,
            }) => json!({
                "padding": padding.map(|p| p.wire_params()),
                "minHeight": min_height,
                "borderRadius": border_radius,
            }),
            PatchOp::Layout(LayoutPatch::TabBar(layout)) => layout.wire_params(),
        }
    }
}

/// Result of diffing an optional previous snapshot against a new one
#[derive(Debug, Clone, PartialEq)]
pub enum DiffResult {
    /// No previous snapshot: the caller must route to peer creation with the
    /// full parameter set, never to incremental invokes
    Create,
    /// Ordered patch list; empty means no wire call at all
    Patches(Vec<PatchOp>),
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        matches!(self, DiffResult::Patches(ops) if ops.is_empty())
    }

    pub fn ops(&self) -> &[PatchOp] {
        match self {
            DiffResult::Create => &[],
            DiffResult::Patches(ops) => ops,
        }
    }
}

/// A snapshot type the sync controller can create and patch peers from
pub trait Diffable: PartialEq + Clone {
    fn diff(old: Option<&Self>, new: &Self) -> DiffResult;

    /// Full creation parameters (the initial snapshot push)
    fn create_params(&self) -> Value;
}

impl Diffable for ButtonSnapshot {
    fn diff(old: Option<&Self>, new: &Self) -> DiffResult {
        diff_button(old, new)
    }

    fn create_params(&self) -> Value {
        ButtonSnapshot::create_params(self)
    }
}

impl Diffable for TabBarSnapshot {
    fn diff(old: Option<&Self>, new: &Self) -> DiffResult {
        diff_tab_bar(old, new)
    }

    fn create_params(&self) -> Value {
        TabBarSnapshot::create_params(self)
    }
}

// ─────────────────────────────────────────────────────────
// Button Diff
// ─────────────────────────────────────────────────────────

/// True when the icon *kind* changed (including appearing/disappearing).
///
/// A kind switch is always a content change, even if every other field is
/// equal: the peer must rebuild its content tracking for the new source, and
/// a later revert must not be skipped because only same-kind properties were
/// compared.
fn icon_kind_switched(old: Option<&IconProxy>, new: Option<&IconProxy>) -> bool {
    match (old, new) {
        (None, None) => false,
        (Some(a), Some(b)) => a.kind != b.kind,
        _ => true,
    }
}

/// Equality over every field except the badge.
///
/// Exhaustive destructuring, deliberately: adding a field to the snapshot
/// without updating this comparison is a compile error, so the badge fast
/// path can never silently swallow an unrelated change.
fn button_eq_ignoring_badge(a: &ButtonSnapshot, b: &ButtonSnapshot) -> bool {
    let ButtonSnapshot {
        label,
        icon,
        style,
        padding,
        min_height,
        border_radius,
        enabled,
        group_id,
        badge: _,
    } = a;
    *label == b.label
        && *icon == b.icon
        && *style == b.style
        && *padding == b.padding
        && *min_height == b.min_height
        && *border_radius == b.border_radius
        && *enabled == b.enabled
        && *group_id == b.group_id
}

/// Diff two button snapshots into ordered patch operations
pub fn diff_button(old: Option<&ButtonSnapshot>, new: &ButtonSnapshot) -> DiffResult {
    let old = match old {
        None => return DiffResult::Create,
        Some(old) => old,
    };
    if old == new {
        return DiffResult::Patches(Vec::new());
    }

    // Badge fast path: single cheap op, no content rebuild, no flicker.
    if button_eq_ignoring_badge(old, new) {
        return DiffResult::Patches(vec![PatchOp::Badge {
            index: None,
            badge: new.badge,
        }]);
    }

    let mut ops = Vec::new();

    if old.style != new.style || old.group_id != new.group_id {
        ops.push(PatchOp::Style {
            style: new.style,
            group_id: new.group_id.clone(),
        });
    }

    let kind_switch = icon_kind_switched(old.icon.as_ref(), new.icon.as_ref());
    if old.label != new.label || kind_switch {
        ops.push(PatchOp::Content(ContentPatch::Button {
            label: new.label.clone(),
            icon: new.icon.clone(),
        }));
    } else if old.icon != new.icon {
        // Same source kind, properties changed: cheap icon swap. Equal kinds
        // with unequal proxies implies both sides are Some.
        if let Some(icon) = new.icon.clone() {
            ops.push(PatchOp::Icon(IconPatch::Button { icon }));
        }
    }

    if old.badge != new.badge {
        ops.push(PatchOp::Badge {
            index: None,
            badge: new.badge,
        });
    }

    if old.enabled != new.enabled {
        ops.push(PatchOp::Enabled(new.enabled));
    }

    if old.padding != new.padding
        || old.min_height != new.min_height
        || old.border_radius != new.border_radius
    {
        ops.push(PatchOp::Layout(LayoutPatch::Control {
            padding: new.padding,
            min_height: new.min_height,
            border_radius: new.border_radius,
        }));
    }

    debug_assert!(ops.windows(2).all(|w| w[0].order_key() <= w[1].order_key()));
    DiffResult::Patches(ops)
}

// ─────────────────────────────────────────────────────────
// Tab Bar Diff
// ─────────────────────────────────────────────────────────

/// Equality over every item field except the badge (exhaustive on purpose,
/// see [`button_eq_ignoring_badge`])
fn item_eq_ignoring_badge(a: &TabItemSnapshot, b: &TabItemSnapshot) -> bool {
    let TabItemSnapshot {
        label,
        icon,
        active_icon,
        badge: _,
        group_id,
        is_search,
    } = a;
    *label == b.label
        && *icon == b.icon
        && *active_icon == b.active_icon
        && *group_id == b.group_id
        && *is_search == b.is_search
}

fn tab_bar_eq_ignoring_badges(a: &TabBarSnapshot, b: &TabBarSnapshot) -> bool {
    let TabBarSnapshot {
        items,
        selected_index,
        layout,
    } = a;
    *selected_index == b.selected_index
        && *layout == b.layout
        && items.len() == b.items.len()
        && items
            .iter()
            .zip(&b.items)
            .all(|(x, y)| item_eq_ignoring_badge(x, y))
}

/// Diff two tab bar snapshots into ordered patch operations
pub fn diff_tab_bar(old: Option<&TabBarSnapshot>, new: &TabBarSnapshot) -> DiffResult {
    let old = match old {
        None => return DiffResult::Create,
        Some(old) => old,
    };
    if old == new {
        return DiffResult::Patches(Vec::new());
    }

    // Badge fast path: only badge counts moved; one cheap op per changed
    // item, content untouched.
    if tab_bar_eq_ignoring_badges(old, new) {
        let ops = old
            .items
            .iter()
            .zip(&new.items)
            .enumerate()
            .filter(|(_, (a, b))| a.badge != b.badge)
            .map(|(index, (_, b))| PatchOp::Badge {
                index: Some(index),
                badge: b.badge,
            })
            .collect();
        return DiffResult::Patches(ops);
    }

    let mut ops = Vec::new();

    if old.items.len() != new.items.len() {
        // Item count changed: structural rebuild of the whole item set.
        ops.push(PatchOp::Content(ContentPatch::Items {
            items: new.items.clone(),
            selected_index: new.selected_index,
        }));
        if old.layout != new.layout {
            ops.push(PatchOp::Layout(LayoutPatch::TabBar(new.layout)));
        }
        return DiffResult::Patches(ops);
    }

    let mut badge_ops = Vec::new();
    for (index, (a, b)) in old.items.iter().zip(&new.items).enumerate() {
        if a == b {
            continue;
        }
        let kind_switch = icon_kind_switched(Some(&a.icon), Some(&b.icon))
            || icon_kind_switched(a.active_icon.as_ref(), b.active_icon.as_ref());
        if a.label != b.label || a.group_id != b.group_id || a.is_search != b.is_search || kind_switch
        {
            ops.push(PatchOp::Content(ContentPatch::Item {
                index,
                item: b.clone(),
            }));
        } else if a.icon != b.icon || a.active_icon != b.active_icon {
            ops.push(PatchOp::Icon(IconPatch::Item {
                index,
                icon: b.icon.clone(),
                active_icon: b.active_icon.clone(),
            }));
        }
        if a.badge != b.badge {
            badge_ops.push(PatchOp::Badge {
                index: Some(index),
                badge: b.badge,
            });
        }
    }

    if old.selected_index != new.selected_index {
        ops.push(PatchOp::Content(ContentPatch::Selection {
            index: new.selected_index,
        }));
    }

    ops.extend(badge_ops);

    if old.layout != new.layout {
        ops.push(PatchOp::Layout(LayoutPatch::TabBar(new.layout)));
    }

    // Per-item ops interleave content and icon kinds, which share an order
    // class; only the class ordering is guaranteed.
    debug_assert!({
        let first_layout = ops.iter().position(|op| op.kind() == PatchKind::Layout);
        let last_content = ops
            .iter()
            .rposition(|op| matches!(op.kind(), PatchKind::Content | PatchKind::Icon));
        match (first_layout, last_content) {
            (Some(l), Some(c)) => c < l,
            _ => true,
        }
    });
    DiffResult::Patches(ops)
}
