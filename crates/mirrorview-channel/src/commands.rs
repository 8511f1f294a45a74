//! Command building for the peer method surface
//!
//! The outbound method set is fixed: create, the six patch setters, the
//! intrinsic-size query, and the three search calls. Diff results route
//! through [`PeerCommand::from_patch`] so each patch lands on the cheapest
//! matching call (a badge-only diff becomes `setBadge`, never a content
//! rebuild).

use serde_json::{json, Value};

use mirrorview_core::{PatchKind, PatchOp};

/// Outbound peer command
#[derive(Debug, Clone)]
pub enum PeerCommand {
    /// Allocate the native view with the full initial parameter set
    Create { params: Value },
    /// Apply one diff operation, routed by patch kind
    Patch(PatchOp),
    /// Ask the peer for its intrinsic size
    GetIntrinsicSize,
    /// Expand the native search affordance
    ActivateSearch,
    /// Collapse the native search affordance
    DeactivateSearch { clear_text: bool },
    /// Push program-driven search text to the peer
    SetSearchText { text: String },
}

impl PeerCommand {
    /// Wire method name
    pub fn method(&self) -> &'static str {
        match self {
            PeerCommand::Create { .. } => "create",
            PeerCommand::Patch(op) => match op.kind() {
                PatchKind::Style => "setStyle",
                PatchKind::Content => "setContent",
                PatchKind::Icon => "setIcon",
                PatchKind::Badge => "setBadge",
                PatchKind::Enabled => "setEnabled",
                PatchKind::Layout => "setLayout",
            },
            PeerCommand::GetIntrinsicSize => "getIntrinsicSize",
            PeerCommand::ActivateSearch => "activateSearch",
            PeerCommand::DeactivateSearch { .. } => "deactivateSearch",
            PeerCommand::SetSearchText { .. } => "setSearchText",
        }
    }

    /// Build the JSON-RPC request object
    pub fn build(&self, id: u64) -> String {
        let params = match self {
            PeerCommand::Create { params } => params.clone(),
            PeerCommand::Patch(op) => op.wire_params(),
            PeerCommand::GetIntrinsicSize => json!({}),
            PeerCommand::ActivateSearch => json!({}),
            PeerCommand::DeactivateSearch { clear_text } => json!({ "clearText": clear_text }),
            PeerCommand::SetSearchText { text } => json!({ "text": text }),
        };

        json!({
            "id": id,
            "method": self.method(),
            "params": params,
        })
        .to_string()
    }

    /// Route a diff operation to its wire command
    pub fn from_patch(op: &PatchOp) -> Self {
        PeerCommand::Patch(op.clone())
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            PeerCommand::Create { .. } => "create peer",
            PeerCommand::Patch(op) => match op.kind() {
                PatchKind::Style => "set style",
                PatchKind::Content => "set content",
                PatchKind::Icon => "set icon",
                PatchKind::Badge => "set badge",
                PatchKind::Enabled => "set enabled",
                PatchKind::Layout => "set layout",
            },
            PeerCommand::GetIntrinsicSize => "query intrinsic size",
            PeerCommand::ActivateSearch => "activate search",
            PeerCommand::DeactivateSearch { .. } => "deactivate search",
            PeerCommand::SetSearchText { .. } => "set search text",
        }
    }
}
