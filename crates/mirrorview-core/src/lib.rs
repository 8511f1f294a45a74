//! # mirrorview-core - Core Domain Types
//!
//! Foundation crate for mirrorview. Provides the property snapshot types,
//! the diff engine, icon specifications, inbound peer event definitions,
//! the process-wide capability gate, and error handling.
//!
//! This crate has **zero internal dependencies** -- it only depends on
//! external crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Snapshots (`snapshot`)
//! - [`ButtonSnapshot`], [`TabBarSnapshot`], [`SearchSnapshot`] - flat,
//!   comparable property records; equality is the sole patch trigger
//! - [`TabItem`] - declarative tab item properties (search item renders last)
//!
//! ### Diffing (`diff`)
//! - [`diff_button`] / [`diff_tab_bar`] - minimal ordered patch computation
//! - [`PatchOp`], [`DiffResult`] - typed patch operations with cost classes
//! - [`Diffable`] - the seam the sync controller is generic over
//!
//! ### Icons (`icon`)
//! - [`IconSpec`] - sum type over symbol/glyph/asset sources
//! - [`IconProxy`] - O(1)-comparable form captured into snapshots
//!
//! ### Events (`events`)
//! - [`PeerMessage`] - typed inbound messages from the peer channel
//! - [`PeerEvent`] - stamped interaction event from a handle's stream
//!
//! ### Capability Gate (`capability`)
//! - [`capability::ensure_initialized`] - once-per-process platform probe
//!
//! ### Error Handling (`error`)
//! - [`Error`] - taxonomy with `fatal` vs `recoverable` classification
//! - [`Result`], [`ResultExt`]
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use mirrorview_core::prelude::*;
//! ```

pub mod capability;
pub mod diff;
pub mod error;
pub mod events;
pub mod icon;
pub mod logging;
pub mod snapshot;

/// Prelude for common imports used throughout all mirrorview crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use diff::{
    diff_button, diff_tab_bar, ContentPatch, CostClass, DiffResult, Diffable, IconPatch,
    LayoutPatch, PatchKind, PatchOp,
};
pub use error::{Error, Result, ResultExt};
pub use events::{
    ContentAppeared, PeerEvent, PeerMessage, SearchActiveChanged, SearchSubmitted,
    SearchTextChanged, SelectionChanged,
};
pub use icon::{GlyphData, IconKind, IconProxy, IconSpec, RenderMode, RenderedIcon, Tint};
pub use snapshot::{
    ButtonSnapshot, ButtonStyle, EdgeInsets, SearchSnapshot, TabBarSnapshot, TabItem,
    TabItemSnapshot, TabLayout,
};
