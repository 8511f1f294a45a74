//! # mirrorview-sync - Synchronization Layer
//!
//! Orchestrates native peers from declarative state: the diff-driven
//! [`SyncController`], the tab bar + search state machine, the icon
//! resolution seam, and settings loading.
//!
//! The layering mirrors the workspace: `mirrorview-core` defines snapshots
//! and diffs, `mirrorview-channel` moves typed commands and events over the
//! wire, and this crate decides *when* to do either. Backend choice
//! (native vs emulated) happens once per mount; everything above the
//! [`controller::Backend`] enum behaves identically on both, which the
//! parity suite under `tests/` asserts.

pub mod config;
pub mod controller;
pub mod resolver;
pub mod search;
pub mod tab_bar;

pub use config::SyncSettings;
pub use controller::{Backend, IntrinsicSize, PeerConnector, SyncController, SyncPhase};
pub use resolver::{resolve_pixel_density_variant, CachingResolver, IconResolver};
pub use search::{
    EmulatedSearchEffector, LocalSearchEffector, NativeSearchEffector, SearchChange, SearchCore,
    SearchEffector,
};
pub use tab_bar::{SingleBindingConnector, TabBarChange, TabBarController, TabBarEffector};
