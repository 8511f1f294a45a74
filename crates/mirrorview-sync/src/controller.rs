//! Snapshot synchronization controller
//!
//! Owns one peer (native or emulated) for one control instance and drives
//! it through the phase cycle Unmounted -> Mounting -> Active <-> Reconciling
//! -> Disposing -> Unmounted. Reconciliation is diff-driven: the controller
//! never pushes a property the diff engine did not flag, and applies the
//! resulting ops strictly in order, awaiting each before the next so the
//! wire sees them in emission order.
//!
//! Error policy follows the taxonomy in `mirrorview_core::error`: creation
//! failures are fatal to the native attempt and force an emulated remount;
//! per-call failures during reconcile are logged and swallowed so one
//! dropped invoke cannot wedge the control.

use std::sync::Arc;

use tokio::sync::mpsc;

use mirrorview_channel::{PeerBinding, PeerCommand, PeerHandle};
use mirrorview_core::prelude::*;
use mirrorview_core::{capability, DiffResult, Diffable, PatchKind, PatchOp, PeerEvent};

use crate::config::SyncSettings;

/// Controller lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Unmounted,
    Mounting,
    Active,
    Reconciling,
    Disposing,
}

/// Which rendition is behind this controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Hosted native view behind a peer handle
    Native,
    /// In-process emulated rendition (no wire)
    Emulated,
}

/// Peer geometry, as reported by `getIntrinsicSize`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntrinsicSize {
    pub width: f64,
    pub height: f64,
}

/// Supplies the transport binding for a native peer at mount time.
///
/// The embedder owns the physical transport; the controller only asks for
/// a fresh binding when it decides to mount natively.
pub trait PeerConnector: Send + Sync {
    fn connect(&self) -> Result<PeerBinding>;
}

/// Drives one peer from successive snapshots of type `S`
pub struct SyncController<S: Diffable> {
    settings: SyncSettings,
    connector: Box<dyn PeerConnector>,
    /// Per-widget OS-family flag; native is only attempted when both this
    /// and the process-wide capability gate allow it
    native_supported: bool,

    phase: SyncPhase,
    backend: Backend,
    handle: Option<Arc<PeerHandle>>,
    current: Option<S>,
    last_known_size: Option<IntrinsicSize>,
    /// Patch kinds applied in the last reconcile pass, in emission order.
    /// Recorded identically for both backends.
    applied_kinds: Vec<PatchKind>,
}

impl<S: Diffable> SyncController<S> {
    pub fn new(
        settings: SyncSettings,
        connector: Box<dyn PeerConnector>,
        native_supported: bool,
    ) -> Self {
        Self {
            settings,
            connector,
            native_supported,
            phase: SyncPhase::Unmounted,
            backend: Backend::Emulated,
            handle: None,
            current: None,
            last_known_size: None,
            applied_kinds: Vec::new(),
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn snapshot(&self) -> Option<&S> {
        self.current.as_ref()
    }

    /// Patch kinds applied by the most recent reconcile pass
    pub fn applied_kinds(&self) -> &[PatchKind] {
        &self.applied_kinds
    }

    /// Shared handle for collaborators that invoke directly (search effector)
    pub fn handle(&self) -> Option<Arc<PeerHandle>> {
        self.handle.clone()
    }

    /// Last reported peer size, or the configured placeholder before the
    /// first answer arrives
    pub fn intrinsic_size(&self) -> IntrinsicSize {
        self.last_known_size.unwrap_or(IntrinsicSize {
            width: self.settings.layout.placeholder_width,
            height: self.settings.layout.placeholder_height,
        })
    }

    /// Inbound interaction events (native backend only). Yields `Some`
    /// exactly once per mount.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<PeerEvent>> {
        self.handle.as_ref().and_then(|h| h.take_events())
    }

    /// Mount the control from its first snapshot.
    ///
    /// Backend choice happens here and only here: the process-wide
    /// capability gate plus the per-widget flag. A native creation failure
    /// is fatal to the native attempt, never to the control: the mount
    /// falls back to the emulated rendition.
    pub async fn mount(&mut self, snapshot: S) {
        if self.phase != SyncPhase::Unmounted {
            warn!("mount called in phase {:?}, ignoring", self.phase);
            return;
        }
        self.phase = SyncPhase::Mounting;

        let want_native = self.native_supported && capability::is_native_mode_available();
        self.backend = Backend::Emulated;
        self.handle = None;

        if want_native {
            match self.create_native(&snapshot).await {
                Ok(handle) => {
                    self.backend = Backend::Native;
                    self.handle = Some(Arc::new(handle));
                }
                Err(e) => {
                    warn!("Native peer creation failed ({}), remounting emulated", e);
                }
            }
        } else {
            debug!("Mounting emulated (native_supported={})", self.native_supported);
        }

        self.current = Some(snapshot);
        self.phase = SyncPhase::Active;
        self.refresh_intrinsic_size().await;
    }

    async fn create_native(&self, snapshot: &S) -> Result<PeerHandle> {
        let binding = self.connector.connect()?;
        PeerHandle::create_with_timeout(
            binding,
            snapshot.create_params(),
            self.settings.timing.create_timeout(),
        )
        .await
    }

    /// Reconcile the peer against a new snapshot.
    ///
    /// Equal snapshots produce zero wire calls. Ops are applied one at a
    /// time, awaited, in the diff engine's emission order. At most one
    /// trailing intrinsic-size query follows the pass, and only when some
    /// applied op could have changed geometry.
    pub async fn update(&mut self, snapshot: S) {
        match self.phase {
            SyncPhase::Active => {}
            SyncPhase::Unmounted => {
                debug!("update before mount, mounting instead");
                self.mount(snapshot).await;
                return;
            }
            phase => {
                warn!("update called in phase {:?}, ignoring", phase);
                return;
            }
        }
        self.phase = SyncPhase::Reconciling;
        self.applied_kinds.clear();

        let result = S::diff(self.current.as_ref(), &snapshot);
        let needs_size = match &result {
            DiffResult::Create => {
                // Unreachable while mounted; recover by treating the new
                // snapshot as current without a wire call.
                error!("diff produced Create for a mounted control");
                false
            }
            DiffResult::Patches(ops) => {
                let mut needs_size = false;
                for op in ops {
                    needs_size |= op.affects_intrinsic_size();
                    self.apply(op.clone()).await;
                }
                needs_size
            }
        };

        self.current = Some(snapshot);
        self.phase = SyncPhase::Active;

        if needs_size {
            self.refresh_intrinsic_size().await;
        }
    }

    /// Apply one op outside a diff pass (selection restore during search
    /// masking). Recorded like any reconcile op.
    pub async fn apply_op(&mut self, op: PatchOp) {
        self.apply(op).await;
    }

    /// Adopt a peer-initiated state as canonical without any wire call.
    ///
    /// Used when the change originated on the peer (a native selection
    /// event): the peer is already there, so diffing it back would only
    /// echo the write.
    pub fn adopt(&mut self, snapshot: S) {
        self.current = Some(snapshot);
    }

    async fn apply(&mut self, op: PatchOp) {
        self.applied_kinds.push(op.kind());

        let Some(handle) = &self.handle else {
            // Emulated rendition renders straight from the snapshot
            trace!("emulated apply: {:?}", op.kind());
            return;
        };

        let command = PeerCommand::from_patch(&op);
        match handle
            .invoke_with_timeout(command, self.settings.timing.invoke_timeout())
            .await
        {
            Ok(response) if !response.success => {
                warn!(
                    "Peer rejected {:?} patch: {}",
                    op.kind(),
                    response.error.unwrap_or_default()
                );
            }
            Ok(_) => {}
            Err(e) => {
                // Transient per-call failure; the next reconcile pass will
                // converge the peer again
                warn!("Peer call failed for {:?} patch: {}", op.kind(), e);
            }
        }
    }

    /// Single trailing size query per reconcile pass, after a short
    /// post-layout delay. An unanswered query keeps the last-known size.
    async fn refresh_intrinsic_size(&mut self) {
        let Some(handle) = &self.handle else {
            return;
        };

        tokio::time::sleep(self.settings.timing.intrinsic_size_delay()).await;

        match handle
            .invoke_with_timeout(
                PeerCommand::GetIntrinsicSize,
                self.settings.timing.invoke_timeout(),
            )
            .await
        {
            Ok(response) if response.success => {
                let size = response.result.as_ref().and_then(|r| {
                    Some(IntrinsicSize {
                        width: r.get("width")?.as_f64()?,
                        height: r.get("height")?.as_f64()?,
                    })
                });
                match size {
                    Some(size) => {
                        trace!("Intrinsic size: {}x{}", size.width, size.height);
                        self.last_known_size = Some(size);
                    }
                    None => debug!("Malformed size result, keeping last known"),
                }
            }
            Ok(response) => {
                debug!(
                    "Size query rejected ({}), keeping last known",
                    response.error.unwrap_or_default()
                );
            }
            Err(e) => {
                debug!("Size query failed ({}), keeping last known", e);
            }
        }
    }

    /// Tear down the peer. Idempotent; safe to call in any phase.
    pub async fn dispose(&mut self) {
        if self.phase == SyncPhase::Unmounted {
            return;
        }
        self.phase = SyncPhase::Disposing;

        if let Some(handle) = self.handle.take() {
            handle.dispose().await;
        }
        self.current = None;
        self.applied_kinds.clear();
        self.phase = SyncPhase::Unmounted;
    }
}
