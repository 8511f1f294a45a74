//! Peer handle lifecycle and invocation
//!
//! A [`PeerHandle`] owns exactly one hosted native view: one outbound line
//! channel, one request tracker, one inbound event stream. Lifecycle is
//! uncreated -> created (create acknowledged, full initial snapshot pushed)
//! -> active (receives diffs) -> disposed (no further wire calls; post-
//! dispose invokes resolve as silent no-ops so async callers can race a
//! teardown safely).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::commands::PeerCommand;
use crate::protocol::parse_peer_message;
use crate::requests::{InvokeResponse, RequestTracker};
use mirrorview_core::prelude::*;
use mirrorview_core::{PeerEvent, PeerMessage};

/// Default timeout for value-returning invokes
pub const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for peer creation (view allocation can be slow on a cold
/// process)
pub const DEFAULT_CREATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Line channels binding a handle to one hosted native view.
///
/// The embedder supplies the transport; the handle only assumes an ordered,
/// reliable line stream in each direction.
pub struct PeerBinding {
    pub outbound_tx: mpsc::Sender<String>,
    pub inbound_rx: mpsc::Receiver<String>,
}

/// Handle to a single native peer view
pub struct PeerHandle {
    /// Opaque identifier assigned by the host at creation time
    peer_id: String,
    /// Sender for outbound command lines
    outbound_tx: mpsc::Sender<String>,
    /// Matches responses to in-flight invokes
    tracker: Arc<RequestTracker>,
    /// Inbound interaction events, taken once by the owning controller
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<PeerEvent>>>,
    /// Set by `dispose()`; checked before every wire call
    disposed: Arc<AtomicBool>,
    /// Tells the inbound reader task to stop and close the event stream
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl PeerHandle {
    /// Allocate the native peer with its full initial parameter set.
    ///
    /// The create call is always complete, never partial: the peer must be
    /// able to render from these params alone. Failure is fatal to this
    /// widget instance; the caller falls back to the emulated backend.
    pub async fn create(binding: PeerBinding, create_params: Value) -> Result<PeerHandle> {
        Self::create_with_timeout(binding, create_params, DEFAULT_CREATE_TIMEOUT).await
    }

    pub async fn create_with_timeout(
        binding: PeerBinding,
        create_params: Value,
        timeout: Duration,
    ) -> Result<PeerHandle> {
        let PeerBinding {
            outbound_tx,
            inbound_rx,
        } = binding;

        let tracker = Arc::new(RequestTracker::new());
        let (event_tx, events_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();

        tokio::spawn(Self::inbound_reader(
            inbound_rx,
            Arc::clone(&tracker),
            event_tx,
            stop_rx,
        ));

        let (id, response_rx) = tracker.register().await;
        let command = PeerCommand::Create {
            params: create_params,
        };
        let line = format!("[{}]", command.build(id));

        outbound_tx
            .send(line)
            .await
            .map_err(|_| Error::peer_creation("peer channel closed before create"))?;

        let response = tokio::time::timeout(timeout, response_rx)
            .await
            .map_err(|_| Error::peer_creation(format!("create timed out after {:?}", timeout)))?
            .map_err(|_| Error::peer_creation("create request cancelled"))?;

        if !response.success {
            return Err(Error::peer_creation(
                response
                    .error
                    .unwrap_or_else(|| "host rejected create".to_string()),
            ));
        }

        let peer_id = response
            .result
            .as_ref()
            .and_then(|r| r.get("peerId"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        info!("Peer created: {:?}", peer_id);

        Ok(Self {
            peer_id,
            outbound_tx,
            tracker,
            events_rx: Mutex::new(Some(events_rx)),
            disposed: Arc::new(AtomicBool::new(false)),
            stop_tx: Mutex::new(Some(stop_tx)),
        })
    }

    /// Background task: parses inbound lines, routing responses to the
    /// tracker and interaction events to the event stream.
    ///
    /// Events for one peer stay ordered: a single reader, a single
    /// unbounded stream, no re-queueing.
    async fn inbound_reader(
        mut inbound_rx: mpsc::Receiver<String>,
        tracker: Arc<RequestTracker>,
        event_tx: mpsc::UnboundedSender<PeerEvent>,
        mut stop_rx: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                line = inbound_rx.recv() => {
                    let Some(line) = line else {
                        debug!("peer channel closed");
                        break;
                    };
                    trace!("peer: {}", line);
                    match parse_peer_message(&line) {
                        Some(PeerMessage::Response { id, result, error }) => {
                            let Some(id) = id.as_u64() else {
                                warn!("response with non-numeric id: {}", id);
                                continue;
                            };
                            if !tracker.complete(id, result, error).await {
                                debug!("unmatched response #{}", id);
                            }
                        }
                        Some(message) => {
                            if event_tx.send(PeerEvent::now(message)).is_err() {
                                debug!("event stream dropped by owner");
                                break;
                            }
                        }
                        None => trace!("ignoring non-protocol line"),
                    }
                }
                _ = &mut stop_rx => {
                    debug!("peer handle disposed, stopping reader");
                    break;
                }
            }
        }
    }

    /// Send a command and wait for its response.
    ///
    /// Safe to call after `dispose()`: resolves immediately as a no-op
    /// without touching the wire.
    pub async fn invoke(&self, command: PeerCommand) -> Result<InvokeResponse> {
        self.invoke_with_timeout(command, DEFAULT_INVOKE_TIMEOUT).await
    }

    pub async fn invoke_with_timeout(
        &self,
        command: PeerCommand,
        timeout: Duration,
    ) -> Result<InvokeResponse> {
        if self.is_disposed() {
            trace!("invoke after dispose: {} (no-op)", command.description());
            return Ok(InvokeResponse::no_op());
        }

        let (id, response_rx) = self.tracker.register().await;
        let line = format!("[{}]", command.build(id));

        debug!("Sending #{}: {}", id, command.description());

        if self.outbound_tx.send(line).await.is_err() {
            return if self.is_disposed() {
                Ok(InvokeResponse::no_op())
            } else {
                Err(Error::channel_send("peer channel"))
            };
        }

        match tokio::time::timeout(timeout, response_rx).await {
            Ok(Ok(response)) => {
                debug!("Invoke #{} completed: success={}", id, response.success);
                Ok(response)
            }
            Ok(Err(_)) => {
                // Oneshot dropped: dispose cancelled us mid-flight
                if self.is_disposed() {
                    Ok(InvokeResponse::no_op())
                } else {
                    Err(Error::peer_call("invoke cancelled"))
                }
            }
            Err(_) => {
                self.tracker.sweep_stale(Duration::ZERO).await;
                Err(Error::peer_call(format!(
                    "'{}' timed out after {:?}",
                    command.description(),
                    timeout
                )))
            }
        }
    }

    /// Send a fire-and-forget command (no response expected)
    pub async fn fire_and_forget(&self, command: PeerCommand) -> Result<()> {
        if self.is_disposed() {
            trace!(
                "fire-and-forget after dispose: {} (no-op)",
                command.description()
            );
            return Ok(());
        }

        let id = crate::requests::next_request_id();
        let line = format!("[{}]", command.build(id));

        debug!("Sending fire-and-forget #{}: {}", id, command.description());

        self.outbound_tx
            .send(line)
            .await
            .map_err(|_| Error::channel_send("peer channel"))
    }

    /// Take the inbound event stream. Yields `Some` exactly once.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<PeerEvent>> {
        self.events_rx.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Opaque peer identifier assigned at creation
    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Dispose this handle. Idempotent.
    ///
    /// Stops the inbound reader (closing the event stream), cancels pending
    /// requests so their waiters resolve, and marks the handle so any
    /// subsequent `invoke` is a silent no-op. In-flight calls on the host
    /// side are allowed to complete; their results are discarded.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            debug!("dispose called twice for peer {:?}", self.peer_id);
            return;
        }

        info!("Disposing peer {:?}", self.peer_id);

        self.send_stop();
        self.tracker.cancel_all().await;
    }

    fn send_stop(&self) {
        if let Ok(mut slot) = self.stop_tx.lock() {
            if let Some(tx) = slot.take() {
                let _ = tx.send(());
            }
        }
    }
}

impl Drop for PeerHandle {
    fn drop(&mut self) {
        if !self.is_disposed() {
            warn!("PeerHandle dropped without dispose, stopping reader");
            self.disposed.store(true, Ordering::Release);
            self.send_stop();
        }
    }
}

impl std::fmt::Debug for PeerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerHandle")
            .field("peer_id", &self.peer_id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
