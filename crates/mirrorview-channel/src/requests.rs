//! Request ID tracking for matching peer responses to in-flight invokes

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::{oneshot, RwLock};

/// Global request ID counter
static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique request ID
pub fn next_request_id() -> u64 {
    REQUEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A pending request awaiting response
struct PendingRequest {
    /// Channel to send the response
    response_tx: oneshot::Sender<InvokeResponse>,
    /// When this request was created
    created_at: Instant,
}

/// Response from an invoke call
#[derive(Debug, Clone)]
pub struct InvokeResponse {
    pub id: u64,
    pub success: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl InvokeResponse {
    pub fn from_peer_response(id: u64, result: Option<Value>, error: Option<Value>) -> Self {
        Self {
            id,
            success: error.is_none(),
            result,
            error: error.map(|e| match e {
                Value::String(s) => s,
                other => other.to_string(),
            }),
        }
    }

    /// Create a success response
    pub fn success(id: u64, result: Option<Value>) -> Self {
        Self {
            id,
            success: true,
            result,
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            result: None,
            error: Some(message.into()),
        }
    }

    /// Pre-resolved response for invokes against a disposed handle.
    ///
    /// Post-dispose calls never touch the wire and must not hang, so they
    /// resolve to this immediately.
    pub fn no_op() -> Self {
        Self {
            id: 0,
            success: true,
            result: None,
            error: None,
        }
    }
}

/// Tracks pending requests and matches responses
pub struct RequestTracker {
    /// Map of request ID to pending request
    pending: Arc<RwLock<HashMap<u64, PendingRequest>>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a new pending request
    /// Returns (request_id, receiver for response)
    pub async fn register(&self) -> (u64, oneshot::Receiver<InvokeResponse>) {
        let id = next_request_id();
        let (tx, rx) = oneshot::channel();

        let pending = PendingRequest {
            response_tx: tx,
            created_at: Instant::now(),
        };

        self.pending.write().await.insert(id, pending);

        (id, rx)
    }

    /// Handle an incoming response from the peer
    /// Returns true if the response was matched to a pending request
    pub async fn complete(&self, id: u64, result: Option<Value>, error: Option<Value>) -> bool {
        if let Some(pending) = self.pending.write().await.remove(&id) {
            let response = InvokeResponse::from_peer_response(id, result, error);
            let _ = pending.response_tx.send(response);
            true
        } else {
            false
        }
    }

    /// Cancel all pending requests (on dispose)
    pub async fn cancel_all(&self) {
        let mut pending = self.pending.write().await;
        for (id, req) in pending.drain() {
            let _ = req
                .response_tx
                .send(InvokeResponse::error(id, "Request cancelled"));
        }
    }

    /// Remove stale requests that have timed out
    pub async fn sweep_stale(&self, timeout: Duration) -> Vec<u64> {
        let mut pending = self.pending.write().await;
        let now = Instant::now();

        let stale: Vec<u64> = pending
            .iter()
            .filter(|(_, req)| now.duration_since(req.created_at) > timeout)
            .map(|(id, _)| *id)
            .collect();

        for id in &stale {
            if let Some(req) = pending.remove(id) {
                let _ = req
                    .response_tx
                    .send(InvokeResponse::error(*id, "Request timed out"));
            }
        }

        stale
    }

    /// Get the number of pending requests
    pub async fn pending_count(&self) -> usize {
        self.pending.read().await.len()
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}
