//! Test doubles for the peer channel
//!
//! Two levels of control: [`ScriptedPeer`] hands every outbound request to
//! the test for inspection and scripted replies, while [`RecordingPeer`]
//! auto-acknowledges everything and records the method names it saw. Both
//! speak the real bracketed line protocol.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::handle::PeerBinding;
use crate::protocol::strip_brackets;

/// Parse an outbound command line into (id, method, params)
pub fn parse_request(line: &str) -> Option<(u64, String, Value)> {
    let json = strip_brackets(line).unwrap_or(line);
    let value: Value = serde_json::from_str(json).ok()?;
    let id = value.get("id")?.as_u64()?;
    let method = value.get("method")?.as_str()?.to_string();
    let params = value.get("params").cloned().unwrap_or(Value::Null);
    Some((id, method, params))
}

/// A fake host peer driven explicitly by the test
pub struct ScriptedPeer {
    /// Taken by the test and handed to `PeerHandle::create`
    pub binding: Option<PeerBinding>,
    outbound_rx: mpsc::Receiver<String>,
    inbound_tx: mpsc::Sender<String>,
}

impl ScriptedPeer {
    pub fn new() -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(32);
        let (inbound_tx, inbound_rx) = mpsc::channel(32);

        Self {
            binding: Some(PeerBinding {
                outbound_tx,
                inbound_rx,
            }),
            outbound_rx,
            inbound_tx,
        }
    }

    /// Await the next outbound request and parse it
    pub async fn next_request(&mut self) -> Option<(u64, String, Value)> {
        let line = self.outbound_rx.recv().await?;
        parse_request(&line)
    }

    /// Non-blocking check for a queued outbound line
    pub fn try_next_line(&mut self) -> Option<String> {
        self.outbound_rx.try_recv().ok()
    }

    /// Reply to request `id` with a success result
    pub async fn respond_ok(&self, id: u64, result: Value) {
        let line = format!("[{}]", json!({ "id": id, "result": result }));
        let _ = self.inbound_tx.send(line).await;
    }

    /// Reply to request `id` with an error
    pub async fn respond_err(&self, id: u64, message: &str) {
        let line = format!("[{}]", json!({ "id": id, "error": message }));
        let _ = self.inbound_tx.send(line).await;
    }

    /// Emit an unsolicited interaction event
    pub async fn emit(&self, event: &str, params: Value) {
        let line = format!("[{}]", json!({ "event": event, "params": params }));
        let _ = self.inbound_tx.send(line).await;
    }
}

impl Default for ScriptedPeer {
    fn default() -> Self {
        Self::new()
    }
}

/// A fake host that acknowledges every request and records method names
#[derive(Clone)]
pub struct RecordingPeer {
    methods: Arc<Mutex<Vec<String>>>,
    inbound_tx: mpsc::Sender<String>,
}

impl RecordingPeer {
    /// Spawn the auto-ack loop, returning the binding for `PeerHandle::create`.
    ///
    /// `create` is answered with a fixed peer id, `getIntrinsicSize` with a
    /// plausible size, everything else with an empty result.
    pub fn spawn() -> (PeerBinding, RecordingPeer) {
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(32);
        let (inbound_tx, inbound_rx) = mpsc::channel(32);

        let peer = RecordingPeer {
            methods: Arc::new(Mutex::new(Vec::new())),
            inbound_tx: inbound_tx.clone(),
        };

        let recorded = Arc::clone(&peer.methods);
        tokio::spawn(async move {
            while let Some(line) = outbound_rx.recv().await {
                let Some((id, method, _params)) = parse_request(&line) else {
                    continue;
                };
                if let Ok(mut methods) = recorded.lock() {
                    methods.push(method.clone());
                }
                let result = match method.as_str() {
                    "create" => json!({ "peerId": "recording-peer" }),
                    "getIntrinsicSize" => json!({ "width": 320.0, "height": 49.0 }),
                    _ => json!({}),
                };
                let reply = format!("[{}]", json!({ "id": id, "result": result }));
                if inbound_tx.send(reply).await.is_err() {
                    break;
                }
            }
        });

        let binding = PeerBinding {
            outbound_tx,
            inbound_rx,
        };
        (binding, peer)
    }

    /// Method names seen so far, in arrival order
    pub fn methods(&self) -> Vec<String> {
        self.methods
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Count of calls to one method
    pub fn count_of(&self, method: &str) -> usize {
        self.methods().iter().filter(|m| m.as_str() == method).count()
    }

    /// Emit an unsolicited interaction event
    pub async fn emit(&self, event: &str, params: Value) {
        let line = format!("[{}]", json!({ "event": event, "params": params }));
        let _ = self.inbound_tx.send(line).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::PeerCommand;
    use crate::handle::PeerHandle;
    use serde_json::json;

    #[test]
    fn test_parse_request() {
        let line = r#"[{"id":3,"method":"setBadge","params":{"badge":5}}]"#;
        let (id, method, params) = parse_request(line).unwrap();
        assert_eq!(id, 3);
        assert_eq!(method, "setBadge");
        assert_eq!(params["badge"], 5);
    }

    #[tokio::test]
    async fn test_recording_peer_round_trip() {
        let (binding, peer) = RecordingPeer::spawn();
        let handle = PeerHandle::create(binding, json!({"label": "Home"}))
            .await
            .unwrap();

        let response = handle.invoke(PeerCommand::GetIntrinsicSize).await.unwrap();
        assert!(response.success);
        assert_eq!(response.result.unwrap()["width"], 320.0);

        assert_eq!(peer.methods(), vec!["create", "getIntrinsicSize"]);
        assert_eq!(peer.count_of("getIntrinsicSize"), 1);
        handle.dispose().await;
    }
}
