//! # mirrorview-channel - Peer Method Channel
//!
//! Async ordered method channel between the widget layer and a hosted
//! native view. Owns the JSON-RPC line protocol, request/response
//! tracking, outbound command construction, and the [`PeerHandle`]
//! lifecycle (create -> active -> disposed).
//!
//! Per peer, calls are strictly ordered: the handle serializes outbound
//! lines onto one channel and reads inbound lines on one task, so
//! responses and events arrive in the order the host produced them.
//!
//! The transport is abstract: the embedder supplies a [`PeerBinding`]
//! (one line channel each way) and the handle assumes nothing more than
//! ordered, reliable delivery.

pub mod commands;
pub mod handle;
pub mod protocol;
pub mod requests;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use commands::PeerCommand;
pub use handle::{PeerBinding, PeerHandle, DEFAULT_CREATE_TIMEOUT, DEFAULT_INVOKE_TIMEOUT};
pub use protocol::parse_peer_message;
pub use requests::{next_request_id, InvokeResponse, RequestTracker};
