//! Synchronization error types with fatal/transient classification

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Peer Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to create native peer: {message}")]
    PeerCreation { message: String },

    #[error("Peer call failed: {message}")]
    PeerCall { message: String },

    #[error("Peer protocol error: {message}")]
    Protocol { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel send error: {message}")]
    ChannelSend { message: String },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    // ─────────────────────────────────────────────────────────────
    // Asset/Icon Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Asset not found: {path}")]
    AssetNotFound { path: String },

    #[error("Asset resolution error: {message}")]
    AssetResolution { message: String },

    // ─────────────────────────────────────────────────────────────
    // Capability Probe Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Platform capability probe failed: {message}")]
    CapabilityProbe { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file not found: {path:?}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn peer_creation(message: impl Into<String>) -> Self {
        Self::PeerCreation {
            message: message.into(),
        }
    }

    pub fn peer_call(message: impl Into<String>) -> Self {
        Self::PeerCall {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    pub fn asset_not_found(path: impl Into<String>) -> Self {
        Self::AssetNotFound { path: path.into() }
    }

    pub fn asset_resolution(message: impl Into<String>) -> Self {
        Self::AssetResolution {
            message: message.into(),
        }
    }

    pub fn capability_probe(message: impl Into<String>) -> Self {
        Self::CapabilityProbe {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error is fatal to the widget instance it came from.
    ///
    /// A fatal error forces a remount on the emulated backend; everything
    /// else is logged and the last known good state is kept.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::PeerCreation { .. })
    }

    /// Check if this is a transient error that callers swallow after logging
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::PeerCall { .. }
                | Error::Protocol { .. }
                | Error::ChannelSend { .. }
                | Error::ChannelClosed
                | Error::AssetNotFound { .. }
                | Error::AssetResolution { .. }
                | Error::CapabilityProbe { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::peer_creation("host refused to allocate view");
        assert_eq!(
            err.to_string(),
            "Failed to create native peer: host refused to allocate view"
        );

        let err = Error::asset_not_found("icons/house.png");
        assert!(err.to_string().contains("icons/house.png"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_peer_creation_is_fatal() {
        assert!(Error::peer_creation("no view").is_fatal());
        assert!(!Error::peer_call("raced dispose").is_fatal());
        assert!(!Error::capability_probe("probe crashed").is_fatal());
    }

    #[test]
    fn test_transient_errors_are_recoverable() {
        assert!(Error::peer_call("raced dispose").is_recoverable());
        assert!(Error::protocol("bad frame").is_recoverable());
        assert!(Error::channel_send("peer channel").is_recoverable());
        assert!(Error::asset_resolution("corrupt png").is_recoverable());
        assert!(!Error::peer_creation("no view").is_recoverable());
    }

    #[test]
    fn test_error_constructors() {
        let _ = Error::peer_creation("test");
        let _ = Error::peer_call("test");
        let _ = Error::protocol("test");
        let _ = Error::channel_send("test");
        let _ = Error::asset_not_found("test");
        let _ = Error::asset_resolution("test");
        let _ = Error::capability_probe("test");
        let _ = Error::config("test");
    }
}
