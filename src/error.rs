//! Error types for the YS-protocol codec and upload session.
//!
//! Codec errors are raised before any byte of a packet is produced, so a
//! caller never sees a half-built packet. Session errors describe why a
//! transfer stopped; the device may be left mid-upload and must be driven
//! through a fresh session from `Reset`.
//!
//! ## Error Categories
//!
//! - **Parameter Errors**: out-of-range brightness, malformed colors or coordinates
//! - **Payload Errors**: nothing to encode, or a payload too large for one transfer
//! - **Transport Errors**: the link rejected a write
//! - **Session Errors**: cancellation, strict-mode ack timeouts, misuse of a session
//! - **Configuration Errors**: unreadable or invalid session configuration
//!
//! ```rust
//! use ysled::ProtocolError;
//!
//! let error = ProtocolError::transport_failed("characteristic write rejected");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::time::Duration;
use thiserror::Error;

/// Result type alias for protocol operations.
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Main error type for codec and session operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProtocolError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Payload is empty; a transfer needs at least one chunk")]
    EmptyPayload,

    #[error("Point set is empty; nothing to draw")]
    EmptyPointSet,

    #[error("Payload needs {chunks} chunks, the device accepts at most {max}")]
    TooManyChunks { chunks: usize, max: usize },

    #[error("Transport write failed: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("No acknowledgment for chunk {chunk} within {timeout:?}")]
    AckTimeout { chunk: u16, timeout: Duration },

    #[error("Upload cancelled")]
    Cancelled,

    #[error("Session is {found}, expected {expected}")]
    SessionState { expected: String, found: String },

    #[error("Configuration error in {context}: {details}")]
    Config { context: String, details: String },
}

impl ProtocolError {
    /// Returns whether re-running the operation from a fresh session may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProtocolError::Transport { .. } => true,
            ProtocolError::AckTimeout { .. } => true,
            ProtocolError::Cancelled => true,
            ProtocolError::InvalidParameter { .. } => false,
            ProtocolError::EmptyPayload => false,
            ProtocolError::EmptyPointSet => false,
            ProtocolError::TooManyChunks { .. } => false,
            ProtocolError::SessionState { .. } => false,
            ProtocolError::Config { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ProtocolError::InvalidParameter { .. } => vec![
                "Check brightness is within 0-15",
                "Use hex colors such as #ff0000",
                "Ensure rectangle corners are ordered (x0 <= x1, y0 <= y1)",
            ],
            ProtocolError::EmptyPayload => vec![
                "Render the image container before uploading",
                "Check the encoder produced output",
            ],
            ProtocolError::EmptyPointSet => vec!["Provide at least one pixel to draw"],
            ProtocolError::TooManyChunks { .. } => vec![
                "Reduce frame count or palette size of the animation",
                "Lower the frame rate before encoding",
                "Keep containers at or below 49980 bytes",
            ],
            ProtocolError::Transport { .. } => vec![
                "Check the device is still connected",
                "Reconnect and start a new session from Reset",
                "Move closer to the device",
            ],
            ProtocolError::AckTimeout { .. } => vec![
                "Disable strict acknowledgments for lenient devices",
                "Increase the acknowledgment timeout",
                "Verify notifications are enabled on the notify characteristic",
            ],
            ProtocolError::Cancelled => vec![
                "Start a new session; the device holds a partial upload",
            ],
            ProtocolError::SessionState { .. } => vec![
                "Create a new session for every transfer",
            ],
            ProtocolError::Config { .. } => vec![
                "Check the configuration keys and value types",
                "Durations are given in milliseconds",
            ],
        }
    }

    /// Helper constructor for parameter validation errors.
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ProtocolError::InvalidParameter { name: name.into(), reason: reason.into() }
    }

    /// Helper constructor for transport failures.
    pub fn transport_failed(reason: impl Into<String>) -> Self {
        ProtocolError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport failures with source.
    pub fn transport_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        ProtocolError::Transport { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        ProtocolError::Config { context: context.into(), details: details.into() }
    }
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        ProtocolError::Transport { reason: err.to_string(), source: Some(Box::new(err)) }
    }
}

impl From<serde_yaml_ng::Error> for ProtocolError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        ProtocolError::Config { context: "YAML".to_string(), details: err.to_string() }
    }
}
