//! Error types for routeros-client.

use thiserror::Error;

/// Main error type for all RouterOS API operations.
#[derive(Debug, Error)]
pub enum RouterOsError {
    /// I/O error while connecting to or talking to the device.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection closed (or timed out) before a full reply arrived.
    #[error("connection closed")]
    ConnectionClosed,

    /// Malformed framing or a corrupted reply stream.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The device rejected the login credentials.
    #[error("login rejected: {0}")]
    Authentication(String),

    /// The device asked for the pre-6.43 challenge-response login,
    /// which this client does not speak.
    #[error("unsupported auth scheme: device requested challenge-response login")]
    UnsupportedAuthScheme,
}

/// Result type alias using RouterOsError.
pub type Result<T> = std::result::Result<T, RouterOsError>;
