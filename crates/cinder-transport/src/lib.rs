//! # cinder-transport
//!
//! Wire transport for the Cinder DHT.
//!
//! This crate provides:
//!
//! - **CBOR serialization** helpers via [`cbor`]
//! - **RPC message types** for the four DHT operations via [`messages`]
//! - **Length-prefixed TCP framing**, the dial-call-close client and the
//!   accept-loop server via [`tcp`]
//!
//! ## Architecture
//!
//! ```text
//! Node core (handlers, client stubs)
//!     |
//!     v
//! RpcRequest / RpcResponse (messages.rs)  -- CBOR-encoded payloads
//!     |
//!     v
//! [len: u32 LE][cbor bytes] (tcp.rs)      -- one frame per direction
//!     |
//!     v
//! TCP socket                              -- ephemeral, dial-call-close
//! ```

pub mod cbor;
pub mod messages;
pub mod tcp;

/// Error types for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// CBOR serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// CBOR deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Protocol violation (oversized frame, mismatched message id, etc.).
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// The remote peer could not be dialed.
    #[error("connection error: {0}")]
    Connection(String),

    /// The call did not complete within its deadline.
    #[error("call timed out")]
    Timeout,

    /// I/O error (socket read/write).
    #[error("I/O error: {0}")]
    Io(String),
}

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransportError::Serialization("test".to_string());
        assert_eq!(err.to_string(), "serialization error: test");
        assert_eq!(TransportError::Timeout.to_string(), "call timed out");
    }
}
