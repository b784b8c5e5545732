//! # cinder-types
//!
//! Shared domain types for the Cinder DHT: the 160-bit node/key identifier
//! and the network contact record. Everything here is plain data, freely
//! copyable and serializable for the wire.

pub mod contact;
pub mod id;

pub use contact::Contact;
pub use id::KadId;

/// Identifier width in bytes.
pub const ID_BYTES: usize = 20;

/// Identifier width in bits (one routing bucket per bit).
pub const ID_BITS: usize = 160;

/// Error types for identifier parsing.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    /// The textual form is not 40 hex characters.
    #[error("invalid identifier hex: {0}")]
    InvalidHex(String),
}

/// Convenience result type for this crate.
pub type Result<T> = std::result::Result<T, TypeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(ID_BYTES, 20);
        assert_eq!(ID_BITS, 8 * ID_BYTES);
    }
}
