//! # cinder-vanish
//!
//! Self-destructing data on top of the Cinder DHT.
//!
//! A piece of data is sealed into a [`VanishObject`]: the plaintext is
//! encrypted under a fresh content key, the key is threshold-split into N
//! shares, and the shares are scattered across DHT locations derived
//! pseudo-randomly from a public access key and the current 8-hour epoch.
//! Anyone holding the object (and reachable shares) can reassemble the key;
//! once enough shares have expired from the network, the plaintext is
//! irrecoverable.
//!
//! - [`epoch`] — 8-hour epoch arithmetic
//! - [`locations`] — deterministic epoch-indexed share placement
//! - [`object`] — the vanishing data object
//! - [`ops`] — seal, recover, and refresh operations

pub mod epoch;
pub mod locations;
pub mod object;
pub mod ops;

pub use object::VanishObject;
pub use ops::{refresh_once, spawn_refresh, unvanish_at_epoch, unvanish_data, vanish_data};

/// Error types for sealing data.
///
/// Recovery never errors: a miss of any kind comes back as `None`.
#[derive(Debug, thiserror::Error)]
pub enum VanishError {
    /// The share threshold does not satisfy `0 < t <= n`.
    #[error("invalid share parameters: t={threshold}, n={share_count}")]
    InvalidParameters {
        /// Requested share count.
        share_count: u8,
        /// Requested reconstruction threshold.
        threshold: u8,
    },

    /// A cryptographic primitive failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] cinder_crypto::CryptoError),
}

/// Convenience result type for sealing operations.
pub type Result<T> = std::result::Result<T, VanishError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VanishError::InvalidParameters {
            share_count: 3,
            threshold: 5,
        };
        assert!(err.to_string().contains("t=5"));
        assert!(err.to_string().contains("n=3"));
    }
}
