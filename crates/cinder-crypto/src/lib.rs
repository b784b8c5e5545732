//! # cinder-crypto
//!
//! Cryptographic primitives for the Cinder self-destructing data layer.
//!
//! ## Modules
//!
//! - [`envelope`] — AES-256-CFB content encryption with a prepended IV
//! - [`shamir`] — threshold secret sharing over GF(2^8)

pub mod envelope;
pub mod shamir;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// A key or IV had the wrong length.
    #[error("invalid key or IV length")]
    InvalidKeyLength,

    /// The ciphertext is shorter than the prepended IV.
    #[error("ciphertext too short: {len} bytes, need at least {min}")]
    CiphertextTooShort { len: usize, min: usize },

    /// The share threshold does not satisfy `0 < t <= n`.
    #[error("invalid share threshold: t={threshold}, n={count}")]
    InvalidThreshold { threshold: u8, count: u8 },

    /// Secret splitting failed.
    #[error("secret split failed: {0}")]
    Split(String),

    /// Secret reconstruction failed.
    #[error("secret reconstruction failed: {0}")]
    Combine(String),
}

/// Convenience result type for cryptographic operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
