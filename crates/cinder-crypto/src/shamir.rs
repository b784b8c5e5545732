//! Threshold secret sharing over GF(2^8).
//!
//! Wraps [`sharks`]: a secret is split into `n` shares of which any `t`
//! reconstruct it by Lagrange interpolation, while fewer than `t` carry no
//! information about it. Shares are keyed by their non-zero x-coordinate
//! (the share index); the y-vector has the secret's length.

use std::collections::BTreeMap;

use sharks::{Share, Sharks};

use crate::{CryptoError, Result};

/// Split `secret` into `count` shares, any `threshold` of which reconstruct it.
///
/// Returns a map from share index to share bytes. Indices are the polynomial
/// x-coordinates and start at 1.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidThreshold`] unless `0 < threshold <= count`.
pub fn split(count: u8, threshold: u8, secret: &[u8]) -> Result<BTreeMap<u8, Vec<u8>>> {
    if threshold == 0 || threshold > count {
        return Err(CryptoError::InvalidThreshold { threshold, count });
    }

    let sharks = Sharks(threshold);
    let dealer = sharks.dealer(secret);

    let mut shares = BTreeMap::new();
    for share in dealer.take(count as usize) {
        let raw = Vec::from(&share);
        // First byte of the serialized share is its x-coordinate.
        if let Some((&index, body)) = raw.split_first() {
            shares.insert(index, body.to_vec());
        }
    }

    if shares.len() < count as usize {
        return Err(CryptoError::Split(format!(
            "dealer produced {} of {count} shares",
            shares.len()
        )));
    }

    Ok(shares)
}

/// Reconstruct a secret from the given shares.
///
/// Callers are responsible for supplying at least the threshold used at
/// split time; interpolating fewer shares yields an unrelated byte string,
/// not an error.
///
/// # Errors
///
/// Returns [`CryptoError::Combine`] if the shares are empty, malformed, or
/// of mismatched lengths.
pub fn combine(shares: &BTreeMap<u8, Vec<u8>>) -> Result<Vec<u8>> {
    if shares.is_empty() {
        return Err(CryptoError::Combine("no shares supplied".to_string()));
    }

    let parsed = shares
        .iter()
        .map(|(index, body)| {
            let mut raw = Vec::with_capacity(1 + body.len());
            raw.push(*index);
            raw.extend_from_slice(body);
            Share::try_from(raw.as_slice())
        })
        .collect::<std::result::Result<Vec<Share>, _>>()
        .map_err(|e| CryptoError::Combine(e.to_string()))?;

    let count = u8::try_from(parsed.len())
        .map_err(|_| CryptoError::Combine("more than 255 shares".to_string()))?;

    Sharks(count)
        .recover(&parsed)
        .map_err(|e| CryptoError::Combine(e.to_string()))
}
