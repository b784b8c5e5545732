//! 8-hour epoch arithmetic.
//!
//! Share locations rotate once per epoch. The epoch index is derived from
//! wall-clock time, so every node in the network agrees on it up to clock
//! skew; recovery tolerates one epoch of skew in either direction.

/// Epoch duration in seconds (8 hours).
pub const EPOCH_RANGE_SECS: u64 = 8 * 60 * 60;

/// Epoch duration in hours.
pub const EPOCH_RANGE_HOURS: u64 = 8;

/// The current epoch index.
pub fn current_epoch() -> u64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    now / EPOCH_RANGE_SECS
}

/// The epoch index for a given Unix timestamp.
pub fn epoch_at(unix_secs: u64) -> u64 {
    unix_secs / EPOCH_RANGE_SECS
}

/// Seconds until the next epoch boundary.
pub fn seconds_until_next_epoch() -> u64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    EPOCH_RANGE_SECS - (now % EPOCH_RANGE_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_epoch_is_plausible() {
        // More than 3 epochs a day since 1970.
        assert!(current_epoch() > 50_000);
    }

    #[test]
    fn test_epoch_at_boundaries() {
        assert_eq!(epoch_at(0), 0);
        assert_eq!(epoch_at(EPOCH_RANGE_SECS - 1), 0);
        assert_eq!(epoch_at(EPOCH_RANGE_SECS), 1);
        assert_eq!(epoch_at(3 * EPOCH_RANGE_SECS + 17), 3);
    }

    #[test]
    fn test_seconds_until_next() {
        let secs = seconds_until_next_epoch();
        assert!(secs > 0);
        assert!(secs <= EPOCH_RANGE_SECS);
    }
}
