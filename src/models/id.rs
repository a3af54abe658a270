//! Reminder identifier generation.
//!
//! IDs have the form `{unix_millis}-{8 hex chars}`, e.g. `1768773271812-7727a989`.
//! The millisecond prefix makes IDs minted by one process sort roughly by
//! creation time; the random suffix keeps two IDs minted in the same
//! millisecond apart. The format doubles as the storage key in the log file
//! and must not change.

use crate::{Error, Result};
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Number of random bytes in the suffix (rendered as twice as many hex chars).
const SUFFIX_BYTES: usize = 4;

/// Highest millisecond value handed out so far in this process.
static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Current wall-clock milliseconds, clamped so it never runs backwards
/// within the process.
fn monotonic_millis() -> i64 {
    let now = Utc::now().timestamp_millis();
    let prev = LAST_MILLIS.fetch_max(now, Ordering::SeqCst);
    prev.max(now)
}

/// Generate a new reminder ID.
///
/// # Panics
///
/// Panics if the operating system's random source is unavailable. There is
/// no sensible way to continue minting identifiers without it.
pub fn generate_id() -> String {
    let mut bytes = [0u8; SUFFIX_BYTES];
    getrandom::getrandom(&mut bytes).expect("OS random source unavailable");

    let suffix: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}-{}", monotonic_millis(), suffix)
}

/// Validate that an ID matches the `{millis}-{8 hex}` format.
///
/// Advisory only: the local log stores any non-empty ID, and the CLI warns
/// rather than rejects when a local ID fails this check. Remote backends hand
/// out their own identifiers.
pub fn validate_id(id: &str) -> Result<()> {
    let Some((millis, suffix)) = id.split_once('-') else {
        return Err(Error::InvalidId(format!(
            "ID must look like <millis>-<hex>, got: {}",
            id
        )));
    };

    if millis.is_empty() || !millis.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidId(format!(
            "ID prefix must be a millisecond timestamp, got: {}",
            millis
        )));
    }

    if suffix.len() != SUFFIX_BYTES * 2 || !suffix.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidId(format!(
            "ID suffix must be {} hex characters, got: {}",
            SUFFIX_BYTES * 2,
            suffix
        )));
    }

    Ok(())
}
