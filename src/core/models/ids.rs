//! Identifier generation for model entities

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Generate a fresh entity identifier
///
/// Combines the creation time with a process-wide sequence so ids created in
/// the same millisecond stay distinct.
#[must_use]
pub fn generate_id() -> String {
    let ts = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{ts:x}{seq:06x}")
}
