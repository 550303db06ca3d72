//! ETA arithmetic.

use std::time::Duration;

/// Seconds until `target_index` is reached from `cursor_index`.
///
/// One path index is consumed per tick, so this is
/// `max(0, ceil((target − cursor) × tick_ms / 1000))`.
pub fn eta_seconds(target_index: usize, cursor_index: usize, tick_interval: Duration) -> u64 {
    let ticks = target_index.saturating_sub(cursor_index) as u128;
    let millis = ticks * tick_interval.as_millis();
    millis.div_ceil(1000) as u64
}
