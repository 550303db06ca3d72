//! Stop placement from fractional offsets along a path.

use super::types::{StopMarker, StopSet};

/// Default stop positions: a quarter, half and three quarters of the way.
pub const DEFAULT_STOP_FRACTIONS: [f64; 3] = [0.25, 0.5, 0.75];

/// Derives stops from fractional offsets along a path of `path_len` points.
///
/// Each fraction maps to `floor(path_len * fraction)`. Indices that would be
/// zero, past the end, or not strictly after the previous stop are dropped,
/// so short paths simply get fewer stops. Ordinals are assigned 1..N after
/// filtering.
pub fn derive_stops(path_len: usize, fractions: &[f64]) -> StopSet {
    let mut stops: Vec<StopMarker> = Vec::with_capacity(fractions.len());

    for &fraction in fractions {
        if !fraction.is_finite() || fraction <= 0.0 {
            continue;
        }
        let index = (path_len as f64 * fraction).floor() as usize;
        if index == 0 || index >= path_len {
            continue;
        }
        if stops.last().is_some_and(|prev| index <= prev.index) {
            continue;
        }
        stops.push(StopMarker {
            ordinal: stops.len() as u32 + 1,
            index,
        });
    }

    // Filtering above upholds every StopSet invariant.
    StopSet::new(stops, path_len).unwrap_or_default()
}
