//! Index-based continuation of a journey segment.
//!
//! Rather than copying the untraversed tail of the path at each halt, a
//! continuation records where the remaining segment starts in the original
//! path and the stops still ahead, re-based so index 0 is that start.

use crate::coord::Coordinate;
use crate::route::{Path, StopMarker, StopSet};

/// The untraversed remainder of a journey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    /// Absolute path index of the first coordinate of the remainder.
    start_index: usize,

    /// Stops still ahead, with `index` relative to `start_index`.
    stops: Vec<StopMarker>,
}

impl Continuation {
    /// The whole journey: starts at index 0 with every stop ahead.
    pub fn from_start(stops: &StopSet) -> Self {
        Self {
            start_index: 0,
            stops: stops.as_slice().to_vec(),
        }
    }

    /// Absolute path index where this remainder begins.
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// Stops still ahead, re-based to [`Self::start_index`].
    pub fn stops(&self) -> &[StopMarker] {
        &self.stops
    }

    /// The first stop ahead, with its index converted back to absolute.
    pub fn next_stop(&self) -> Option<StopMarker> {
        self.stops.first().map(|s| StopMarker {
            ordinal: s.ordinal,
            index: self.start_index + s.index,
        })
    }

    /// The continuation after halting at the next stop located at `halt_index`.
    ///
    /// The new remainder begins right after the halt point; the stop just
    /// reached is dropped and the others are re-based.
    pub fn after_halt(&self, halt_index: usize) -> Self {
        let start_index = halt_index + 1;
        let stops = self
            .stops
            .iter()
            .skip(1)
            .map(|s| StopMarker {
                ordinal: s.ordinal,
                index: self.start_index + s.index - start_index,
            })
            .collect();
        Self { start_index, stops }
    }

    /// The remaining coordinates, borrowed from the original path.
    pub fn remaining_path<'a>(&self, path: &'a Path) -> &'a [Coordinate] {
        path.from_index(self.start_index)
    }
}
