//! Route data model: an immutable path plus the stops placed along it.

use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::RouteError;
use crate::coord::{distance_meters, Coordinate};

/// Ordered, immutable sequence of coordinates.
///
/// Cloning is cheap: all clones share one allocation, so the traversed and
/// remaining parts of a journey are always views into the same data.
#[derive(Debug, Clone, PartialEq)]
pub struct Path(Arc<[Coordinate]>);

impl Path {
    /// Wraps a coordinate list. Requires at least two points.
    pub fn new(points: Vec<Coordinate>) -> Result<Self, RouteError> {
        if points.len() < 2 {
            return Err(RouteError::Malformed(format!(
                "path needs at least 2 points, got {}",
                points.len()
            )));
        }
        Ok(Self(points.into()))
    }

    /// Index of the final coordinate.
    pub fn last_index(&self) -> usize {
        self.0.len() - 1
    }

    /// The sub-range starting at `start` (empty if out of range).
    pub fn from_index(&self, start: usize) -> &[Coordinate] {
        self.0.get(start..).unwrap_or(&[])
    }

    /// Total great-circle length in meters.
    pub fn length_meters(&self) -> f64 {
        self.0
            .windows(2)
            .map(|w| distance_meters(&w[0], &w[1]))
            .sum()
    }
}

impl Deref for Path {
    type Target = [Coordinate];

    fn deref(&self) -> &[Coordinate] {
        &self.0
    }
}

/// A stop: an index into the path tagged with its ordinal (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopMarker {
    pub ordinal: u32,
    pub index: usize,
}

/// Ordered stops along a path.
///
/// Invariant: indices strictly increasing, each greater than zero and
/// smaller than the path length; ordinals strictly increasing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopSet(Vec<StopMarker>);

impl StopSet {
    /// Builds a stop set, checking it against a path of `path_len` points.
    pub fn new(stops: Vec<StopMarker>, path_len: usize) -> Result<Self, RouteError> {
        let mut previous: Option<&StopMarker> = None;
        for stop in &stops {
            if stop.index == 0 || stop.index >= path_len {
                return Err(RouteError::Malformed(format!(
                    "stop {} index {} outside 1..{}",
                    stop.ordinal, stop.index, path_len
                )));
            }
            if let Some(prev) = previous {
                if stop.index <= prev.index || stop.ordinal <= prev.ordinal {
                    return Err(RouteError::Malformed(format!(
                        "stop {} does not follow stop {}",
                        stop.ordinal, prev.ordinal
                    )));
                }
            }
            previous = Some(stop);
        }
        Ok(Self(stops))
    }

    /// An empty stop set (the journey runs straight to the destination).
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn as_slice(&self) -> &[StopMarker] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StopMarker> {
        self.0.iter()
    }
}

/// A resolved route: the path and its stops.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    path: Path,
    stops: StopSet,
}

impl Route {
    /// Pairs a path with stops, validating the stops against it.
    pub fn new(path: Path, stops: Vec<StopMarker>) -> Result<Self, RouteError> {
        let stops = StopSet::new(stops, path.len())?;
        Ok(Self { path, stops })
    }

    /// Builds a route whose stops are derived from fractional offsets.
    pub fn with_fractions(path: Path, fractions: &[f64]) -> Self {
        let stops = super::stops::derive_stops(path.len(), fractions);
        Self { path, stops }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stops(&self) -> &StopSet {
        &self.stops
    }

    /// Coordinates of every stop, in order.
    pub fn stop_positions(&self) -> Vec<(u32, Coordinate)> {
        self.stops
            .iter()
            .map(|s| (s.ordinal, self.path[s.index]))
            .collect()
    }

    pub fn length_meters(&self) -> f64 {
        self.path.length_meters()
    }
}
