//! Route provider trait and the offline straight-line provider.

use std::future::Future;

use super::error::RouteError;
use super::stops::DEFAULT_STOP_FRACTIONS;
use super::types::{Path, Route};
use crate::coord::{interpolate, Coordinate};

/// Resolves an origin/destination pair into a route with stops.
///
/// Implementations hold no journey state. No retries happen at this layer;
/// the caller decides what to do with a [`RouteError::RouteUnavailable`].
pub trait RouteProvider: Send + Sync {
    /// Resolve the route between two coordinates.
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> impl Future<Output = Result<Route, RouteError>> + Send;
}

/// Offline provider that interpolates evenly spaced points on a straight line.
///
/// Used when no routing service is reachable and in tests, where a path of
/// an exact length is needed.
#[derive(Debug, Clone)]
pub struct StraightLineRouteProvider {
    points: usize,
    stop_fractions: Vec<f64>,
}

impl StraightLineRouteProvider {
    /// Create a provider producing `points` coordinates per route.
    pub fn new(points: usize) -> Self {
        Self {
            points,
            stop_fractions: DEFAULT_STOP_FRACTIONS.to_vec(),
        }
    }

    /// Override the fractional stop offsets.
    pub fn with_stop_fractions(mut self, fractions: Vec<f64>) -> Self {
        self.stop_fractions = fractions;
        self
    }

    /// Build the route synchronously.
    pub fn build(&self, origin: Coordinate, destination: Coordinate) -> Result<Route, RouteError> {
        if self.points < 2 {
            return Err(RouteError::RouteUnavailable(format!(
                "straight-line route needs at least 2 points, configured {}",
                self.points
            )));
        }

        let steps = (self.points - 1) as f64;
        let coords = (0..self.points)
            .map(|i| interpolate(&origin, &destination, i as f64 / steps))
            .collect();

        Ok(Route::with_fractions(Path::new(coords)?, &self.stop_fractions))
    }
}

impl RouteProvider for StraightLineRouteProvider {
    async fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Route, RouteError> {
        self.build(origin, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Coordinate {
        Coordinate::new(12.907609209246655, 77.47634064715605).unwrap()
    }

    fn destination() -> Coordinate {
        Coordinate::new(12.86377436214521, 77.43479290230692).unwrap()
    }

    #[tokio::test]
    async fn test_straight_line_has_requested_points_and_stops() {
        let provider = StraightLineRouteProvider::new(100);
        let route = provider.route(origin(), destination()).await.unwrap();

        assert_eq!(route.path().len(), 100);
        assert_eq!(route.path()[0], origin());
        assert_eq!(route.path()[99], destination());

        let stops: Vec<usize> = route.stops().iter().map(|s| s.index).collect();
        assert_eq!(stops, vec![25, 50, 75]);
    }

    #[test]
    fn test_straight_line_custom_fractions() {
        let provider = StraightLineRouteProvider::new(20).with_stop_fractions(vec![0.5]);
        let route = provider.build(origin(), destination()).unwrap();
        assert_eq!(route.stops().len(), 1);
        assert_eq!(route.stops().as_slice()[0].index, 10);
    }

    #[test]
    fn test_straight_line_without_stops() {
        let provider = StraightLineRouteProvider::new(20).with_stop_fractions(Vec::new());
        let route = provider.build(origin(), destination()).unwrap();
        assert!(route.stops().is_empty());
    }

    #[test]
    fn test_too_few_points_is_unavailable() {
        let provider = StraightLineRouteProvider::new(1);
        let result = provider.build(origin(), destination());
        assert!(matches!(result, Err(RouteError::RouteUnavailable(_))));
    }

    #[test]
    fn test_route_length_is_positive() {
        let route = StraightLineRouteProvider::new(50)
            .build(origin(), destination())
            .unwrap();
        // Roughly 6.6 km between the two default endpoints
        let km = route.length_meters() / 1000.0;
        assert!(km > 5.0 && km < 8.0, "got {} km", km);
    }
}
