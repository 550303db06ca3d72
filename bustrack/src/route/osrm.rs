//! OSRM route provider.
//!
//! Fetches driving geometry from an OSRM `route/v1` endpoint and places stops
//! at fractional offsets along it.

use std::time::Duration;

use serde::Deserialize;

use super::error::RouteError;
use super::provider::RouteProvider;
use super::stops::DEFAULT_STOP_FRACTIONS;
use super::types::{Path, Route};
use crate::coord::Coordinate;

/// Public OSRM demo server.
pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";

/// Default HTTP timeout for route requests.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

/// GeoJSON LineString; coordinates are `[longitude, latitude]`.
#[derive(Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Route provider backed by an OSRM server.
pub struct OsrmRouteProvider {
    http: reqwest::Client,
    base_url: String,
    stop_fractions: Vec<f64>,
}

impl OsrmRouteProvider {
    /// Create a provider for the given OSRM base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RouteError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| RouteError::RouteUnavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            stop_fractions: DEFAULT_STOP_FRACTIONS.to_vec(),
        })
    }

    /// Override the fractional stop offsets.
    pub fn with_stop_fractions(mut self, fractions: Vec<f64>) -> Self {
        self.stop_fractions = fractions;
        self
    }

    fn request_url(&self, origin: &Coordinate, destination: &Coordinate) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url,
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude
        )
    }
}

impl RouteProvider for OsrmRouteProvider {
    async fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Route, RouteError> {
        let url = self.request_url(&origin, &destination);
        tracing::debug!(url = %url, "Requesting route from OSRM");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| RouteError::RouteUnavailable(format!("request failed: {}", e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RouteError::RouteUnavailable(format!("read failed: {}", e)))?;

        let route = parse_response(&bytes, &self.stop_fractions)?;

        tracing::info!(
            points = route.path().len(),
            stops = route.stops().len(),
            length_m = format!("{:.0}", route.length_meters()),
            "Route resolved"
        );
        Ok(route)
    }
}

/// Decode an OSRM response body into a route.
fn parse_response(body: &[u8], stop_fractions: &[f64]) -> Result<Route, RouteError> {
    let response: OsrmResponse = serde_json::from_slice(body)
        .map_err(|e| RouteError::RouteUnavailable(format!("undecodable response: {}", e)))?;

    let first = response.routes.into_iter().next().ok_or_else(|| {
        RouteError::RouteUnavailable(format!(
            "no route found (code: {})",
            response.code.as_deref().unwrap_or("unknown")
        ))
    })?;

    let coords = first
        .geometry
        .coordinates
        .into_iter()
        .map(|[lon, lat]| Coordinate::new(lat, lon))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| RouteError::RouteUnavailable(format!("bad geometry: {}", e)))?;

    let path =
        Path::new(coords).map_err(|e| RouteError::RouteUnavailable(format!("unusable geometry: {}", e)))?;

    Ok(Route::with_fractions(path, stop_fractions))
}
