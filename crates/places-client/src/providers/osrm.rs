// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Driving routes from an OSRM `route` service.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#route-service>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{describe, ProviderBuildError, ProviderConfig};
use crate::geo::Coordinate;
use crate::model::{Place, Route};
use crate::services::{RoutePlanner, ServiceError};

/// Public OSRM demo server.
pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";

/// OSRM Route API response.
#[derive(Debug, Deserialize)]
struct RouteResponse {
    /// `"Ok"` on success, otherwise e.g. `"NoRoute"` or `"InvalidQuery"`.
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
    geometry: Geometry,
}

/// GeoJSON LineString; positions are `[lon, lat]`.
#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<[f64; 2]>,
}

/// OSRM-backed [`RoutePlanner`].
pub struct OsrmRouter {
    client: Client,
    config: ProviderConfig,
    profile: String,
}

impl std::fmt::Debug for OsrmRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OsrmRouter")
            .field("config", &self.config)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl OsrmRouter {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderBuildError> {
        Ok(Self {
            client: config.build_client()?,
            config,
            profile: "driving".to_string(),
        })
    }

    /// `{base}/route/v1/{profile}/{lon},{lat};{lon},{lat}`
    fn route_url(&self, from: Coordinate, to: Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}",
            self.config.base(),
            self.profile,
            from.longitude,
            from.latitude,
            to.longitude,
            to.latitude
        )
    }
}

/// Pick the first candidate route.
fn convert_response(response: RouteResponse) -> Result<Route, ServiceError> {
    if response.code != "Ok" {
        return Err(ServiceError::RouteNotFound(format!(
            "{}: {}",
            response.code,
            response.message.unwrap_or_default()
        )));
    }

    let first = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::RouteNotFound("response contained no routes".to_string()))?;

    let polyline = first
        .geometry
        .coordinates
        .into_iter()
        .map(|[lon, lat]| Coordinate::new(lat, lon))
        .collect();

    let travel_time = if first.duration.is_finite() && first.duration >= 0.0 {
        Duration::from_secs_f64(first.duration)
    } else {
        Duration::ZERO
    };

    Route::new(polyline, first.distance, travel_time)
        .ok_or_else(|| ServiceError::RouteNotFound("route geometry was empty".to_string()))
}

#[async_trait]
impl RoutePlanner for OsrmRouter {
    async fn route(&self, from: Coordinate, to: &Place) -> Result<Route, ServiceError> {
        let url = self.route_url(from, to.coordinate);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("overview", "full"),
                ("geometries", "geojson"),
                ("alternatives", "true"),
                ("steps", "false"),
            ])
            .send()
            .await
            .map_err(|e| ServiceError::RouteNotFound(describe(&e, &url)))?;

        // OSRM answers NoRoute with a 400 and a JSON body, so decode before
        // checking the status.
        let status = response.status();
        let body: RouteResponse = response.json().await.map_err(|e| {
            ServiceError::RouteNotFound(format!("HTTP {status}, invalid response from {url}: {e}"))
        })?;

        convert_response(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_url_uses_lon_lat_order() {
        let router = OsrmRouter::new(ProviderConfig::new("http://localhost:5000/")).unwrap();
        let url = router.route_url(Coordinate::new(10.742_61, 106.685_75), Coordinate::new(10.745, 106.69));
        assert_eq!(
            url,
            "http://localhost:5000/route/v1/driving/106.685750,10.742610;106.690000,10.745000"
        );
    }

    #[test]
    fn test_convert_first_route() {
        let json = r#"{
            "code": "Ok",
            "routes": [
                {
                    "distance": 1234.5,
                    "duration": 300.0,
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[106.68575, 10.74261], [106.688, 10.744], [106.69, 10.745]]
                    }
                },
                {
                    "distance": 2000.0,
                    "duration": 500.0,
                    "geometry": { "type": "LineString", "coordinates": [[106.0, 10.0], [106.1, 10.1]] }
                }
            ]
        }"#;

        let response: RouteResponse = serde_json::from_str(json).expect("should deserialise");
        let route = convert_response(response).expect("route");

        assert_eq!(route.polyline().len(), 3);
        assert_eq!(route.polyline()[0], Coordinate::new(10.74261, 106.68575));
        assert!((route.distance_meters - 1234.5).abs() < 1e-9);
        assert_eq!(route.expected_travel_time, Duration::from_secs(300));
    }

    #[test]
    fn test_no_route_code_is_error() {
        let json = r#"{ "code": "NoRoute", "message": "Impossible route between points" }"#;
        let response: RouteResponse = serde_json::from_str(json).expect("should deserialise");

        match convert_response(response) {
            Err(ServiceError::RouteNotFound(message)) => {
                assert!(message.contains("NoRoute"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ok_without_routes_is_error() {
        let json = r#"{ "code": "Ok", "routes": [] }"#;
        let response: RouteResponse = serde_json::from_str(json).expect("should deserialise");
        assert!(matches!(convert_response(response), Err(ServiceError::RouteNotFound(_))));
    }
}
