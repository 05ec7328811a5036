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

//! Place search backed by the OpenStreetMap Nominatim `/search` endpoint.
//!
//! See: <https://nominatim.org/release-docs/latest/api/Search/>

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use super::{describe, ProviderBuildError, ProviderConfig};
use crate::geo::{Coordinate, Region};
use crate::model::Place;
use crate::services::{PlaceSearch, ServiceError};

/// Public Nominatim instance.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Default number of results per search.
const DEFAULT_LIMIT: u32 = 15;

/// One entry of a `format=jsonv2` response.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    place_id: u64,
    lat: String,
    lon: String,
    #[serde(default)]
    name: Option<String>,
    display_name: String,
}

impl NominatimPlace {
    fn into_place(self) -> Option<Place> {
        let latitude = self.lat.parse::<f64>().ok()?;
        let longitude = self.lon.parse::<f64>().ok()?;
        let coordinate = Coordinate::new(latitude, longitude);
        if !coordinate.is_valid() {
            return None;
        }

        let name = match self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => self
                .display_name
                .split(',')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string(),
        };

        Some(Place::new(
            format!("osm:{}", self.place_id),
            name,
            self.display_name,
            coordinate,
        ))
    }
}

/// Nominatim-backed [`PlaceSearch`].
pub struct NominatimSearch {
    client: Client,
    config: ProviderConfig,
    limit: u32,
}

impl std::fmt::Debug for NominatimSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NominatimSearch")
            .field("config", &self.config)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl NominatimSearch {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderBuildError> {
        Ok(Self {
            client: config.build_client()?,
            config,
            limit: DEFAULT_LIMIT,
        })
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base())
    }

    /// Query parameters for a search. The anchor is passed as a `viewbox`
    /// preference, not a hard bound, so nearby-but-outside places still match.
    fn query_params(&self, query: &str, anchor: &Region) -> Vec<(&'static str, String)> {
        vec![
            ("q", query.to_string()),
            ("format", "jsonv2".to_string()),
            ("limit", self.limit.to_string()),
            (
                "viewbox",
                format!(
                    "{:.6},{:.6},{:.6},{:.6}",
                    anchor.west(),
                    anchor.north(),
                    anchor.east(),
                    anchor.south()
                ),
            ),
            ("bounded", "0".to_string()),
        ]
    }
}

/// Convert a decoded response, dropping entries with unusable coordinates.
fn convert_response(entries: Vec<NominatimPlace>) -> Vec<Place> {
    let total = entries.len();
    let places: Vec<Place> = entries.into_iter().filter_map(NominatimPlace::into_place).collect();
    if places.len() < total {
        debug!("Dropped {} Nominatim results with invalid coordinates", total - places.len());
    }
    places
}

#[async_trait]
impl PlaceSearch for NominatimSearch {
    async fn search(&self, query: &str, anchor: &Region) -> Result<Vec<Place>, ServiceError> {
        let url = self.search_url();
        let response = self
            .client
            .get(&url)
            .query(&self.query_params(query, anchor))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ServiceError::SearchFailed(describe(&e, &url)))?;

        let entries: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| ServiceError::SearchFailed(format!("invalid response from {url}: {e}")))?;

        Ok(convert_response(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "place_id": 1001,
            "lat": "10.7431",
            "lon": "106.6862",
            "category": "amenity",
            "type": "cafe",
            "name": "Highlands Coffee",
            "display_name": "Highlands Coffee, Pham The Hien, District 8, Ho Chi Minh City, Vietnam"
        },
        {
            "place_id": 1002,
            "lat": "10.7450",
            "lon": "106.6900",
            "name": "",
            "display_name": "The Coffee House, Ta Quang Buu, District 8, Vietnam"
        },
        {
            "place_id": 1003,
            "lat": "not-a-number",
            "lon": "106.6900",
            "display_name": "Broken"
        }
    ]"#;

    #[test]
    fn test_convert_response_preserves_order_and_names() {
        let entries: Vec<NominatimPlace> = serde_json::from_str(SAMPLE).expect("should deserialise");
        let places = convert_response(entries);

        assert_eq!(places.len(), 2);
        assert_eq!(places[0].id.as_str(), "osm:1001");
        assert_eq!(places[0].name, "Highlands Coffee");
        assert!(places[0].subtitle.starts_with("Highlands Coffee, Pham The Hien"));
        assert!((places[0].coordinate.latitude - 10.7431).abs() < 1e-9);

        // Empty name falls back to the first part of display_name
        assert_eq!(places[1].name, "The Coffee House");
    }

    #[test]
    fn test_query_params_include_viewbox() {
        let search = NominatimSearch::new(ProviderConfig::new("https://nominatim.example/"))
            .unwrap()
            .with_limit(5);
        let anchor = Region::new(Coordinate::new(10.0, 106.0), 0.2, 0.4);
        let params = search.query_params("coffee", &anchor);

        assert_eq!(search.search_url(), "https://nominatim.example/search");
        assert!(params.contains(&("q", "coffee".to_string())));
        assert!(params.contains(&("limit", "5".to_string())));
        assert!(params.contains(&("format", "jsonv2".to_string())));
        assert!(params.contains(&(
            "viewbox",
            "105.800000,10.100000,106.200000,9.900000".to_string()
        )));
    }
}
