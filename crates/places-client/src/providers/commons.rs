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

//! Preview imagery from Wikimedia Commons.
//!
//! Uses the MediaWiki geosearch generator to find the file nearest to a place
//! and returns its thumbnail as a [`PreviewScene`]. Lookups are cached per
//! place, including "nothing nearby" answers, so reopening a place does not
//! hit the API again.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use super::{describe, ProviderBuildError, ProviderConfig};
use crate::model::{Place, PlaceId, PreviewScene};
use crate::services::{PreviewImagery, ServiceError};

/// Commons API host.
pub const DEFAULT_COMMONS_URL: &str = "https://commons.wikimedia.org";

const DEFAULT_RADIUS_METERS: u32 = 150;
const DEFAULT_THUMB_WIDTH: u32 = 640;
const CACHE_TTL: Duration = Duration::from_secs(3600 * 24);

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryPages>,
}

#[derive(Debug, Deserialize)]
struct QueryPages {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    /// Geosearch rank; lower is closer.
    #[serde(default)]
    index: u32,
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    #[serde(default)]
    thumburl: Option<String>,
    url: String,
    #[serde(default)]
    descriptionurl: Option<String>,
    #[serde(default)]
    mime: Option<String>,
    #[serde(default)]
    extmetadata: Option<ExtMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExtMetadata {
    artist: Option<MetadataValue>,
    license_short_name: Option<MetadataValue>,
}

#[derive(Debug, Deserialize)]
struct MetadataValue {
    value: String,
}

struct CacheEntry {
    scene: Option<PreviewScene>,
    timestamp: Instant,
}

/// Wikimedia Commons-backed [`PreviewImagery`].
pub struct CommonsImagery {
    client: Client,
    config: ProviderConfig,
    radius_meters: u32,
    cache: Mutex<HashMap<PlaceId, CacheEntry>>,
    cache_ttl: Duration,
}

impl std::fmt::Debug for CommonsImagery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommonsImagery")
            .field("config", &self.config)
            .field("radius_meters", &self.radius_meters)
            .finish_non_exhaustive()
    }
}

impl CommonsImagery {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderBuildError> {
        Ok(Self {
            client: config.build_client()?,
            config,
            radius_meters: DEFAULT_RADIUS_METERS,
            cache: Mutex::new(HashMap::new()),
            cache_ttl: CACHE_TTL,
        })
    }

    /// Search radius around the place, clamped to the API's 10 m to 10 km range.
    #[must_use]
    pub fn with_radius(mut self, meters: u32) -> Self {
        self.radius_meters = meters.clamp(10, 10_000);
        self
    }

    fn api_url(&self) -> String {
        format!("{}/w/api.php", self.config.base())
    }

    fn query_params(&self, place: &Place) -> Vec<(&'static str, String)> {
        vec![
            ("action", "query".to_string()),
            ("format", "json".to_string()),
            ("formatversion", "2".to_string()),
            ("generator", "geosearch".to_string()),
            (
                "ggscoord",
                format!("{:.6}|{:.6}", place.coordinate.latitude, place.coordinate.longitude),
            ),
            ("ggsradius", self.radius_meters.to_string()),
            ("ggsnamespace", "6".to_string()),
            ("ggslimit", "10".to_string()),
            ("prop", "imageinfo".to_string()),
            ("iiprop", "url|mime|extmetadata".to_string()),
            ("iiextmetadatafilter", "Artist|LicenseShortName".to_string()),
            ("iiurlwidth", DEFAULT_THUMB_WIDTH.to_string()),
        ]
    }

    fn get_from_cache(&self, id: &PlaceId) -> Option<Option<PreviewScene>> {
        let cache = self.cache.lock().ok()?;
        cache
            .get(id)
            .filter(|entry| entry.timestamp.elapsed() < self.cache_ttl)
            .map(|entry| entry.scene.clone())
    }

    fn store_in_cache(&self, id: &PlaceId, scene: Option<PreviewScene>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.retain(|_, entry| entry.timestamp.elapsed() < self.cache_ttl);
            cache.insert(
                id.clone(),
                CacheEntry {
                    scene,
                    timestamp: Instant::now(),
                },
            );
        }
    }
}

/// Remove HTML tags and collapse whitespace (Commons artist fields are HTML).
fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pick the closest raster image from the response.
fn convert_response(response: QueryResponse) -> Option<PreviewScene> {
    let mut pages = response.query?.pages;
    pages.sort_by_key(|page| page.index);

    pages.into_iter().find_map(|page| {
        let info = page.imageinfo.into_iter().next()?;
        let is_raster = info
            .mime
            .as_deref()
            .map_or(true, |mime| matches!(mime, "image/jpeg" | "image/png" | "image/webp"));
        if !is_raster {
            return None;
        }

        let attribution = info.extmetadata.and_then(|meta| {
            let parts: Vec<String> = [meta.artist, meta.license_short_name]
                .into_iter()
                .flatten()
                .map(|value| strip_html(&value.value))
                .filter(|text| !text.is_empty())
                .collect();
            (!parts.is_empty()).then(|| format!("{} · Wikimedia Commons", parts.join(" · ")))
        });

        Some(PreviewScene {
            image_url: info.thumburl.unwrap_or(info.url),
            page_url: info.descriptionurl,
            attribution,
        })
    })
}

#[async_trait]
impl PreviewImagery for CommonsImagery {
    async fn lookup(&self, place: &Place) -> Result<Option<PreviewScene>, ServiceError> {
        if let Some(cached) = self.get_from_cache(&place.id) {
            debug!("Preview cache hit for {}", place.id);
            return Ok(cached);
        }

        let url = self.api_url();
        let response = self
            .client
            .get(&url)
            .query(&self.query_params(place))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ServiceError::ImageryUnavailable(describe(&e, &url)))?;

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::ImageryUnavailable(format!("invalid response from {url}: {e}")))?;

        let scene = convert_response(body);
        self.store_in_cache(&place.id, scene.clone());
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    #[test]
    fn test_picks_closest_raster_image() {
        let json = r#"{
            "batchcomplete": true,
            "query": {
                "pages": [
                    {
                        "pageid": 2, "ns": 6, "title": "File:Far.jpg", "index": 2,
                        "imageinfo": [{
                            "thumburl": "https://upload.example/thumb/far.jpg",
                            "url": "https://upload.example/far.jpg",
                            "mime": "image/jpeg"
                        }]
                    },
                    {
                        "pageid": 3, "ns": 6, "title": "File:Map.svg", "index": 0,
                        "imageinfo": [{ "url": "https://upload.example/map.svg", "mime": "image/svg+xml" }]
                    },
                    {
                        "pageid": 1, "ns": 6, "title": "File:Near.jpg", "index": 1,
                        "imageinfo": [{
                            "thumburl": "https://upload.example/thumb/near.jpg",
                            "url": "https://upload.example/near.jpg",
                            "descriptionurl": "https://commons.example/wiki/File:Near.jpg",
                            "mime": "image/jpeg",
                            "extmetadata": {
                                "Artist": { "value": "<a href=\"//x\">Jane  Doe</a>" },
                                "LicenseShortName": { "value": "CC BY-SA 4.0" }
                            }
                        }]
                    }
                ]
            }
        }"#;

        let response: QueryResponse = serde_json::from_str(json).expect("should deserialise");
        let scene = convert_response(response).expect("scene");

        assert_eq!(scene.image_url, "https://upload.example/thumb/near.jpg");
        assert_eq!(
            scene.page_url.as_deref(),
            Some("https://commons.example/wiki/File:Near.jpg")
        );
        assert_eq!(
            scene.attribution.as_deref(),
            Some("Jane Doe · CC BY-SA 4.0 · Wikimedia Commons")
        );
    }

    #[test]
    fn test_no_nearby_files() {
        let response: QueryResponse = serde_json::from_str(r#"{ "batchcomplete": true }"#).unwrap();
        assert!(convert_response(response).is_none());
    }

    #[test]
    fn test_query_params_and_cache() {
        let imagery = CommonsImagery::new(ProviderConfig::new(DEFAULT_COMMONS_URL))
            .unwrap()
            .with_radius(5);
        let place = Place::new("osm:1", "Cafe", "", Coordinate::new(10.742_61, 106.685_75));

        assert_eq!(imagery.api_url(), "https://commons.wikimedia.org/w/api.php");
        let params = imagery.query_params(&place);
        assert!(params.contains(&("ggscoord", "10.742610|106.685750".to_string())));
        assert!(params.contains(&("ggsradius", "10".to_string())));

        assert!(imagery.get_from_cache(&place.id).is_none());
        imagery.store_in_cache(&place.id, None);
        assert_eq!(imagery.get_from_cache(&place.id), Some(None));
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<span>A <b>B</b></span>\n C"), "A B C");
    }
}
