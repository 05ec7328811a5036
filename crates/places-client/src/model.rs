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

//! Immutable values returned by the place, route and imagery services.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::geo::{Coordinate, Region};

/// Opaque identifier for a place, stable for the lifetime of a search result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceId(Arc<str>);

impl PlaceId {
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named point of interest returned by search.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub id: PlaceId,
    /// Short display name ("Highlands Coffee").
    pub name: String,
    /// Address or other secondary line.
    pub subtitle: String,
    pub coordinate: Coordinate,
}

impl Place {
    #[must_use]
    pub fn new(
        id: impl AsRef<str>,
        name: impl Into<String>,
        subtitle: impl Into<String>,
        coordinate: Coordinate,
    ) -> Self {
        Self {
            id: PlaceId::new(id),
            name: name.into(),
            subtitle: subtitle.into(),
            coordinate,
        }
    }

    /// Two places are the same point of interest when their ids match.
    #[must_use]
    pub fn same_as(&self, other: &Place) -> bool {
        self.id == other.id
    }
}

/// A computed driving route.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    polyline: Vec<Coordinate>,
    bounds: Region,
    /// Route length in meters.
    pub distance_meters: f64,
    pub expected_travel_time: Duration,
}

impl Route {
    /// Build a route from its polyline. Returns `None` for an empty polyline.
    #[must_use]
    pub fn new(polyline: Vec<Coordinate>, distance_meters: f64, expected_travel_time: Duration) -> Option<Self> {
        let bounds = Region::bounding(&polyline)?;
        Some(Self {
            polyline,
            bounds,
            distance_meters,
            expected_travel_time,
        })
    }

    #[must_use]
    pub fn polyline(&self) -> &[Coordinate] {
        &self.polyline
    }

    /// Region enclosing the whole polyline.
    #[must_use]
    pub fn bounds(&self) -> Region {
        self.bounds
    }

    /// Human readable summary, e.g. "4.2 km · 12 min".
    #[must_use]
    pub fn summary(&self) -> String {
        let minutes = (self.expected_travel_time.as_secs() + 59) / 60;
        if self.distance_meters >= 1000.0 {
            format!("{:.1} km · {} min", self.distance_meters / 1000.0, minutes)
        } else {
            format!("{:.0} m · {} min", self.distance_meters, minutes)
        }
    }
}

/// A photographic preview of a place's surroundings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewScene {
    /// Direct URL of the preview image.
    pub image_url: String,
    /// Page describing the image, opened when the preview is clicked.
    pub page_url: Option<String>,
    /// Credit line shown under the image.
    pub attribution: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_requires_points() {
        assert!(Route::new(Vec::new(), 0.0, Duration::ZERO).is_none());
    }

    #[test]
    fn test_route_bounds_cover_polyline() {
        let polyline = vec![
            Coordinate::new(10.742_61, 106.685_75),
            Coordinate::new(10.75, 106.69),
            Coordinate::new(10.76, 106.70),
        ];
        let route = Route::new(polyline.clone(), 2500.0, Duration::from_secs(420)).unwrap();

        for point in &polyline {
            assert!(route.bounds().contains(point));
        }
        assert_eq!(route.summary(), "2.5 km · 7 min");
    }

    #[test]
    fn test_short_route_summary_in_meters() {
        let route = Route::new(
            vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.001, 0.0)],
            111.0,
            Duration::from_secs(61),
        )
        .unwrap();
        assert_eq!(route.summary(), "111 m · 2 min");
    }

    #[test]
    fn test_place_identity_uses_id() {
        let a = Place::new("n1", "Cafe", "1 Street", Coordinate::new(1.0, 2.0));
        let b = Place::new("n1", "Cafe (renamed)", "", Coordinate::new(1.0, 2.0));
        assert!(a.same_as(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_place_id_keys_share_storage() {
        let id = PlaceId::new("osm:42");
        let mut seen = std::collections::HashMap::new();
        seen.insert(id.clone(), 1);

        assert_eq!(seen.get(&PlaceId::new("osm:42")), Some(&1));
        assert_eq!(id.to_string(), "osm:42");
        assert_eq!(id.as_str(), "osm:42");
    }
}
