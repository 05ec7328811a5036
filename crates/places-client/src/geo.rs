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

//! Geographic primitives: coordinates, regions and Web Mercator helpers.
//!
//! Regions are expressed as a center plus a latitude/longitude span in degrees,
//! which is what the map camera and the search anchor both need.

use serde::{Deserialize, Serialize};

/// Mean meters per degree of latitude.
const METERS_PER_DEGREE_LAT: f64 = 111_132.954;
/// Meters per degree of longitude at the equator.
const METERS_PER_DEGREE_LON: f64 = 111_319.488;
/// Latitude limit of the Web Mercator projection.
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;
/// Smallest span a region may have, roughly one meter.
const MIN_SPAN_DEGREES: f64 = 1.0e-5;
/// Earth's mean radius in meters.
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;
/// Slippy map tile edge in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance to another coordinate in meters (Haversine).
    #[must_use]
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_METERS * c
    }

    /// Whether both components are finite and inside their valid ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A rectangular map region: center plus span in degrees.
///
/// Constructors always produce a valid region. Spans are positive and finite,
/// and the center latitude is clamped to the Web Mercator range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub center: Coordinate,
    pub latitude_span: f64,
    pub longitude_span: f64,
}

impl Region {
    /// Create a region from a center and spans in degrees.
    #[must_use]
    pub fn new(center: Coordinate, latitude_span: f64, longitude_span: f64) -> Self {
        let sanitize = |span: f64| {
            if span.is_finite() {
                span.abs().clamp(MIN_SPAN_DEGREES, 180.0)
            } else {
                MIN_SPAN_DEGREES
            }
        };

        Self {
            center: Coordinate::new(
                center.latitude.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT),
                center.longitude.clamp(-180.0, 180.0),
            ),
            latitude_span: sanitize(latitude_span),
            longitude_span: sanitize(longitude_span).min(360.0),
        }
    }

    /// Create a region around `center` covering the given extents in meters.
    #[must_use]
    pub fn from_meters(center: Coordinate, latitudinal_meters: f64, longitudinal_meters: f64) -> Self {
        let cos_lat = center.latitude.to_radians().cos().max(0.01);
        Self::new(
            center,
            latitudinal_meters / METERS_PER_DEGREE_LAT,
            longitudinal_meters / (METERS_PER_DEGREE_LON * cos_lat),
        )
    }

    /// Smallest region enclosing every coordinate, or `None` for an empty input.
    #[must_use]
    pub fn bounding<'a, I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut iter = coordinates.into_iter();
        let first = iter.next()?;
        let (mut south, mut north) = (first.latitude, first.latitude);
        let (mut west, mut east) = (first.longitude, first.longitude);

        for c in iter {
            south = south.min(c.latitude);
            north = north.max(c.latitude);
            west = west.min(c.longitude);
            east = east.max(c.longitude);
        }

        Some(Self::new(
            Coordinate::new((south + north) / 2.0, (west + east) / 2.0),
            north - south,
            east - west,
        ))
    }

    /// Grow both spans by `factor` (1.2 adds 10% on each side).
    #[must_use]
    pub fn padded(&self, factor: f64) -> Self {
        Self::new(self.center, self.latitude_span * factor, self.longitude_span * factor)
    }

    #[must_use]
    pub fn south(&self) -> f64 {
        self.center.latitude - self.latitude_span / 2.0
    }

    #[must_use]
    pub fn north(&self) -> f64 {
        self.center.latitude + self.latitude_span / 2.0
    }

    #[must_use]
    pub fn west(&self) -> f64 {
        self.center.longitude - self.longitude_span / 2.0
    }

    #[must_use]
    pub fn east(&self) -> f64 {
        self.center.longitude + self.longitude_span / 2.0
    }

    #[must_use]
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        (self.south()..=self.north()).contains(&coordinate.latitude)
            && (self.west()..=self.east()).contains(&coordinate.longitude)
    }

    /// Highest zoom level at which the whole region fits in a viewport of
    /// `width` x `height` pixels, clamped to `[min_zoom, max_zoom]`.
    #[must_use]
    pub fn fit_zoom(&self, width: f32, height: f32, min_zoom: f64, max_zoom: f64) -> f64 {
        let width = f64::from(width.max(1.0));
        let height = f64::from(height.max(1.0));

        let x_span = WebMercator::lon_to_x(self.east(), 0.0) - WebMercator::lon_to_x(self.west(), 0.0);
        let y_span = WebMercator::lat_to_y(self.south(), 0.0) - WebMercator::lat_to_y(self.north(), 0.0);

        let zoom_x = (width / (x_span.abs().max(f64::EPSILON) * TILE_SIZE)).log2();
        let zoom_y = (height / (y_span.abs().max(f64::EPSILON) * TILE_SIZE)).log2();

        zoom_x.min(zoom_y).clamp(min_zoom, max_zoom)
    }
}

/// Web Mercator projection utilities.
///
/// Values are in tile units at the given (fractional) zoom level.
#[derive(Debug)]
pub struct WebMercator;

impl WebMercator {
    #[must_use]
    pub fn lat_to_y(lat: f64, zoom: f64) -> f64 {
        let lat_rad = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
        let n = 2_f64.powf(zoom);
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0;
        y * n
    }

    #[must_use]
    pub fn lon_to_x(lon: f64, zoom: f64) -> f64 {
        let n = 2_f64.powf(zoom);
        ((lon + 180.0) / 360.0) * n
    }
}
