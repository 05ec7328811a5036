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

//! What the map view draws for a given screen state.

use crate::geo::Coordinate;
use crate::model::Place;

use super::MapScreen;

/// One marker to draw on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Marker<'a> {
    /// The fixed reference location. Always present.
    Reference(Coordinate),
    /// A search result or route destination.
    Place {
        place: &'a Place,
        selected: bool,
    },
}

impl<'a> Marker<'a> {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        match self {
            Self::Reference(coordinate) => *coordinate,
            Self::Place { place, .. } => place.coordinate,
        }
    }

    #[must_use]
    pub fn place(&self) -> Option<&'a Place> {
        match self {
            Self::Reference(_) => None,
            Self::Place { place, .. } => Some(*place),
        }
    }
}

impl MapScreen {
    /// Markers in draw order: the reference first, then places.
    ///
    /// While a route overlay is displayed only the result matching its
    /// destination is drawn.
    #[must_use]
    pub fn markers(&self) -> Vec<Marker<'_>> {
        let selected = self.focus.place();
        let is_selected = |place: &Place| selected.is_some_and(|s| s.same_as(place));

        let mut markers = Vec::with_capacity(self.search_results.len() + 1);
        markers.push(Marker::Reference(self.config.reference));

        let destination = self.route.as_ref().map(|overlay| &overlay.destination);
        markers.extend(
            self.search_results
                .iter()
                .filter(|place| destination.map_or(true, |d| d.same_as(place)))
                .map(|place| Marker::Place {
                    place,
                    selected: is_selected(place),
                }),
        );

        markers
    }

    /// Polyline of the active route, if any.
    #[must_use]
    pub fn polyline(&self) -> Option<&[Coordinate]> {
        self.active_route().map(crate::model::Route::polyline)
    }
}
