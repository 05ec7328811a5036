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

//! Map screen state machine.
//!
//! [`MapScreen`] owns everything the map view shows: camera region, search
//! text and results, the current [`Focus`] and the route overlay. User actions
//! return [`Command`]s for the worker to execute; results come back as
//! [`Completion`]s and are applied only if they belong to the latest request
//! of their kind.

mod markers;

pub use markers::Marker;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::command::{Command, Completion, Generations, RequestKind};
use crate::geo::{Coordinate, Region};
use crate::model::{Place, PlaceId, Route};
use crate::panel::PanelIntent;

/// Default reference location (District 8, Ho Chi Minh City).
pub const DEFAULT_REFERENCE: Coordinate = Coordinate::new(10.742_610, 106.685_750);

/// Default extent of the reference region in meters.
pub const DEFAULT_REFERENCE_SPAN_METERS: f64 = 100.0;

/// Which region a search is answered relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchScope {
    /// The fixed region around the reference location.
    #[default]
    Anchor,
    /// Whatever the camera currently shows.
    Viewport,
}

/// Static settings for a [`MapScreen`].
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    /// Origin of every route and center of the anchor region.
    pub reference: Coordinate,
    /// Side length of the anchor region in meters.
    pub reference_span_meters: f64,
    pub search_scope: SearchScope,
    /// Set a [`Notice`] when a search or route request fails or comes back empty.
    pub show_failure_notices: bool,
    /// Factor applied to route bounds when reframing the camera.
    pub route_padding: f64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            reference: DEFAULT_REFERENCE,
            reference_span_meters: DEFAULT_REFERENCE_SPAN_METERS,
            search_scope: SearchScope::Anchor,
            show_failure_notices: true,
            route_padding: 1.3,
        }
    }
}

/// What the user is looking at. Selection and panel visibility in one value,
/// so a visible panel without a selection cannot be represented.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Focus {
    #[default]
    Nothing,
    /// Place selected and detail panel shown.
    Inspecting(Place),
    /// Place still selected but the panel is hidden (after asking for directions).
    Holding(Place),
}

impl Focus {
    #[must_use]
    pub fn place(&self) -> Option<&Place> {
        match self {
            Self::Nothing => None,
            Self::Inspecting(place) | Self::Holding(place) => Some(place),
        }
    }

    fn hold(self) -> Self {
        match self {
            Self::Inspecting(place) => Self::Holding(place),
            other => other,
        }
    }
}

/// Named view of the screen for callers that only care about the broad state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode<'a> {
    Idle,
    Browsing(&'a Place),
    Routing(&'a Place),
}

/// The route currently drawn on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOverlay {
    pub destination: Place,
    /// `None` when the route request completed without finding a route.
    pub route: Option<Route>,
}

/// A requested camera change for the map view to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMove {
    pub region: Region,
    pub animated: bool,
}

/// Transient inline message about an empty or failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NoResults { query: String },
    SearchFailed,
    NoRouteFound { destination: String },
}

impl Notice {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::NoResults { query } => format!("No results for \"{query}\""),
            Self::SearchFailed => "Search failed, try again".to_string(),
            Self::NoRouteFound { destination } => format!("No route found to {destination}"),
        }
    }
}

/// State of the map screen. Single owner, mutated on the UI thread only.
#[derive(Debug)]
pub struct MapScreen {
    config: ScreenConfig,
    reference_region: Region,
    camera_region: Region,
    pending_camera: Option<CameraMove>,
    search_query: String,
    /// Query of the latest submitted search, for notices.
    submitted_query: String,
    search_results: Vec<Place>,
    focus: Focus,
    route: Option<RouteOverlay>,
    notice: Option<Notice>,
    generations: Generations,
    search_in_flight: bool,
    route_in_flight: Option<Place>,
}

impl Default for MapScreen {
    fn default() -> Self {
        Self::new(ScreenConfig::default())
    }
}

impl MapScreen {
    #[must_use]
    pub fn new(config: ScreenConfig) -> Self {
        let reference_region = Region::from_meters(
            config.reference,
            config.reference_span_meters,
            config.reference_span_meters,
        );

        Self {
            config,
            reference_region,
            camera_region: reference_region,
            pending_camera: None,
            search_query: String::new(),
            submitted_query: String::new(),
            search_results: Vec::new(),
            focus: Focus::Nothing,
            route: None,
            notice: None,
            generations: Generations::new(),
            search_in_flight: false,
            route_in_flight: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    #[must_use]
    pub fn reference(&self) -> Coordinate {
        self.config.reference
    }

    #[must_use]
    pub fn reference_region(&self) -> Region {
        self.reference_region
    }

    // ---- search -------------------------------------------------------

    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Mutable access for text-field binding.
    pub fn search_query_mut(&mut self) -> &mut String {
        &mut self.search_query
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn set_search_scope(&mut self, scope: SearchScope) {
        self.config.search_scope = scope;
    }

    /// Region the next search will be anchored on.
    #[must_use]
    pub fn search_anchor(&self) -> Region {
        match self.config.search_scope {
            SearchScope::Anchor => self.reference_region,
            SearchScope::Viewport => self.camera_region,
        }
    }

    /// Submit the current query. Returns `None` when the query is blank.
    pub fn submit_search(&mut self) -> Option<Command> {
        let query = self.search_query.trim();
        if query.is_empty() {
            debug!("Ignoring empty search query");
            return None;
        }

        let query = query.to_string();
        let id = self.generations.next(RequestKind::Search);
        self.search_in_flight = true;
        self.notice = None;
        self.submitted_query.clone_from(&query);
        info!("Searching for '{}' (request {})", query, id.generation);

        Some(Command::Search {
            id,
            query,
            anchor: self.search_anchor(),
        })
    }

    #[must_use]
    pub fn search_results(&self) -> &[Place] {
        &self.search_results
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.search_in_flight
    }

    // ---- selection ----------------------------------------------------

    /// Select a place (marker tap or programmatic) or clear the selection.
    pub fn select(&mut self, place: Option<Place>) {
        self.focus = match place {
            Some(place) => {
                debug!("Selected '{}'", place.name);
                Focus::Inspecting(place)
            }
            None => Focus::Nothing,
        };
    }

    /// Select a search result by id. Returns `false` if no result matches.
    pub fn select_by_id(&mut self, id: &PlaceId) -> bool {
        let found = self
            .search_results
            .iter()
            .chain(self.route.as_ref().map(|overlay| &overlay.destination))
            .find(|place| &place.id == id)
            .cloned();

        match found {
            Some(place) => {
                self.select(Some(place));
                true
            }
            None => false,
        }
    }

    /// Close the detail panel and clear the selection.
    pub fn dismiss(&mut self) {
        self.focus = Focus::Nothing;
    }

    #[must_use]
    pub fn focus(&self) -> &Focus {
        &self.focus
    }

    #[must_use]
    pub fn selected_place(&self) -> Option<&Place> {
        self.focus.place()
    }

    #[must_use]
    pub fn is_detail_visible(&self) -> bool {
        matches!(self.focus, Focus::Inspecting(_))
    }

    // ---- directions ---------------------------------------------------

    /// Ask for a route from the reference location to the selected place.
    ///
    /// Hides the detail panel immediately. Returns `None` without a selection.
    pub fn request_directions(&mut self) -> Option<Command> {
        let destination = self.focus.place()?.clone();
        self.focus = std::mem::take(&mut self.focus).hold();

        let id = self.generations.next(RequestKind::Route);
        self.route_in_flight = Some(destination.clone());
        self.notice = None;
        info!("Requesting route to '{}' (request {})", destination.name, id.generation);

        Some(Command::Route {
            id,
            from: self.config.reference,
            to: destination,
        })
    }

    /// Remove the route overlay and show all results again.
    pub fn clear_route(&mut self) {
        if self.route.take().is_some() {
            debug!("Route overlay cleared");
        }
    }

    #[must_use]
    pub fn route_overlay(&self) -> Option<&RouteOverlay> {
        self.route.as_ref()
    }

    #[must_use]
    pub fn active_route(&self) -> Option<&Route> {
        self.route.as_ref().and_then(|overlay| overlay.route.as_ref())
    }

    /// Target of the active route. `None` whenever there is no active route.
    #[must_use]
    pub fn route_destination(&self) -> Option<&Place> {
        self.route
            .as_ref()
            .filter(|overlay| overlay.route.is_some())
            .map(|overlay| &overlay.destination)
    }

    #[must_use]
    pub fn is_route_displayed(&self) -> bool {
        self.route.is_some()
    }

    #[must_use]
    pub fn is_routing(&self) -> bool {
        self.route_in_flight.is_some()
    }

    #[must_use]
    pub fn mode(&self) -> Mode<'_> {
        if let Some(overlay) = &self.route {
            Mode::Routing(&overlay.destination)
        } else if let Some(place) = self.focus.place() {
            Mode::Browsing(place)
        } else {
            Mode::Idle
        }
    }

    // ---- panel intents ------------------------------------------------

    /// Interpret an intent emitted by the detail panel.
    pub fn handle_intent(&mut self, intent: PanelIntent) -> Option<Command> {
        match intent {
            PanelIntent::Dismiss => {
                self.dismiss();
                None
            }
            PanelIntent::RequestDirections => self.request_directions(),
            PanelIntent::OpenExternally(place) => Some(Command::OpenExternally(place)),
        }
    }

    // ---- camera -------------------------------------------------------

    #[must_use]
    pub fn camera_region(&self) -> Region {
        self.camera_region
    }

    /// Record the region the user panned or zoomed to.
    pub fn move_camera(&mut self, region: Region) {
        self.camera_region = region;
    }

    /// Take the pending programmatic camera change, if any.
    pub fn take_camera_move(&mut self) -> Option<CameraMove> {
        self.pending_camera.take()
    }

    fn reframe(&mut self, region: Region, animated: bool) {
        self.camera_region = region;
        self.pending_camera = Some(CameraMove { region, animated });
    }

    /// Move the camera back to the reference region.
    pub fn recenter(&mut self) {
        self.reframe(self.reference_region, true);
    }

    // ---- notices ------------------------------------------------------

    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    fn set_notice(&mut self, notice: Notice) {
        if self.config.show_failure_notices {
            self.notice = Some(notice);
        }
    }

    // ---- completions --------------------------------------------------

    /// Apply a completion. Returns `false` if it was stale or not meant for
    /// the map screen (preview completions belong to the detail panel).
    pub fn apply(&mut self, completion: Completion) -> bool {
        let id = completion.id();
        if !self.generations.is_current(id) {
            debug!("Discarding stale {:?} completion (generation {})", id.kind, id.generation);
            return false;
        }

        match completion {
            Completion::Search { result, .. } => {
                self.search_in_flight = false;
                self.apply_search(result);
                true
            }
            Completion::Route {
                destination, result, ..
            } => {
                self.route_in_flight = None;
                self.apply_route(destination, result);
                true
            }
            Completion::Preview { .. } => false,
        }
    }

    fn apply_search(&mut self, result: Result<Vec<Place>, crate::services::ServiceError>) {
        match result {
            Ok(places) => {
                info!("Search returned {} places", places.len());
                if places.is_empty() {
                    let query = self.submitted_query.clone();
                    self.set_notice(Notice::NoResults { query });
                }
                self.search_results = places;
            }
            Err(e) => {
                warn!("{}", e);
                self.search_results.clear();
                self.set_notice(Notice::SearchFailed);
            }
        }
    }

    fn apply_route(&mut self, destination: Place, result: Result<Route, crate::services::ServiceError>) {
        let route = match result {
            Ok(route) => {
                info!("Route to '{}': {}", destination.name, route.summary());
                Some(route)
            }
            Err(e) => {
                warn!("{}", e);
                self.set_notice(Notice::NoRouteFound {
                    destination: destination.name.clone(),
                });
                None
            }
        };

        if let Some(route) = &route {
            let padded = route.bounds().padded(self.config.route_padding);
            self.reframe(padded, true);
        }

        self.focus = std::mem::take(&mut self.focus).hold();
        self.route = Some(RouteOverlay { destination, route });
    }
}
