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

//! Place search, directions and preview state for a single map screen.
//!
//! The crate is split into layers that the desktop front end composes:
//!
//! - **Model**: [`Coordinate`], [`Region`], [`Place`], [`Route`] and
//!   [`PreviewScene`], plus the Web Mercator helpers in [`geo`].
//! - **State**: [`MapScreen`] owns the camera, search results, focus and the
//!   route overlay; [`DetailPanel`] tracks the preview for the focused place.
//!   Neither performs I/O. They return [`Command`]s and accept
//!   [`Completion`]s, dropping completions that have been superseded.
//! - **Services**: the [`PlaceSearch`], [`RoutePlanner`], [`PreviewImagery`]
//!   and [`ExternalHandoff`] traits, with HTTP implementations in
//!   [`providers`].
//! - **Worker**: [`Worker`] runs commands on a background tokio runtime and
//!   hands completions back to the UI thread.
//!
//! # Example
//!
//! ```
//! use places_client::{Command, Completion, Coordinate, MapScreen, Place};
//!
//! let mut screen = MapScreen::default();
//! screen.set_search_query("coffee");
//!
//! let Some(Command::Search { id, .. }) = screen.submit_search() else {
//!     unreachable!("non-blank query issues a search");
//! };
//!
//! // Normally delivered by the worker.
//! screen.apply(Completion::Search {
//!     id,
//!     result: Ok(vec![Place::new(
//!         "osm:1",
//!         "Cafe One",
//!         "12 Nguyen Trai",
//!         Coordinate::new(10.7431, 106.6862),
//!     )]),
//! });
//!
//! // The reference marker plus one per result.
//! assert_eq!(screen.markers().len(), 2);
//! ```

pub mod command;
pub mod geo;
pub mod model;
pub mod panel;
pub mod providers;
pub mod screen;
pub mod services;
pub mod worker;

pub use command::{Command, Completion, Generations, RequestId, RequestKind};
pub use geo::{Coordinate, Region};
pub use model::{Place, PlaceId, PreviewScene, Route};
pub use panel::{DetailPanel, PanelIntent, Preview};
pub use screen::{
    CameraMove, Focus, MapScreen, Marker, Mode, Notice, RouteOverlay, ScreenConfig, SearchScope,
};
pub use services::{
    ExternalHandoff, PlaceSearch, PreviewImagery, RoutePlanner, ServiceError, Services,
};
pub use worker::{RepaintHook, Worker};
