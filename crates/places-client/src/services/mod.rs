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

//! Service layer: the external capabilities the map screen depends on.
//!
//! Each capability is an object-safe trait so the worker can hold
//! `Arc<dyn ...>` handles and tests can substitute in-memory fakes.
//! HTTP-backed implementations live in [`crate::providers`].

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::geo::{Coordinate, Region};
use crate::model::{Place, PreviewScene, Route};

/// Errors reported by the external services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("search failed: {0}")]
    SearchFailed(String),

    #[error("no route found: {0}")]
    RouteNotFound(String),

    #[error("preview imagery unavailable: {0}")]
    ImageryUnavailable(String),

    #[error("could not hand off to external map: {0}")]
    ExternalHandoffFailed(String),
}

/// Natural-language place search.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    /// Search for `query` relative to `anchor`. Result order is significant.
    async fn search(&self, query: &str, anchor: &Region) -> Result<Vec<Place>, ServiceError>;
}

/// Driving route computation.
#[async_trait]
pub trait RoutePlanner: Send + Sync {
    /// Compute a route and return the first candidate.
    async fn route(&self, from: Coordinate, to: &Place) -> Result<Route, ServiceError>;
}

/// Street-level or photographic preview lookup.
#[async_trait]
pub trait PreviewImagery: Send + Sync {
    /// `Ok(None)` means the lookup succeeded but nothing is available.
    async fn lookup(&self, place: &Place) -> Result<Option<PreviewScene>, ServiceError>;
}

/// Hand a place over to an external map application.
pub trait ExternalHandoff: Send + Sync {
    fn open(&self, place: &Place) -> Result<(), ServiceError>;
}

/// The bundle of services a [`crate::worker::Worker`] executes commands against.
#[derive(Clone)]
pub struct Services {
    pub search: Arc<dyn PlaceSearch>,
    pub routing: Arc<dyn RoutePlanner>,
    pub imagery: Arc<dyn PreviewImagery>,
    pub handoff: Arc<dyn ExternalHandoff>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
