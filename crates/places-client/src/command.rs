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

//! Commands issued by the screen state and completions fed back into it.
//!
//! Every asynchronous request carries a [`RequestId`]. Generations increase
//! monotonically per [`RequestKind`]; a completion whose generation is not the
//! latest issued for its kind is stale and must be discarded.

use crate::geo::{Coordinate, Region};
use crate::model::{Place, PreviewScene, Route};
use crate::services::ServiceError;

/// The kinds of asynchronous request, each with its own generation counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Search,
    Route,
    Imagery,
}

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId {
    pub kind: RequestKind,
    pub generation: u64,
}

/// Per-kind generation counters.
#[derive(Debug, Default, Clone)]
pub struct Generations {
    search: u64,
    route: u64,
    imagery: u64,
}

impl Generations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn counter_mut(&mut self, kind: RequestKind) -> &mut u64 {
        match kind {
            RequestKind::Search => &mut self.search,
            RequestKind::Route => &mut self.route,
            RequestKind::Imagery => &mut self.imagery,
        }
    }

    /// Issue the next id for `kind`, superseding every earlier one.
    pub fn next(&mut self, kind: RequestKind) -> RequestId {
        let counter = self.counter_mut(kind);
        *counter += 1;
        RequestId {
            kind,
            generation: *counter,
        }
    }

    /// Latest generation issued for `kind` (0 if none yet).
    #[must_use]
    pub fn latest(&self, kind: RequestKind) -> u64 {
        match kind {
            RequestKind::Search => self.search,
            RequestKind::Route => self.route,
            RequestKind::Imagery => self.imagery,
        }
    }

    /// Whether `id` is the most recent request of its kind.
    #[must_use]
    pub fn is_current(&self, id: RequestId) -> bool {
        id.generation != 0 && id.generation == self.latest(id.kind)
    }
}

/// An effect requested by the state machine, executed by the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search {
        id: RequestId,
        query: String,
        anchor: Region,
    },
    Route {
        id: RequestId,
        from: Coordinate,
        to: Place,
    },
    LookupPreview {
        id: RequestId,
        place: Place,
    },
    /// Fire-and-forget; no completion is delivered.
    OpenExternally(Place),
}

/// A service result delivered back to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Search {
        id: RequestId,
        result: Result<Vec<Place>, ServiceError>,
    },
    Route {
        id: RequestId,
        destination: Place,
        result: Result<Route, ServiceError>,
    },
    Preview {
        id: RequestId,
        place: Place,
        result: Result<Option<PreviewScene>, ServiceError>,
    },
}

impl Completion {
    #[must_use]
    pub fn id(&self) -> RequestId {
        match self {
            Self::Search { id, .. } | Self::Route { id, .. } | Self::Preview { id, .. } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generations_are_per_kind() {
        let mut generations = Generations::new();
        let s1 = generations.next(RequestKind::Search);
        let r1 = generations.next(RequestKind::Route);
        let s2 = generations.next(RequestKind::Search);

        assert_eq!(s1.generation, 1);
        assert_eq!(r1.generation, 1);
        assert_eq!(s2.generation, 2);

        assert!(!generations.is_current(s1));
        assert!(generations.is_current(s2));
        assert!(generations.is_current(r1));
    }

    #[test]
    fn test_nothing_is_current_before_issue() {
        let generations = Generations::new();
        assert!(!generations.is_current(RequestId {
            kind: RequestKind::Imagery,
            generation: 0,
        }));
    }
}
