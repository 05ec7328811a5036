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

//! Detail panel lifecycle.
//!
//! The panel is bound to the map screen's selection while it is visible. Each
//! change of bound place clears the preview and issues a fresh imagery lookup;
//! a lookup result is shown only if it answers the latest lookup for the place
//! that is still bound. User actions come out as [`PanelIntent`]s for the map
//! screen to interpret.

use log::{debug, warn};

use crate::command::{Command, Completion, Generations, RequestId, RequestKind};
use crate::model::{Place, PreviewScene};

/// Preview imagery state for the bound place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Preview {
    /// Panel not bound to anything.
    #[default]
    Unbound,
    /// Lookup in flight. Nothing from an earlier place is shown.
    Loading,
    Ready(PreviewScene),
    /// Lookup failed or found nothing; the panel shows a placeholder.
    Unavailable,
}

/// Actions the panel asks the map screen to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelIntent {
    Dismiss,
    RequestDirections,
    OpenExternally(Place),
}

/// State owned by the detail panel.
#[derive(Debug, Default)]
pub struct DetailPanel {
    bound: Option<Place>,
    preview: Preview,
    generations: Generations,
    pending: Option<RequestId>,
}

impl DetailPanel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the panel to the place it should show, or `None` when hidden.
    ///
    /// Call whenever the selection or visibility may have changed. Returns the
    /// imagery lookup to dispatch when the bound place changed.
    pub fn bind(&mut self, place: Option<&Place>) -> Option<Command> {
        let Some(place) = place else {
            if self.bound.take().is_some() {
                debug!("Detail panel dismissed");
                self.preview = Preview::Unbound;
                self.pending = None;
            }
            return None;
        };

        if self.bound.as_ref().is_some_and(|bound| bound.same_as(place)) {
            return None;
        }

        let id = self.generations.next(RequestKind::Imagery);
        debug!("Looking up preview for '{}' (request {})", place.name, id.generation);

        self.bound = Some(place.clone());
        self.preview = Preview::Loading;
        self.pending = Some(id);

        Some(Command::LookupPreview {
            id,
            place: place.clone(),
        })
    }

    /// Apply an imagery completion. Returns `false` if it was discarded.
    pub fn apply(&mut self, completion: Completion) -> bool {
        let Completion::Preview { id, place, result } = completion else {
            return false;
        };

        let is_bound = self.bound.as_ref().is_some_and(|bound| bound.same_as(&place));
        if !self.generations.is_current(id) || !is_bound {
            debug!("Discarding stale preview for '{}'", place.name);
            return false;
        }

        self.pending = None;
        self.preview = match result {
            Ok(Some(scene)) => Preview::Ready(scene),
            Ok(None) => Preview::Unavailable,
            Err(e) => {
                warn!("{}", e);
                Preview::Unavailable
            }
        };
        true
    }

    #[must_use]
    pub fn bound_place(&self) -> Option<&Place> {
        self.bound.as_ref()
    }

    #[must_use]
    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.bound.as_ref().map_or("", |place| place.name.as_str())
    }

    #[must_use]
    pub fn subtitle(&self) -> &str {
        self.bound.as_ref().map_or("", |place| place.subtitle.as_str())
    }

    /// "Open in Map": hand the bound place to the external map application.
    #[must_use]
    pub fn open_externally(&self) -> Option<PanelIntent> {
        self.bound.clone().map(PanelIntent::OpenExternally)
    }

    /// "Get Directions".
    #[must_use]
    pub fn request_directions(&self) -> PanelIntent {
        PanelIntent::RequestDirections
    }

    /// Close button.
    #[must_use]
    pub fn dismiss(&self) -> PanelIntent {
        PanelIntent::Dismiss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::services::ServiceError;

    fn place(id: &str) -> Place {
        Place::new(id, format!("Place {id}"), "Somewhere", Coordinate::new(10.75, 106.69))
    }

    fn scene(url: &str) -> PreviewScene {
        PreviewScene {
            image_url: url.to_string(),
            page_url: None,
            attribution: None,
        }
    }

    fn lookup_id(command: Option<Command>) -> RequestId {
        match command {
            Some(Command::LookupPreview { id, .. }) => id,
            other => panic!("expected preview lookup, got {other:?}"),
        }
    }

    #[test]
    fn test_bind_issues_lookup_and_clears_preview() {
        let mut panel = DetailPanel::new();
        let a = place("a");

        let id = lookup_id(panel.bind(Some(&a)));
        assert_eq!(panel.preview(), &Preview::Loading);
        assert!(panel.apply(Completion::Preview {
            id,
            place: a.clone(),
            result: Ok(Some(scene("a.jpg"))),
        }));
        assert_eq!(panel.preview(), &Preview::Ready(scene("a.jpg")));

        // Rebinding the same place is a no-op.
        assert!(panel.bind(Some(&a)).is_none());

        // A new place clears the old preview straight away.
        let b = place("b");
        lookup_id(panel.bind(Some(&b)));
        assert_eq!(panel.preview(), &Preview::Loading);
        assert_eq!(panel.title(), "Place b");
    }

    #[test]
    fn test_late_result_for_previous_place_is_dropped() {
        let mut panel = DetailPanel::new();
        let a = place("a");
        let b = place("b");

        let id_a = lookup_id(panel.bind(Some(&a)));
        let id_b = lookup_id(panel.bind(Some(&b)));

        assert!(!panel.apply(Completion::Preview {
            id: id_a,
            place: a,
            result: Ok(Some(scene("a.jpg"))),
        }));
        assert_eq!(panel.preview(), &Preview::Loading);

        assert!(panel.apply(Completion::Preview {
            id: id_b,
            place: b,
            result: Ok(Some(scene("b.jpg"))),
        }));
        assert_eq!(panel.preview(), &Preview::Ready(scene("b.jpg")));
    }

    #[test]
    fn test_result_after_dismiss_is_dropped() {
        let mut panel = DetailPanel::new();
        let a = place("a");
        let id = lookup_id(panel.bind(Some(&a)));

        assert!(panel.bind(None).is_none());
        assert!(!panel.apply(Completion::Preview {
            id,
            place: a,
            result: Ok(Some(scene("a.jpg"))),
        }));
        assert_eq!(panel.preview(), &Preview::Unbound);
        assert!(panel.bound_place().is_none());
    }

    #[test]
    fn test_unavailable_imagery_shows_placeholder_state() {
        let mut panel = DetailPanel::new();
        let a = place("a");
        let id = lookup_id(panel.bind(Some(&a)));

        assert!(panel.apply(Completion::Preview {
            id,
            place: a.clone(),
            result: Ok(None),
        }));
        assert_eq!(panel.preview(), &Preview::Unavailable);

        let id = lookup_id({
            panel.bind(None);
            panel.bind(Some(&a))
        });
        assert!(panel.apply(Completion::Preview {
            id,
            place: a,
            result: Err(ServiceError::ImageryUnavailable("timeout".into())),
        }));
        assert_eq!(panel.preview(), &Preview::Unavailable);
    }

    #[test]
    fn test_intents() {
        let mut panel = DetailPanel::new();
        assert!(panel.open_externally().is_none());

        let a = place("a");
        panel.bind(Some(&a));
        assert_eq!(panel.open_externally(), Some(PanelIntent::OpenExternally(a)));
        assert_eq!(panel.request_directions(), PanelIntent::RequestDirections);
        assert_eq!(panel.dismiss(), PanelIntent::Dismiss);
    }
}
