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

//! Background execution of [`Command`]s.
//!
//! The worker owns a dedicated thread running a tokio runtime. Commands are
//! queued from the UI thread without blocking; each one runs as its own task
//! and its [`Completion`] is sent back over a channel that the UI drains once
//! per frame. Ordering between completions is not guaranteed, which is why
//! every completion carries the [`crate::command::RequestId`] it answers.

use std::sync::Arc;
use std::thread::JoinHandle;

use log::{debug, error, info, warn};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::command::{Command, Completion};
use crate::services::Services;

/// Called after every delivered completion so the UI can schedule a repaint.
pub type RepaintHook = Arc<dyn Fn() + Send + Sync>;

/// Run a single command against `services`.
///
/// Returns `None` for fire-and-forget commands.
pub async fn execute(services: &Services, command: Command) -> Option<Completion> {
    match command {
        Command::Search { id, query, anchor } => {
            debug!("Searching for '{query}' ({id:?})");
            let result = services.search.search(&query, &anchor).await;
            Some(Completion::Search { id, result })
        }
        Command::Route { id, from, to } => {
            debug!("Routing to {} ({id:?})", to.name);
            let result = services.routing.route(from, &to).await;
            Some(Completion::Route {
                id,
                destination: to,
                result,
            })
        }
        Command::LookupPreview { id, place } => {
            let result = services.imagery.lookup(&place).await;
            Some(Completion::Preview { id, place, result })
        }
        Command::OpenExternally(place) => {
            let handoff = Arc::clone(&services.handoff);
            let outcome = tokio::task::spawn_blocking(move || handoff.open(&place)).await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("{e}"),
                Err(e) => error!("External hand-off task failed: {e}"),
            }
            None
        }
    }
}

/// Handle to the background request thread.
pub struct Worker {
    commands: UnboundedSender<Command>,
    completions: UnboundedReceiver<Completion>,
    cancel_token: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("cancelled", &self.cancel_token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Worker {
    /// Start the worker thread.
    pub fn spawn(services: Services, repaint: RepaintHook) -> std::io::Result<Self> {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();

        let token = cancel_token.clone();
        let thread = std::thread::Builder::new()
            .name("places-worker".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Runtime::new() {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!("Failed to start request runtime: {e}");
                        return;
                    }
                };
                rt.block_on(run(services, command_rx, completion_tx, repaint, token));
                // Abandon in-flight hand-offs instead of waiting on them.
                rt.shutdown_background();
            })?;

        info!("Request worker started");

        Ok(Self {
            commands: command_tx,
            completions: completion_rx,
            cancel_token,
            thread: Some(thread),
        })
    }

    /// Queue a command. Commands sent after shutdown are dropped.
    pub fn dispatch(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("Request worker is not running; command dropped");
        }
    }

    /// Queue every command from `commands`.
    pub fn dispatch_all(&self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.dispatch(command);
        }
    }

    /// Next completion if one is ready.
    pub fn try_recv(&mut self) -> Option<Completion> {
        match self.completions.try_recv() {
            Ok(completion) => Some(completion),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// All completions that are ready right now.
    pub fn drain(&mut self) -> Vec<Completion> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Block until the next completion arrives. Must not be called from async code.
    pub fn blocking_recv(&mut self) -> Option<Completion> {
        self.completions.blocking_recv()
    }

    /// Stop accepting work and abandon in-flight requests.
    pub fn shutdown(&mut self) {
        if self.cancel_token.is_cancelled() {
            return;
        }
        info!("Stopping request worker");
        self.cancel_token.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Request worker thread panicked");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run(
    services: Services,
    mut commands: UnboundedReceiver<Command>,
    completions: UnboundedSender<Completion>,
    repaint: RepaintHook,
    cancel_token: CancellationToken,
) {
    loop {
        let command = tokio::select! {
            () = cancel_token.cancelled() => break,
            command = commands.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };

        let services = services.clone();
        let completions = completions.clone();
        let repaint = Arc::clone(&repaint);
        let token = cancel_token.clone();

        tokio::spawn(async move {
            let completion = tokio::select! {
                () = token.cancelled() => return,
                completion = execute(&services, command) => completion,
            };
            if let Some(completion) = completion {
                if completions.send(completion).is_ok() {
                    repaint();
                }
            }
        });
    }
    debug!("Request worker loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::command::{Generations, RequestKind};
    use crate::geo::{Coordinate, Region};
    use crate::model::{Place, PreviewScene, Route};
    use crate::services::{ExternalHandoff, PlaceSearch, PreviewImagery, RoutePlanner, ServiceError};

    struct Fixed;

    #[async_trait]
    impl PlaceSearch for Fixed {
        async fn search(&self, query: &str, _anchor: &Region) -> Result<Vec<Place>, ServiceError> {
            Ok(vec![Place::new("p1", query, "", Coordinate::new(1.0, 2.0))])
        }
    }

    #[async_trait]
    impl RoutePlanner for Fixed {
        async fn route(&self, _from: Coordinate, _to: &Place) -> Result<Route, ServiceError> {
            Err(ServiceError::RouteNotFound("none".to_string()))
        }
    }

    #[async_trait]
    impl PreviewImagery for Fixed {
        async fn lookup(&self, _place: &Place) -> Result<Option<PreviewScene>, ServiceError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct RecordingHandoff(Mutex<Vec<String>>);

    impl ExternalHandoff for RecordingHandoff {
        fn open(&self, place: &Place) -> Result<(), ServiceError> {
            self.0.lock().unwrap().push(place.name.clone());
            Ok(())
        }
    }

    fn services(handoff: Arc<RecordingHandoff>) -> Services {
        Services {
            search: Arc::new(Fixed),
            routing: Arc::new(Fixed),
            imagery: Arc::new(Fixed),
            handoff,
        }
    }

    #[tokio::test]
    async fn test_execute_search_and_handoff() {
        let handoff = Arc::new(RecordingHandoff::default());
        let services = services(Arc::clone(&handoff));
        let mut generations = Generations::new();
        let id = generations.next(RequestKind::Search);

        let completion = execute(
            &services,
            Command::Search {
                id,
                query: "coffee".to_string(),
                anchor: Region::from_meters(Coordinate::new(1.0, 2.0), 100.0, 100.0),
            },
        )
        .await;
        match completion {
            Some(Completion::Search { id: got, result }) => {
                assert_eq!(got, id);
                assert_eq!(result.unwrap()[0].name, "coffee");
            }
            other => panic!("unexpected completion: {other:?}"),
        }

        let place = Place::new("p2", "Museum", "", Coordinate::new(0.0, 0.0));
        assert!(execute(&services, Command::OpenExternally(place)).await.is_none());
        assert_eq!(*handoff.0.lock().unwrap(), vec!["Museum".to_string()]);
    }

    #[test]
    fn test_worker_delivers_completions_and_repaints() {
        let repaints = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&repaints);
        let mut worker = Worker::spawn(
            services(Arc::new(RecordingHandoff::default())),
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

        let mut generations = Generations::new();
        let id = generations.next(RequestKind::Route);
        worker.dispatch(Command::Route {
            id,
            from: Coordinate::new(0.0, 0.0),
            to: Place::new("p1", "Cafe", "", Coordinate::new(0.1, 0.1)),
        });

        let completion = worker.blocking_recv().unwrap();
        assert_eq!(completion.id(), id);
        assert!(matches!(
            completion,
            Completion::Route { result: Err(ServiceError::RouteNotFound(_)), .. }
        ));
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while repaints.load(Ordering::SeqCst) == 0 && std::time::Instant::now() < deadline {
            std::thread::yield_now();
        }
        assert_eq!(repaints.load(Ordering::SeqCst), 1);

        worker.shutdown();
        worker.dispatch(Command::OpenExternally(Place::new("p1", "Cafe", "", Coordinate::new(0.0, 0.0))));
        assert!(worker.try_recv().is_none());
    }
}
