//! Latest-edit-wins driver for interactive front ends.
//!
//! Every [`Session::submit`] bumps the revision and cancels the run in
//! flight. A worker thread runs submissions in order, skipping any that
//! were superseded before they started, and publishes a result only if
//! its revision is still current when the run ends.

use crate::runner::{RunResult, Runner};
use crossbeam_channel::{Receiver, Sender};
use genplay_core::CancellationToken;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info};

/// Outcome of one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The run finished and its result is now [`Session::latest`].
    Completed {
        /// Submission revision.
        revision: u64,
    },
    /// A newer submission arrived first; nothing was published.
    Superseded {
        /// Submission revision.
        revision: u64,
    },
}

struct Request {
    revision: u64,
    program: String,
    plugin: String,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Shared {
    revision: AtomicU64,
    latest: Mutex<Option<(u64, RunResult)>>,
}

/// Runs submissions on a background worker.
pub struct Session {
    shared: Arc<Shared>,
    in_flight: Mutex<Option<CancellationToken>>,
    requests: Option<Sender<Request>>,
    events: Receiver<SessionEvent>,
    worker: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("revision", &self.current_revision())
            .field("published", &self.latest_revision())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start a session and its worker thread.
    pub fn new(runner: Arc<Runner>) -> std::io::Result<Self> {
        let shared = Arc::new(Shared::default());
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<Request>();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("genplay-session".into())
            .spawn(move || work(&runner, &worker_shared, &request_rx, &event_tx))?;

        Ok(Self {
            shared,
            in_flight: Mutex::new(None),
            requests: Some(request_tx),
            events: event_rx,
            worker: Some(worker),
        })
    }

    /// Queue a run, superseding every earlier submission. Returns its
    /// revision.
    pub fn submit(&self, program: impl Into<String>, plugin: impl Into<String>) -> u64 {
        let cancel = CancellationToken::new();
        let mut in_flight = self.in_flight.lock();
        let revision = self.shared.revision.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = in_flight.replace(cancel.clone()) {
            previous.cancel();
        }
        drop(in_flight);
        debug!(revision, "submitted run");

        if let Some(requests) = &self.requests {
            // Fails only once the worker has exited.
            let _ = requests.send(Request {
                revision,
                program: program.into(),
                plugin: plugin.into(),
                cancel,
            });
        }
        revision
    }

    /// Completion events, one per submission.
    pub fn events(&self) -> Receiver<SessionEvent> {
        self.events.clone()
    }

    /// Revision of the newest submission, 0 before the first.
    pub fn current_revision(&self) -> u64 {
        self.shared.revision.load(Ordering::SeqCst)
    }

    /// Revision of the published result.
    pub fn latest_revision(&self) -> Option<u64> {
        self.shared.latest.lock().as_ref().map(|(revision, _)| *revision)
    }

    /// The last published result.
    pub fn latest(&self) -> Option<RunResult> {
        self.shared.latest.lock().as_ref().map(|(_, result)| result.clone())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(cancel) = self.in_flight.lock().take() {
            cancel.cancel();
        }
        self.requests = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn work(runner: &Runner, shared: &Shared, requests: &Receiver<Request>, events: &Sender<SessionEvent>) {
    for request in requests {
        let revision = request.revision;
        let current = || shared.revision.load(Ordering::SeqCst) == revision;

        let event = if current() {
            match runner.run_cancellable(&request.program, &request.plugin, &request.cancel) {
                Ok(result) => {
                    let mut latest = shared.latest.lock();
                    if current() {
                        *latest = Some((revision, result));
                        SessionEvent::Completed { revision }
                    } else {
                        SessionEvent::Superseded { revision }
                    }
                }
                Err(_) => SessionEvent::Superseded { revision },
            }
        } else {
            SessionEvent::Superseded { revision }
        };

        if let SessionEvent::Superseded { .. } = event {
            info!(revision, "run superseded");
        }
        if events.send(event).is_err() {
            break;
        }
    }
}
