//! Client-side submission and replay of deferred punches.
//!
//! The "online" event and the periodic timer both call [`OfflineSync::sweep`],
//! which is single-flight. Replays go through the same server entry point as
//! live punches. An entry leaves the queue only when the server answered for
//! it, accepted or rejected; a rejection is handed back to the caller.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::core::clock::Clock;
use crate::core::tracker::ShiftTracker;
use crate::errors::{PunchError, Rejection};
use crate::models::punch::PunchEvent;
use crate::models::shift::Shift;
use crate::offline::policy::{self, Connectivity, Dispatch};
use crate::offline::queue::OfflineQueue;

#[derive(Debug, Clone)]
pub enum TransportError {
    /// No answer from the server; the punch may be retried.
    Unreachable(String),
    /// The server answered with a domain rejection.
    Rejected(Rejection),
}

/// Client transport to the punch entry point.
#[async_trait]
pub trait PunchTransport: Send + Sync {
    async fn submit(&self, worker_id: i64, event: PunchEvent) -> Result<Shift, TransportError>;
}

/// In-process transport straight into a tracker.
pub struct LocalTransport {
    tracker: Arc<ShiftTracker>,
}

impl LocalTransport {
    pub fn new(tracker: Arc<ShiftTracker>) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl PunchTransport for LocalTransport {
    async fn submit(&self, worker_id: i64, event: PunchEvent) -> Result<Shift, TransportError> {
        self.tracker
            .punch(worker_id, event)
            .await
            .map_err(|e| {
                if e.is_retryable() {
                    TransportError::Unreachable(e.to_string())
                } else {
                    TransportError::Rejected(e.to_rejection())
                }
            })
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Sent(Shift),
    Queued(u64),
    Rejected(Rejection),
}

#[derive(Debug, Default)]
pub struct SweepReport {
    /// Another sweep was in flight; nothing was done.
    pub skipped: bool,
    pub replayed: Vec<(u64, Shift)>,
    pub rejected: Vec<(u64, Rejection)>,
    pub remaining: usize,
}

pub struct OfflineSync {
    queue: Mutex<OfflineQueue>,
    transport: Arc<dyn PunchTransport>,
    clock: Arc<dyn Clock>,
    in_flight: Mutex<()>,
    persist_to: Option<PathBuf>,
}

impl OfflineSync {
    pub fn new(transport: Arc<dyn PunchTransport>, clock: Arc<dyn Clock>) -> Self {
        Self {
            queue: Mutex::new(OfflineQueue::new()),
            transport,
            clock,
            in_flight: Mutex::new(()),
            persist_to: None,
        }
    }

    /// Keeps the queue in a JSON file, loading what is already there.
    pub fn persisted(mut self, path: PathBuf) -> crate::errors::AppResult<Self> {
        self.queue = Mutex::new(OfflineQueue::load(&path)?);
        self.persist_to = Some(path);
        Ok(self)
    }

    fn save(&self, queue: &OfflineQueue) {
        if let Some(path) = &self.persist_to
            && let Err(e) = queue.save(path)
        {
            warn!(path = %path.display(), error = %e, "could not persist offline queue");
        }
    }

    pub async fn pending(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn snapshot(&self) -> OfflineQueue {
        self.queue.lock().await.clone()
    }

    /// Sends, queues or refuses one punch according to the offline policy.
    pub async fn submit(
        &self,
        worker_id: i64,
        event: PunchEvent,
        conn: Connectivity,
    ) -> Result<SubmitOutcome, PunchError> {
        match policy::dispatch(event.kind, conn)? {
            Dispatch::Queue => {}
            Dispatch::Send => match self.transport.submit(worker_id, event.clone()).await {
                Ok(shift) => return Ok(SubmitOutcome::Sent(shift)),
                Err(TransportError::Rejected(r)) => return Ok(SubmitOutcome::Rejected(r)),
                Err(TransportError::Unreachable(msg)) => {
                    // The device believed it was online. Re-apply the policy as offline.
                    debug!(error = %msg, "server unreachable, falling back to offline policy");
                    let offline = Connectivity {
                        online: false,
                        ..conn
                    };
                    policy::dispatch(event.kind, offline)?;
                }
            },
        }

        let mut queue = self.queue.lock().await;
        let id = queue.enqueue(worker_id, event, self.clock.now());
        self.save(&queue);
        info!(entry = id, worker_id, pending = queue.len(), "punch queued offline");
        Ok(SubmitOutcome::Queued(id))
    }

    /// Replays queued punches oldest first. Stops at the first entry the
    /// server could not be reached for; it stays at the head of the queue.
    pub async fn sweep(&self) -> SweepReport {
        let Ok(_flight) = self.in_flight.try_lock() else {
            debug!("replay sweep already running");
            return SweepReport {
                skipped: true,
                ..SweepReport::default()
            };
        };

        let mut report = SweepReport::default();
        loop {
            let Some(entry) = self.queue.lock().await.front().cloned() else {
                break;
            };

            match self.transport.submit(entry.worker_id, entry.event.clone()).await {
                Ok(shift) => {
                    let mut queue = self.queue.lock().await;
                    queue.remove(entry.id);
                    self.save(&queue);
                    report.replayed.push((entry.id, shift));
                }
                Err(TransportError::Rejected(rejection)) => {
                    warn!(
                        entry = entry.id,
                        punch = %entry.event.kind,
                        kind = ?rejection.error_kind,
                        "queued punch rejected by server: {}",
                        rejection.message
                    );
                    let mut queue = self.queue.lock().await;
                    queue.remove(entry.id);
                    self.save(&queue);
                    report.rejected.push((entry.id, rejection));
                }
                Err(TransportError::Unreachable(msg)) => {
                    debug!(entry = entry.id, error = %msg, "server unreachable, sweep paused");
                    break;
                }
            }
        }

        report.remaining = self.queue.lock().await.len();
        report
    }

    /// Connectivity came back.
    pub async fn on_online(&self) -> SweepReport {
        self.sweep().await
    }

    /// Periodic sweep. Abort the handle to stop it.
    pub fn spawn_timer(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let report = this.sweep().await;
                if !report.replayed.is_empty() || !report.rejected.is_empty() {
                    info!(
                        replayed = report.replayed.len(),
                        rejected = report.rejected.len(),
                        remaining = report.remaining,
                        "offline queue swept"
                    );
                }
            }
        })
    }
}
