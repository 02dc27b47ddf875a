//! Named recurring tasks with an explicit start/stop lifecycle.
//!
//! Each task is single-flight: a tick that arrives while the previous run is
//! still in progress is skipped, never queued.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[async_trait]
pub trait RecurringTask: Send + Sync + 'static {
    async fn run(&self);
}

struct Registration {
    name: String,
    period: Duration,
    task: Arc<dyn RecurringTask>,
    in_flight: Arc<Mutex<()>>,
}

#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<Registration>,
    shutdown: Option<watch::Sender<bool>>,
    handles: Vec<JoinHandle<()>>,
}

/// Runs `task` unless a run is already in flight. Returns whether it ran.
async fn run_guarded(name: &str, task: &Arc<dyn RecurringTask>, in_flight: &Arc<Mutex<()>>) -> bool {
    let Ok(_guard) = Arc::clone(in_flight).try_lock_owned() else {
        debug!(task = name, "previous run still in progress, tick skipped");
        return false;
    };
    task.run().await;
    true
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `task` to run every `period`. Must be called before `start`.
    pub fn register(&mut self, name: impl Into<String>, period: Duration, task: Arc<dyn RecurringTask>) {
        self.tasks.push(Registration {
            name: name.into(),
            period,
            task,
            in_flight: Arc::new(Mutex::new(())),
        });
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_some()
    }

    /// Runs the named task immediately, through the same single-flight guard
    /// as the timer. `None` if no task has that name.
    pub async fn run_now(&self, name: &str) -> Option<bool> {
        let reg = self.tasks.iter().find(|r| r.name == name)?;
        Some(run_guarded(&reg.name, &reg.task, &reg.in_flight).await)
    }

    /// Spawns one timer loop per task. The first tick fires immediately.
    pub fn start(&mut self) {
        if self.is_running() {
            warn!("scheduler already started");
            return;
        }
        let (tx, rx) = watch::channel(false);

        for reg in &self.tasks {
            let name = reg.name.clone();
            let period = reg.period;
            let task = Arc::clone(&reg.task);
            let in_flight = Arc::clone(&reg.in_flight);
            let mut stop = rx.clone();

            let handle = tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                info!(task = %name, period_secs = period.as_secs(), "recurring task started");

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let (name, task, in_flight) = (name.clone(), Arc::clone(&task), Arc::clone(&in_flight));
                            tokio::spawn(async move {
                                run_guarded(&name, &task, &in_flight).await;
                            });
                        }
                        changed = stop.changed() => {
                            if changed.is_err() || *stop.borrow() {
                                break;
                            }
                        }
                    }
                }
                info!(task = %name, "recurring task stopped");
            });
            self.handles.push(handle);
        }

        self.shutdown = Some(tx);
    }

    /// Stops the timers and waits for in-flight runs to finish.
    pub async fn stop(&mut self) {
        let Some(tx) = self.shutdown.take() else {
            return;
        };
        let _ = tx.send(true);
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "recurring task loop ended abnormally");
            }
        }
        for reg in &self.tasks {
            let _idle = reg.in_flight.lock().await;
        }
    }
}
