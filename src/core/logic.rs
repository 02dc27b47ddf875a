//! Process wiring: one store, one lock table and one clock shared by the
//! tracker and the auto-close scan.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::core::autoclose::{AUTO_CLOSE_REASON, AutoCloseSettings, AutoCloser};
use crate::core::clock::Clock;
use crate::core::locks::ShiftLocks;
use crate::core::notify::LogNotifier;
use crate::core::scheduler::Scheduler;
use crate::core::tracker::{ShiftTracker, TrackerSettings};
use crate::db::SqliteStore;
use crate::errors::AppResult;
use crate::offline::{LocalTransport, OfflineSync};

pub const AUTO_CLOSE_TASK: &str = "auto_close";

pub struct Engine {
    pub store: SqliteStore,
    pub tracker: Arc<ShiftTracker>,
    pub auto_closer: Arc<AutoCloser>,
    pub clock: Arc<dyn Clock>,
    auto_close_every: Duration,
    replay_every: Duration,
}

impl Engine {
    pub fn open(cfg: &Config, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let store = SqliteStore::open(&cfg.database, cfg.geofence_policy())?;
        Ok(Self::with_store(store, cfg, clock))
    }

    pub fn with_store(store: SqliteStore, cfg: &Config, clock: Arc<dyn Clock>) -> Self {
        let locks = Arc::new(ShiftLocks::new());
        let shared = Arc::new(store.clone());

        let tracker = Arc::new(ShiftTracker::new(
            shared.clone(),
            shared.clone(),
            locks.clone(),
            clock.clone(),
            TrackerSettings {
                rules: cfg.rules(),
                legal_daily_hours: cfg.legal_daily_hours,
                deadline: cfg.collaborator_timeout(),
                max_clock_skew: cfg.max_clock_skew(),
            },
        ));

        let auto_closer = Arc::new(AutoCloser::new(
            shared.clone(),
            shared,
            Arc::new(LogNotifier::new(Some(store.clone()))),
            locks,
            clock.clone(),
            AutoCloseSettings {
                threshold: cfg.auto_close_after(),
                legal_daily_hours: cfg.legal_daily_hours,
                deadline: cfg.collaborator_timeout(),
                reason: AUTO_CLOSE_REASON.to_string(),
            },
        ));

        Self {
            store,
            tracker,
            auto_closer,
            clock,
            auto_close_every: Duration::from_secs(cfg.auto_close_interval_secs),
            replay_every: cfg.replay_interval(),
        }
    }

    /// Scheduler with the auto-close scan registered, not yet started.
    pub fn scheduler(&self) -> Scheduler {
        let mut scheduler = Scheduler::new();
        scheduler.register(AUTO_CLOSE_TASK, self.auto_close_every, self.auto_closer.clone());
        scheduler
    }

    /// Offline client wired straight into this engine's tracker, with its
    /// queue kept in `queue_file` when given.
    pub fn offline_sync(&self, queue_file: Option<PathBuf>) -> AppResult<Arc<OfflineSync>> {
        let sync = OfflineSync::new(
            Arc::new(LocalTransport::new(self.tracker.clone())),
            self.clock.clone(),
        );
        let sync = match queue_file {
            Some(path) => sync.persisted(path)?,
            None => sync,
        };
        Ok(Arc::new(sync))
    }

    pub fn replay_interval(&self) -> Duration {
        self.replay_every
    }
}
