//! Per worker-day mutual exclusion.
//!
//! Live punches and the auto-close scan both take the `(worker, date)` lock
//! around read → validate → write. Different workers never share a lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tokio::sync::{Mutex as TokioMutex, OwnedMutexGuard};

type Key = (i64, NaiveDate);

#[derive(Default)]
pub struct ShiftLocks {
    slots: Mutex<HashMap<Key, Arc<TokioMutex<()>>>>,
}

pub struct ShiftGuard {
    _guard: OwnedMutexGuard<()>,
}

impl ShiftLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, worker_id: i64, date: NaiveDate) -> ShiftGuard {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            // Drop slots nobody holds or waits on.
            slots.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(slots.entry((worker_id, date)).or_default())
        };
        ShiftGuard {
            _guard: slot.lock_owned().await,
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
