use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::clock::{self, LocalTime};
use crate::errors::AppResult;
use crate::models::punch::PunchEvent;

/// A punch waiting on the device for connectivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineQueueEntry {
    pub id: u64,
    pub worker_id: i64,
    pub event: PunchEvent,
    #[serde(with = "clock::local")]
    pub created_at: LocalTime,
}

/// Device-local FIFO of deferred punches, in creation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfflineQueue {
    entries: VecDeque<OfflineQueueEntry>,
    next_id: u64,
}

impl OfflineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `event`. The punch keeps the instant it was taken on the device.
    pub fn enqueue(&mut self, worker_id: i64, mut event: PunchEvent, created_at: LocalTime) -> u64 {
        if event.timestamp.is_none() {
            event.timestamp = Some(created_at);
        }
        event.replayed = true;
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push_back(OfflineQueueEntry {
            id,
            worker_id,
            event,
            created_at,
        });
        id
    }

    pub fn front(&self) -> Option<&OfflineQueueEntry> {
        self.entries.front()
    }

    /// Removes an entry once the server has answered for it.
    pub fn remove(&mut self, id: u64) -> Option<OfflineQueueEntry> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        self.entries.remove(pos)
    }

    pub fn entries(&self) -> impl Iterator<Item = &OfflineQueueEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
