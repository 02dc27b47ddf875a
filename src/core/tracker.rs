//! Punch entry point.
//!
//! Live punches and replayed offline punches both come through
//! [`ShiftTracker::punch`]: geofence → per worker-day lock → read → state
//! machine → accounting → write.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::core::calculator::accounting::{self, DEFAULT_LEGAL_DAILY_HOURS};
use crate::core::calculator::summary::{self, RangeSummary};
use crate::core::clock::{self, Clock};
use crate::core::geofence::{GeofenceCheck, GeofenceValidator, LocationResolver};
use crate::core::locks::ShiftLocks;
use crate::core::state_machine::{self, Rules};
use crate::db::store::ShiftStore;
use crate::errors::{AppResult, PunchError};
use crate::models::punch::{PunchEvent, PunchKind};
use crate::models::shift::{Shift, ShiftStatus};

#[derive(Debug, Clone, Copy)]
pub struct TrackerSettings {
    pub rules: Rules,
    pub legal_daily_hours: f64,
    /// Bound on every storage and location lookup.
    pub deadline: Duration,
    /// How far a client timestamp may run ahead of the server clock, and how
    /// far behind it a live punch may be stamped.
    pub max_clock_skew: chrono::Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            rules: Rules::default(),
            legal_daily_hours: DEFAULT_LEGAL_DAILY_HOURS,
            deadline: Duration::from_secs(5),
            max_clock_skew: chrono::Duration::seconds(120),
        }
    }
}

pub struct ShiftTracker {
    store: Arc<dyn ShiftStore>,
    geofence: GeofenceValidator,
    locks: Arc<ShiftLocks>,
    clock: Arc<dyn Clock>,
    settings: TrackerSettings,
}

/// Note stored on the shift when the user overrode a failed check on a break.
fn override_note(kind: PunchKind, check: &GeofenceCheck) -> String {
    if check.timed_out {
        format!("{kind}: ubicación no verificada, confirmada por el usuario")
    } else {
        format!(
            "{kind}: fuera de zona ({:.0} m de '{}', tolerancia {:.0} m), confirmada por el usuario",
            check.distance_m,
            check.reference.as_deref().unwrap_or(""),
            check.tolerance_m
        )
    }
}

impl ShiftTracker {
    pub fn new(
        store: Arc<dyn ShiftStore>,
        resolver: Arc<dyn LocationResolver>,
        locks: Arc<ShiftLocks>,
        clock: Arc<dyn Clock>,
        settings: TrackerSettings,
    ) -> Self {
        Self {
            store,
            geofence: GeofenceValidator::new(resolver, settings.deadline),
            locks,
            clock,
            settings,
        }
    }

    async fn bounded<T>(&self, fut: impl Future<Output = AppResult<T>>) -> Result<T, PunchError> {
        match tokio::time::timeout(self.settings.deadline, fut).await {
            Ok(res) => res.map_err(PunchError::from),
            Err(_) => Err(PunchError::TransientPersistence(format!(
                "storage did not answer within {} ms",
                self.settings.deadline.as_millis()
            ))),
        }
    }

    /// The day whose shift a non-entrada punch belongs to: today's if it
    /// exists, otherwise yesterday's if still open (night shifts).
    async fn shift_day(&self, worker_id: i64, date: NaiveDate) -> Result<NaiveDate, PunchError> {
        if self.bounded(self.store.get_shift(worker_id, date)).await?.is_some() {
            return Ok(date);
        }
        if let Some(prev) = date.pred_opt()
            && self
                .bounded(self.store.get_open_shift(worker_id, prev))
                .await?
                .is_some()
        {
            return Ok(prev);
        }
        Ok(date)
    }

    /// Applies one punch for `worker_id` and returns the stored shift.
    pub async fn punch(&self, worker_id: i64, event: PunchEvent) -> Result<Shift, PunchError> {
        event.coordinate.validate()?;
        let kind = event.kind;
        let now = clock::truncate_seconds(self.clock.now());
        let at = event.timestamp.map_or(now, clock::truncate_seconds);

        let skew = self.settings.max_clock_skew;
        if at > now + skew {
            warn!(worker_id, punch = %kind, at = %clock::to_storage(&at), now = %clock::to_storage(&now), "punch stamped ahead of server clock");
            return Err(PunchError::IllegalTransition {
                punch: kind,
                reason: format!(
                    "la hora {} es posterior a la hora del servidor ({})",
                    at.format("%Y-%m-%d %H:%M:%S"),
                    now.format("%Y-%m-%d %H:%M:%S")
                ),
            });
        }
        // Live punches are measured no earlier than the server allows.
        let observed = if event.replayed { at } else { at.max(now - skew) };

        let check = self.geofence.validate(worker_id, event.coordinate).await;
        let mut notes: Vec<String> = Vec::new();
        if let Some(violation) = check.violation() {
            if kind.is_critical() || !event.geofence_override {
                warn!(worker_id, punch = %kind, distance_m = check.distance_m, tolerance_m = check.tolerance_m, "punch rejected by geofence");
                return Err(violation);
            }
            notes.push(override_note(kind, &check));
        }
        if let Some(obs) = &event.observations {
            notes.push(obs.clone());
        }

        let date = clock::civil_date(&at);
        let target = if kind == PunchKind::Entrada {
            date
        } else {
            self.shift_day(worker_id, date).await?
        };

        let _guard = self.locks.lock(worker_id, target).await;

        let current = self.bounded(self.store.get_shift(worker_id, target)).await?;
        let mut next = state_machine::apply_observed(
            current.as_ref(),
            worker_id,
            target,
            kind,
            at,
            observed,
            &self.settings.rules,
        )
        .inspect_err(|e| debug!(worker_id, punch = %kind, error = %e, "punch rejected"))?;

        for note in &notes {
            next.append_observation(note);
        }
        let hours = accounting::compute(&next, at, self.settings.legal_daily_hours);
        next.worked_hours = hours.worked_hours;

        let saved = if kind == PunchKind::Entrada {
            self.bounded(self.store.create_shift(&next, event.accuracy_m)).await?
        } else {
            self.bounded(self.store.append_punch(
                next.id,
                kind,
                at,
                next.worked_hours,
                &next.observations,
                event.accuracy_m,
            ))
            .await?
        };

        info!(
            worker_id,
            shift_id = saved.id,
            punch = %kind,
            at = %clock::to_storage(&at),
            worked_hours = saved.worked_hours,
            accuracy_m = event.accuracy_m,
            replayed = event.replayed,
            "punch applied"
        );
        Ok(saved)
    }

    /// The worker's current shift with live accounting: the open one
    /// (including a night shift started yesterday), else today's closed one.
    pub async fn current_shift(&self, worker_id: i64) -> Result<Option<ShiftStatus>, PunchError> {
        let now = self.clock.now();
        let today = clock::civil_date(&now);

        let mut shift = self.bounded(self.store.get_shift(worker_id, today)).await?;
        if shift.as_ref().is_none_or(|s| s.is_closed())
            && let Some(prev) = today.pred_opt()
            && let Some(open) = self.bounded(self.store.get_open_shift(worker_id, prev)).await?
        {
            shift = Some(open);
        }

        Ok(shift.map(|s| {
            let hours = accounting::compute(&s, now, self.settings.legal_daily_hours);
            ShiftStatus {
                state: s.state(),
                hours,
                shift: s,
            }
        }))
    }

    /// Per-day and total hour buckets over `[from, to]`.
    pub async fn summary(
        &self,
        worker_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        legal_daily_hours: Option<f64>,
    ) -> Result<RangeSummary, PunchError> {
        let shifts = self
            .bounded(self.store.list_shifts(worker_id, from, to))
            .await?;
        Ok(summary::summarize(
            &shifts,
            from,
            to,
            self.clock.now(),
            legal_daily_hours.unwrap_or(self.settings.legal_daily_hours),
        ))
    }
}
