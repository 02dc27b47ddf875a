//! Forced close of shifts left open past the threshold.
//!
//! A run never fails outward: a shift that cannot be closed is logged and
//! listed in the report, and the scan continues. Eligibility is re-checked
//! under the worker-day lock, so repeated or concurrent runs only act on
//! shifts that are still open.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::core::calculator::accounting::{self, DEFAULT_LEGAL_DAILY_HOURS};
use crate::core::clock::{self, Clock, LocalTime};
use crate::core::locks::ShiftLocks;
use crate::core::notify::{AutoCloseNotice, Notifier};
use crate::core::scheduler::RecurringTask;
use crate::core::state_machine;
use crate::db::store::{ShiftStore, WorkerDirectory};
use crate::errors::PunchError;
use crate::models::shift::Shift;

pub const AUTO_CLOSE_REASON: &str = "Cierre automático: jornada abierta por más del tiempo permitido";

#[derive(Debug, Clone)]
pub struct AutoCloseSettings {
    pub threshold: chrono::Duration,
    pub legal_daily_hours: f64,
    pub deadline: Duration,
    pub reason: String,
}

impl Default for AutoCloseSettings {
    fn default() -> Self {
        Self {
            threshold: chrono::Duration::hours(8),
            legal_daily_hours: DEFAULT_LEGAL_DAILY_HOURS,
            deadline: Duration::from_secs(5),
            reason: AUTO_CLOSE_REASON.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoCloseDetail {
    pub worker_id: i64,
    pub shift_id: i64,
    pub shift_date: NaiveDate,
    pub forced_close_time: LocalTime,
    pub worked_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoCloseFailure {
    pub worker_id: i64,
    pub shift_id: i64,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AutoCloseReport {
    pub shifts_closed: usize,
    pub details: Vec<AutoCloseDetail>,
    pub failures: Vec<AutoCloseFailure>,
}

pub struct AutoCloser {
    store: Arc<dyn ShiftStore>,
    directory: Arc<dyn WorkerDirectory>,
    notifier: Arc<dyn Notifier>,
    locks: Arc<ShiftLocks>,
    clock: Arc<dyn Clock>,
    settings: AutoCloseSettings,
}

fn is_eligible(shift: &Shift, now: LocalTime, threshold: chrono::Duration) -> bool {
    match shift.entrada {
        Some(entrada) => !shift.is_closed() && !shift.auto_closed && now - entrada > threshold,
        None => false,
    }
}

impl AutoCloser {
    pub fn new(
        store: Arc<dyn ShiftStore>,
        directory: Arc<dyn WorkerDirectory>,
        notifier: Arc<dyn Notifier>,
        locks: Arc<ShiftLocks>,
        clock: Arc<dyn Clock>,
        settings: AutoCloseSettings,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            locks,
            clock,
            settings,
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = crate::errors::AppResult<T>>,
    ) -> Result<T, PunchError> {
        match tokio::time::timeout(self.settings.deadline, fut).await {
            Ok(res) => res.map_err(PunchError::from),
            Err(_) => Err(PunchError::TransientPersistence("storage timeout".into())),
        }
    }

    /// Scans once and force-closes every eligible shift.
    pub async fn run_once(&self) -> AutoCloseReport {
        let now = self.clock.now();
        let cutoff = now - self.settings.threshold;
        let mut report = AutoCloseReport::default();

        let candidates = match self
            .bounded(self.store.list_open_shifts_older_than(cutoff))
            .await
        {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, "auto-close scan could not list open shifts");
                return report;
            }
        };

        for candidate in candidates {
            match self.close_one(&candidate, now).await {
                Ok(Some(detail)) => {
                    self.notify(&detail).await;
                    report.details.push(detail);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        worker_id = candidate.worker_id,
                        shift_id = candidate.id,
                        error = %e,
                        "auto-close failed for shift"
                    );
                    report.failures.push(AutoCloseFailure {
                        worker_id: candidate.worker_id,
                        shift_id: candidate.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.shifts_closed = report.details.len();
        info!(
            closed = report.shifts_closed,
            failed = report.failures.len(),
            "auto-close scan finished"
        );
        report
    }

    async fn close_one(&self, candidate: &Shift, now: LocalTime) -> Result<Option<AutoCloseDetail>, PunchError> {
        let _guard = self.locks.lock(candidate.worker_id, candidate.date).await;

        let Some(shift) = self
            .bounded(self.store.get_shift(candidate.worker_id, candidate.date))
            .await?
        else {
            return Ok(None);
        };
        if !is_eligible(&shift, now, self.settings.threshold) {
            return Ok(None);
        }
        let Some(entrada) = shift.entrada else {
            return Ok(None);
        };

        let closed = state_machine::force_close(
            &shift,
            entrada + self.settings.threshold,
            &self.settings.reason,
        )?;
        let hours = accounting::compute(&closed, now, self.settings.legal_daily_hours);
        let salida = closed.salida.unwrap_or(entrada + self.settings.threshold);

        let saved = self
            .bounded(self.store.force_close(
                shift.id,
                salida,
                hours.worked_hours,
                &closed.observations,
            ))
            .await?;

        info!(
            worker_id = saved.worker_id,
            shift_id = saved.id,
            salida = %clock::to_storage(&salida),
            worked_hours = saved.worked_hours,
            "shift auto-closed"
        );

        Ok(Some(AutoCloseDetail {
            worker_id: saved.worker_id,
            shift_id: saved.id,
            shift_date: saved.date,
            forced_close_time: salida,
            worked_hours: saved.worked_hours,
        }))
    }

    async fn notify(&self, detail: &AutoCloseDetail) {
        let contact = match self
            .bounded(self.directory.worker_contact(detail.worker_id))
            .await
        {
            Ok(c) => c,
            Err(e) => {
                warn!(worker_id = detail.worker_id, error = %e, "worker lookup failed, notice skipped");
                return;
            }
        };
        let Some(contact) = contact else {
            warn!(worker_id = detail.worker_id, "worker has no contact data, notice skipped");
            return;
        };

        self.notifier
            .notify_auto_closed(AutoCloseNotice {
                worker_id: detail.worker_id,
                worker_name: contact.name,
                worker_email: contact.email,
                shift_date: detail.shift_date,
                forced_close_time: detail.forced_close_time,
            })
            .await;
    }
}

#[async_trait]
impl RecurringTask for AutoCloser {
    async fn run(&self) {
        self.run_once().await;
    }
}
