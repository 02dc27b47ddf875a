//! Contracts the engine needs from storage.
//!
//! Every operation is atomic at single-shift granularity. Implementations
//! report a lost race on a shift as `PunchError::IllegalTransition` and a
//! duplicate worker-day as `PunchError::DuplicateShift` (wrapped in
//! `AppError::Punch`); anything else is treated as transient by the engine.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::core::clock::LocalTime;
use crate::errors::AppResult;
use crate::models::punch::PunchKind;
use crate::models::shift::Shift;
use crate::models::worker::WorkerContact;

#[async_trait]
pub trait ShiftStore: Send + Sync {
    /// The worker's shift for `date`, open or closed.
    async fn get_shift(&self, worker_id: i64, date: NaiveDate) -> AppResult<Option<Shift>>;

    /// The worker's shift for `date` if it has no salida yet.
    async fn get_open_shift(&self, worker_id: i64, date: NaiveDate) -> AppResult<Option<Shift>> {
        Ok(self
            .get_shift(worker_id, date)
            .await?
            .filter(|s| s.entrada.is_some() && !s.is_closed()))
    }

    /// Inserts a freshly opened shift and returns it with its id.
    /// `accuracy_m` is the GPS accuracy of the entrada, kept in the audit trail.
    async fn create_shift(&self, shift: &Shift, accuracy_m: Option<f64>) -> AppResult<Shift>;

    async fn append_punch(
        &self,
        shift_id: i64,
        kind: PunchKind,
        at: LocalTime,
        worked_hours: f64,
        observations: &str,
        accuracy_m: Option<f64>,
    ) -> AppResult<Shift>;

    async fn force_close(
        &self,
        shift_id: i64,
        salida: LocalTime,
        worked_hours: f64,
        observations: &str,
    ) -> AppResult<Shift>;

    async fn list_shifts(&self, worker_id: i64, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<Shift>>;

    /// Open, not auto-closed shifts whose entrada is at or before `cutoff`.
    async fn list_open_shifts_older_than(&self, cutoff: LocalTime) -> AppResult<Vec<Shift>>;
}

#[async_trait]
pub trait WorkerDirectory: Send + Sync {
    async fn worker_contact(&self, worker_id: i64) -> AppResult<Option<WorkerContact>>;
}
