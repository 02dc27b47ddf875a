//! SQLite implementation of the storage, location and directory
//! collaborators.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::core::clock::LocalTime;
use crate::core::geofence::{GeofencePolicy, LocationResolver, ReferencePoint, resolve_reference};
use crate::db::initialize::init_db;
use crate::db::log::{LogEntry, load_log};
use crate::db::pool::DbPool;
use crate::db::queries;
use crate::db::store::{ShiftStore, WorkerDirectory};
use crate::errors::{AppError, AppResult};
use crate::models::punch::PunchKind;
use crate::models::shift::Shift;
use crate::models::worker::{RegionalSite, WorkSite, Worker, WorkerContact};

#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
    policy: GeofencePolicy,
}

impl SqliteStore {
    /// Opens (and migrates) the database at `path`.
    pub fn open(path: &str, policy: GeofencePolicy) -> AppResult<Self> {
        Self::with_pool(DbPool::new(path)?, policy)
    }

    pub fn open_in_memory(policy: GeofencePolicy) -> AppResult<Self> {
        Self::with_pool(DbPool::in_memory()?, policy)
    }

    fn with_pool(pool: DbPool, policy: GeofencePolicy) -> AppResult<Self> {
        pool.with_conn(|conn| init_db(conn))?;
        Ok(Self { pool, policy })
    }

    /// Runs `f` on the blocking pool with the connection locked.
    async fn run<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut rusqlite::Connection) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || pool.with_conn(f))
            .await
            .map_err(|e| AppError::Other(format!("storage task failed: {e}")))?
    }

    pub async fn add_regional(&self, regional: RegionalSite) -> AppResult<()> {
        self.run(move |conn| queries::insert_regional(conn, &regional))
            .await
    }

    pub async fn add_worker(&self, worker: Worker) -> AppResult<()> {
        self.run(move |conn| queries::insert_worker(conn, &worker))
            .await
    }

    pub async fn set_work_site(&self, site: WorkSite) -> AppResult<()> {
        self.run(move |conn| {
            if queries::load_worker(conn, site.worker_id)?.is_none() {
                return Err(AppError::UnknownWorker(site.worker_id));
            }
            queries::upsert_work_site(conn, &site)
        })
        .await
    }

    pub async fn worker(&self, worker_id: i64) -> AppResult<Option<Worker>> {
        self.run(move |conn| queries::load_worker(conn, worker_id))
            .await
    }

    pub async fn audit_log(&self) -> AppResult<Vec<LogEntry>> {
        self.run(|conn| load_log(conn)).await
    }

    pub async fn log_event(&self, operation: &str, target: &str, message: &str) -> AppResult<()> {
        let (op, tg, msg) = (operation.to_string(), target.to_string(), message.to_string());
        self.run(move |conn| crate::db::log::ttlog(conn, &op, &tg, &msg))
            .await
    }
}

#[async_trait]
impl ShiftStore for SqliteStore {
    async fn get_shift(&self, worker_id: i64, date: NaiveDate) -> AppResult<Option<Shift>> {
        self.run(move |conn| queries::load_shift(conn, worker_id, &date))
            .await
    }

    async fn create_shift(&self, shift: &Shift, accuracy_m: Option<f64>) -> AppResult<Shift> {
        let shift = shift.clone();
        self.run(move |conn| queries::insert_shift(conn, &shift, accuracy_m))
            .await
    }

    async fn append_punch(
        &self,
        shift_id: i64,
        kind: PunchKind,
        at: LocalTime,
        worked_hours: f64,
        observations: &str,
        accuracy_m: Option<f64>,
    ) -> AppResult<Shift> {
        let observations = observations.to_string();
        self.run(move |conn| {
            queries::update_punch(
                conn,
                shift_id,
                kind,
                &at,
                worked_hours,
                &observations,
                accuracy_m,
            )
        })
        .await
    }

    async fn force_close(
        &self,
        shift_id: i64,
        salida: LocalTime,
        worked_hours: f64,
        observations: &str,
    ) -> AppResult<Shift> {
        let observations = observations.to_string();
        self.run(move |conn| {
            queries::close_forced(conn, shift_id, &salida, worked_hours, &observations)
        })
        .await
    }

    async fn list_shifts(&self, worker_id: i64, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<Shift>> {
        self.run(move |conn| queries::load_shifts_in_range(conn, worker_id, &from, &to))
            .await
    }

    async fn list_open_shifts_older_than(&self, cutoff: LocalTime) -> AppResult<Vec<Shift>> {
        self.run(move |conn| queries::load_open_shifts_before(conn, &cutoff))
            .await
    }
}

#[async_trait]
impl LocationResolver for SqliteStore {
    async fn resolve_reference_point(&self, worker_id: i64) -> AppResult<Option<ReferencePoint>> {
        let policy = self.policy;
        self.run(move |conn| {
            let worker =
                queries::load_worker(conn, worker_id)?.ok_or(AppError::UnknownWorker(worker_id))?;
            let site = queries::load_work_site(conn, worker_id)?;
            let regional = match worker.regional_id {
                Some(id) => queries::load_regional(conn, id)?,
                None => None,
            };
            Ok(resolve_reference(
                site.as_ref(),
                regional.as_ref(),
                worker.is_visitor,
                &policy,
            ))
        })
        .await
    }
}

#[async_trait]
impl WorkerDirectory for SqliteStore {
    async fn worker_contact(&self, worker_id: i64) -> AppResult<Option<WorkerContact>> {
        self.run(move |conn| queries::load_contact(conn, worker_id))
            .await
    }
}
