use crate::core::clock::{self, LocalTime};
use crate::db::log::ttlog;
use crate::errors::{AppError, AppResult, PunchError};
use crate::models::coordinate::Coordinate;
use crate::models::punch::PunchKind;
use crate::models::shift::Shift;
use crate::models::worker::{RegionalSite, WorkSite, Worker, WorkerContact};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

const SHIFT_COLUMNS: &str = "id, worker_id, date, entrada, descanso_manana_inicio, descanso_manana_fin, \
     almuerzo_inicio, almuerzo_fin, descanso_tarde_inicio, descanso_tarde_fin, salida, \
     worked_hours, auto_closed, observations";

fn conversion_error(err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
}

fn ts_column(row: &Row, name: &str) -> Result<Option<LocalTime>> {
    let raw: Option<String> = row.get(name)?;
    raw.map(|s| clock::from_storage(&s).map_err(conversion_error))
        .transpose()
}

pub fn map_shift(row: &Row) -> Result<Shift> {
    let date_str: String = row.get("date")?;
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|_| conversion_error(AppError::InvalidDate(date_str.clone())))?;

    Ok(Shift {
        id: row.get("id")?,
        worker_id: row.get("worker_id")?,
        date,
        entrada: ts_column(row, "entrada")?,
        descanso_manana_inicio: ts_column(row, "descanso_manana_inicio")?,
        descanso_manana_fin: ts_column(row, "descanso_manana_fin")?,
        almuerzo_inicio: ts_column(row, "almuerzo_inicio")?,
        almuerzo_fin: ts_column(row, "almuerzo_fin")?,
        descanso_tarde_inicio: ts_column(row, "descanso_tarde_inicio")?,
        descanso_tarde_fin: ts_column(row, "descanso_tarde_fin")?,
        salida: ts_column(row, "salida")?,
        worked_hours: row.get("worked_hours")?,
        auto_closed: row.get::<_, i32>("auto_closed")? == 1,
        observations: row.get("observations")?,
    })
}

fn date_key(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn load_shift(conn: &Connection, worker_id: i64, date: &NaiveDate) -> AppResult<Option<Shift>> {
    let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE worker_id = ?1 AND date = ?2");
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt
        .query_row(params![worker_id, date_key(date)], map_shift)
        .optional()?)
}

pub fn load_shift_by_id(conn: &Connection, id: i64) -> AppResult<Shift> {
    let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?1");
    let mut stmt = conn.prepare_cached(&sql)?;
    Ok(stmt.query_row([id], map_shift)?)
}

/// GPS accuracy reported with the punch, for the audit line.
fn accuracy_note(accuracy_m: Option<f64>) -> String {
    accuracy_m
        .map(|a| format!(" (GPS ±{a:.0} m)"))
        .unwrap_or_default()
}

/// Inserts the shift and its audit row in one transaction.
pub fn insert_shift(
    conn: &mut Connection,
    shift: &Shift,
    accuracy_m: Option<f64>,
) -> AppResult<Shift> {
    let entrada = shift.entrada.as_ref().map(clock::to_storage);
    let tx = conn.transaction()?;
    let inserted = tx.execute(
        "INSERT INTO shifts (worker_id, date, entrada, worked_hours, auto_closed, observations)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![
            shift.worker_id,
            date_key(&shift.date),
            entrada,
            shift.worked_hours,
            shift.observations,
        ],
    );

    match inserted {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(PunchError::DuplicateShift {
                worker_id: shift.worker_id,
                date: date_key(&shift.date),
            }
            .into());
        }
        Err(e) => return Err(e.into()),
    }

    let id = tx.last_insert_rowid();
    ttlog(
        &tx,
        "entrada",
        &format!("worker {}", shift.worker_id),
        &format!(
            "Shift {} opened for {}{}",
            id,
            date_key(&shift.date),
            accuracy_note(accuracy_m)
        ),
    )?;
    let saved = load_shift_by_id(&tx, id)?;
    tx.commit()?;
    Ok(saved)
}

/// Writes one punch field. The `IS NULL` guards make the write a no-op when
/// another writer got there first, reported as an illegal transition.
pub fn update_punch(
    conn: &mut Connection,
    shift_id: i64,
    kind: PunchKind,
    at: &LocalTime,
    worked_hours: f64,
    observations: &str,
    accuracy_m: Option<f64>,
) -> AppResult<Shift> {
    let column = kind.as_str();
    let sql = format!(
        "UPDATE shifts SET {column} = ?1, worked_hours = ?2, observations = ?3
         WHERE id = ?4 AND {column} IS NULL AND salida IS NULL"
    );
    let tx = conn.transaction()?;
    let changed = tx.execute(
        &sql,
        params![clock::to_storage(at), worked_hours, observations, shift_id],
    )?;

    if changed == 0 {
        return Err(PunchError::IllegalTransition {
            punch: kind,
            reason: "la jornada cambió mientras se registraba la marcación".into(),
        }
        .into());
    }

    ttlog(
        &tx,
        kind.as_str(),
        &format!("shift {shift_id}"),
        &format!("{} recorded at {}{}", kind, clock::to_storage(at), accuracy_note(accuracy_m)),
    )?;
    let saved = load_shift_by_id(&tx, shift_id)?;
    tx.commit()?;
    Ok(saved)
}

pub fn close_forced(
    conn: &mut Connection,
    shift_id: i64,
    salida: &LocalTime,
    worked_hours: f64,
    observations: &str,
) -> AppResult<Shift> {
    let tx = conn.transaction()?;
    let changed = tx.execute(
        "UPDATE shifts SET salida = ?1, auto_closed = 1, worked_hours = ?2, observations = ?3
         WHERE id = ?4 AND salida IS NULL AND auto_closed = 0",
        params![clock::to_storage(salida), worked_hours, observations, shift_id],
    )?;

    if changed == 0 {
        return Err(PunchError::IllegalTransition {
            punch: PunchKind::Salida,
            reason: "la jornada ya fue cerrada".into(),
        }
        .into());
    }

    ttlog(
        &tx,
        "auto_close",
        &format!("shift {shift_id}"),
        &format!("Forced salida at {}", clock::to_storage(salida)),
    )?;
    let saved = load_shift_by_id(&tx, shift_id)?;
    tx.commit()?;
    Ok(saved)
}

pub fn load_shifts_in_range(
    conn: &Connection,
    worker_id: i64,
    from: &NaiveDate,
    to: &NaiveDate,
) -> AppResult<Vec<Shift>> {
    let sql = format!(
        "SELECT {SHIFT_COLUMNS} FROM shifts
         WHERE worker_id = ?1 AND date >= ?2 AND date <= ?3
         ORDER BY date ASC"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![worker_id, date_key(from), date_key(to)], map_shift)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Open, not auto-closed shifts whose entrada is at or before `cutoff`.
pub fn load_open_shifts_before(conn: &Connection, cutoff: &LocalTime) -> AppResult<Vec<Shift>> {
    // every timestamp is stored with the same -05:00 offset, so text order is time order
    let sql = format!(
        "SELECT {SHIFT_COLUMNS} FROM shifts
         WHERE entrada IS NOT NULL AND entrada <= ?1 AND salida IS NULL AND auto_closed = 0
         ORDER BY date ASC, id ASC"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([clock::to_storage(cutoff)], map_shift)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

// ---------------------------
// Directory
// ---------------------------

pub fn insert_regional(conn: &mut Connection, regional: &RegionalSite) -> AppResult<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO regionals (id, name, lat, lon) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, lat = excluded.lat, lon = excluded.lon",
        params![
            regional.id,
            regional.name,
            regional.point.map(|p| p.lat),
            regional.point.map(|p| p.lon),
        ],
    )?;
    ttlog(&tx, "regional", &format!("regional {}", regional.id), &regional.name)?;
    tx.commit()?;
    Ok(())
}

pub fn insert_worker(conn: &mut Connection, worker: &Worker) -> AppResult<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO workers (id, name, email, regional_id, is_visitor) VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, email = excluded.email,
             regional_id = excluded.regional_id, is_visitor = excluded.is_visitor",
        params![
            worker.id,
            worker.name,
            worker.email,
            worker.regional_id,
            if worker.is_visitor { 1 } else { 0 },
        ],
    )?;
    ttlog(&tx, "worker", &format!("worker {}", worker.id), &worker.name)?;
    tx.commit()?;
    Ok(())
}

pub fn upsert_work_site(conn: &mut Connection, site: &WorkSite) -> AppResult<()> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO work_sites (worker_id, name, lat, lon, tolerance_m) VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(worker_id) DO UPDATE SET name = excluded.name, lat = excluded.lat,
             lon = excluded.lon, tolerance_m = excluded.tolerance_m",
        params![
            site.worker_id,
            site.name,
            site.point.lat,
            site.point.lon,
            site.tolerance_m,
        ],
    )?;
    ttlog(&tx, "site", &format!("worker {}", site.worker_id), &site.name)?;
    tx.commit()?;
    Ok(())
}

pub fn load_worker(conn: &Connection, worker_id: i64) -> AppResult<Option<Worker>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, name, email, regional_id, is_visitor FROM workers WHERE id = ?1",
    )?;
    Ok(stmt
        .query_row([worker_id], |row| {
            Ok(Worker {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                regional_id: row.get(3)?,
                is_visitor: row.get::<_, i32>(4)? == 1,
            })
        })
        .optional()?)
}

pub fn load_work_site(conn: &Connection, worker_id: i64) -> AppResult<Option<WorkSite>> {
    let mut stmt = conn.prepare_cached(
        "SELECT worker_id, name, lat, lon, tolerance_m FROM work_sites WHERE worker_id = ?1",
    )?;
    Ok(stmt
        .query_row([worker_id], |row| {
            Ok(WorkSite {
                worker_id: row.get(0)?,
                name: row.get(1)?,
                point: Coordinate {
                    lat: row.get(2)?,
                    lon: row.get(3)?,
                },
                tolerance_m: row.get(4)?,
            })
        })
        .optional()?)
}

pub fn load_regional(conn: &Connection, id: i64) -> AppResult<Option<RegionalSite>> {
    let mut stmt = conn.prepare_cached("SELECT id, name, lat, lon FROM regionals WHERE id = ?1")?;
    Ok(stmt
        .query_row([id], |row| {
            let lat: Option<f64> = row.get(2)?;
            let lon: Option<f64> = row.get(3)?;
            Ok(RegionalSite {
                id: row.get(0)?,
                name: row.get(1)?,
                point: lat.zip(lon).map(|(lat, lon)| Coordinate { lat, lon }),
            })
        })
        .optional()?)
}

pub fn load_contact(conn: &Connection, worker_id: i64) -> AppResult<Option<WorkerContact>> {
    Ok(load_worker(conn, worker_id)?.map(|w| WorkerContact {
        id: w.id,
        name: w.name,
        email: w.email,
    }))
}
