use rusqlite::{Connection, OptionalExtension, Result};
use tracing::info;

/// Ensure that the `log` table exists. Applied migrations are recorded in it.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20250301_0001_directory",
        description: "Created regionals, workers and work_sites tables",
        sql: r#"
        CREATE TABLE IF NOT EXISTS regionals (
            id    INTEGER PRIMARY KEY,
            name  TEXT NOT NULL,
            lat   REAL,
            lon   REAL
        );

        CREATE TABLE IF NOT EXISTS workers (
            id           INTEGER PRIMARY KEY,
            name         TEXT NOT NULL,
            email        TEXT NOT NULL DEFAULT '',
            regional_id  INTEGER REFERENCES regionals(id),
            is_visitor   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS work_sites (
            worker_id    INTEGER PRIMARY KEY REFERENCES workers(id),
            name         TEXT NOT NULL,
            lat          REAL NOT NULL,
            lon          REAL NOT NULL,
            tolerance_m  REAL NOT NULL DEFAULT 50
        );
        "#,
    },
    Migration {
        version: "20250301_0002_shifts",
        description: "Created shifts table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS shifts (
            id                      INTEGER PRIMARY KEY AUTOINCREMENT,
            worker_id               INTEGER NOT NULL,
            date                    TEXT NOT NULL,
            entrada                 TEXT,
            descanso_manana_inicio  TEXT,
            descanso_manana_fin     TEXT,
            almuerzo_inicio         TEXT,
            almuerzo_fin            TEXT,
            descanso_tarde_inicio   TEXT,
            descanso_tarde_fin      TEXT,
            salida                  TEXT,
            worked_hours            REAL NOT NULL DEFAULT 0,
            auto_closed             INTEGER NOT NULL DEFAULT 0,
            observations            TEXT NOT NULL DEFAULT '',
            UNIQUE(worker_id, date)
        );

        CREATE INDEX IF NOT EXISTS idx_shifts_worker_date ON shifts(worker_id, date);
        CREATE INDEX IF NOT EXISTS idx_shifts_open ON shifts(salida, auto_closed);
        "#,
    },
];

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

/// Public entry point: run all pending migrations.
///
/// Invoked by db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    ensure_log_table(conn)?;

    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            continue;
        }

        conn.execute_batch(m.sql)?;

        conn.execute(
            "INSERT INTO log (date, operation, target, message)
             VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
            [m.version, m.description],
        )?;

        info!(version = m.version, "migration applied: {}", m.description);
    }

    Ok(())
}
