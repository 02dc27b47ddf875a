#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use jornada::config::Config;
use jornada::core::clock::{self, FixedClock, LocalTime};
use jornada::core::logic::Engine;
use jornada::db::SqliteStore;
use jornada::models::coordinate::Coordinate;
use jornada::models::punch::{PunchEvent, PunchKind};
use jornada::models::shift::Shift;
use jornada::models::worker::{RegionalSite, WorkSite, Worker};

/// Bogotá office used by most scenarios.
pub const OFFICE: Coordinate = Coordinate {
    lat: 4.6097,
    lon: -74.0817,
};

pub fn jr() -> Command {
    cargo_bin_cmd!("jornada")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_jornada.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Colombian wall time, `YYYY-MM-DD HH:MM`.
pub fn at(s: &str) -> LocalTime {
    clock::parse_local(s).expect("valid test timestamp")
}

/// `meters` north of `from`.
pub fn north_of(from: Coordinate, meters: f64) -> Coordinate {
    Coordinate {
        lat: from.lat + meters / 111_195.0,
        lon: from.lon,
    }
}

/// Punch taken at the office on the device at `ts`, measured on its own time.
pub fn event(kind: PunchKind, ts: &str) -> PunchEvent {
    PunchEvent::new(kind, OFFICE).replayed_at(at(ts))
}

/// Live punch at the office with the server clock moved to `ts`.
pub async fn punch_live(h: &Harness, worker_id: i64, kind: PunchKind, ts: &str) -> Shift {
    h.clock.set(at(ts));
    h.engine
        .tracker
        .punch(worker_id, PunchEvent::new(kind, OFFICE))
        .await
        .expect("live punch")
}

pub struct Harness {
    pub engine: Engine,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}

/// In-memory engine with regional 1 at `OFFICE` and worker 7 assigned to it.
pub async fn harness(now: &str) -> Harness {
    let store = SqliteStore::open_in_memory(Default::default()).expect("in-memory store");
    store
        .add_regional(RegionalSite {
            id: 1,
            name: "Regional Centro".into(),
            point: Some(OFFICE),
        })
        .await
        .expect("regional");
    store
        .add_worker(Worker {
            id: 7,
            name: "Ana Pérez".into(),
            email: "ana@example.com".into(),
            regional_id: Some(1),
            is_visitor: false,
        })
        .await
        .expect("worker");

    let clock = Arc::new(FixedClock::new(at(now)));
    let cfg = Config::default();
    let engine = Engine::with_store(store, &cfg, clock.clone());
    Harness { engine, clock }
}

pub async fn add_worker(h: &Harness, id: i64, visitor: bool) {
    h.engine
        .store
        .add_worker(Worker {
            id,
            name: format!("Worker {id}"),
            email: format!("w{id}@example.com"),
            regional_id: Some(1),
            is_visitor: visitor,
        })
        .await
        .expect("worker");
}

pub async fn assign_site(h: &Harness, worker_id: i64, point: Coordinate, tolerance_m: f64) {
    h.engine
        .store
        .set_work_site(WorkSite {
            worker_id,
            name: "Obra Norte".into(),
            point,
            tolerance_m,
        })
        .await
        .expect("site");
}

/// Full legal day: 08:00 → 17:00 with a one hour lunch.
pub async fn full_day(h: &Harness, worker_id: i64, date: &str) {
    for (kind, time) in [
        (PunchKind::Entrada, "08:00"),
        (PunchKind::AlmuerzoInicio, "12:00"),
        (PunchKind::AlmuerzoFin, "13:00"),
        (PunchKind::Salida, "17:00"),
    ] {
        h.engine
            .tracker
            .punch(worker_id, event(kind, &format!("{date} {time}")))
            .await
            .expect("punch");
    }
}
