mod common;
use common::{jr, setup_test_db};
use predicates::str::contains;

const LAT: &str = "--lat=4.6097";
const LON: &str = "--lon=-74.0817";

/// Init + one regional office + worker 7 assigned to it.
fn init_with_worker(db: &str) {
    jr().args(["--db", db, "--test", "init"]).assert().success();
    jr().args(["--db", db, "regional", "1", "Regional Centro", LAT, LON])
        .assert()
        .success()
        .stdout(contains("Regional 1"));
    jr().args([
        "--db",
        db,
        "worker",
        "7",
        "Ana Pérez",
        "--email",
        "ana@example.com",
        "--regional",
        "1",
    ])
    .assert()
    .success();
}

fn punch(db: &str, kind: &str, when: &str) -> assert_cmd::assert::Assert {
    jr().args(["--db", db, "punch", "7", kind, LAT, LON, "--at", when])
        .assert()
}

#[test]
fn test_init_creates_database() {
    let db = setup_test_db("cli_init");
    jr().args(["--db", &db, "--test", "init"])
        .assert()
        .success()
        .stdout(contains("Database initialized"));
    assert!(std::path::Path::new(&db).exists());
}

#[test]
fn test_full_day_and_report() {
    let db = setup_test_db("cli_full_day");
    init_with_worker(&db);

    punch(&db, "entrada", "2025-03-10 08:00")
        .success()
        .stdout(contains("entrada recorded for worker 7"));
    punch(&db, "almuerzo_inicio", "2025-03-10 12:00").success();
    punch(&db, "almuerzo_fin", "2025-03-10 13:00").success();
    punch(&db, "salida", "2025-03-10 17:00")
        .success()
        .stdout(contains("8.00"));

    jr().args(["--db", &db, "report", "7", "--period", "2025-03", "--json"])
        .assert()
        .success()
        .stdout(contains("\"days_worked\": 1"))
        .stdout(contains("\"worked_hours\": 8.0"));

    jr().args(["--db", &db, "report", "7", "-p", "2025-03-10"])
        .assert()
        .success()
        .stdout(contains("TOTAL"))
        .stdout(contains("Days worked: 1"));
}

#[test]
fn test_long_lunch_is_rejected_with_context() {
    let db = setup_test_db("cli_long_lunch");
    init_with_worker(&db);

    punch(&db, "entrada", "2025-03-10 08:00").success();
    punch(&db, "almuerzo_inicio", "2025-03-10 12:00").success();
    punch(&db, "almuerzo_fin", "2025-03-10 13:01")
        .failure()
        .stderr(contains("BreakDurationExceeded"))
        .stderr(contains("elapsed_minutes: 61"));
}

#[test]
fn test_punch_outside_office_is_rejected() {
    let db = setup_test_db("cli_geofence");
    init_with_worker(&db);

    jr().args([
        "--db",
        &db,
        "punch",
        "7",
        "entrada",
        "--lat=4.7000",
        LON,
        "--at",
        "2025-03-10 08:00",
    ])
    .assert()
    .failure()
    .stderr(contains("GeofenceViolation"))
    .stderr(contains("Regional Centro"));
}

#[test]
fn test_invalid_punch_kind() {
    let db = setup_test_db("cli_bad_kind");
    init_with_worker(&db);

    punch(&db, "merienda", "2025-03-10 08:00")
        .failure()
        .stderr(contains("Invalid punch type"));
}

#[test]
fn test_status_shows_live_hours() {
    let db = setup_test_db("cli_status");
    init_with_worker(&db);
    punch(&db, "entrada", "2025-03-10 08:00").success();

    jr().args(["--db", &db, "--now", "2025-03-10 11:30", "status", "7"])
        .assert()
        .success()
        .stdout(contains("open"))
        .stdout(contains("3.50"));

    jr().args(["--db", &db, "--now", "2025-03-10 11:30", "status", "8"])
        .assert()
        .success()
        .stdout(contains("no shift today"));
}

#[test]
fn test_auto_close_command() {
    let db = setup_test_db("cli_auto_close");
    init_with_worker(&db);
    punch(&db, "entrada", "2025-03-10 08:00").success();

    jr().args(["--db", &db, "--now", "2025-03-10 19:00", "auto-close"])
        .assert()
        .success()
        .stdout(contains("Shifts closed: 1"))
        .stdout(contains("2025-03-10 16:00"));

    jr().args(["--db", &db, "--now", "2025-03-10 20:00", "auto-close"])
        .assert()
        .success()
        .stdout(contains("No shifts to close"));

    jr().args(["--db", &db, "log", "--print"])
        .assert()
        .success()
        .stdout(contains("auto_close"))
        .stdout(contains("notify"));
}

#[test]
fn test_site_requires_known_worker() {
    let db = setup_test_db("cli_site");
    init_with_worker(&db);

    jr().args(["--db", &db, "site", "7", "Obra Norte", LAT, LON, "--tolerance", "200"])
        .assert()
        .success()
        .stdout(contains("200 m"));

    jr().args(["--db", &db, "site", "42", "Obra Sur", LAT, LON])
        .assert()
        .failure()
        .stderr(contains("Unknown worker: 42"));
}
