mod common;
use common::{OFFICE, add_worker, assign_site, at, event, full_day, harness, north_of, punch_live};

use chrono::NaiveDate;
use jornada::errors::{ErrorKind, PunchError};
use jornada::models::punch::{BreakKind, PunchEvent, PunchKind};
use jornada::models::shift::ShiftState;

#[tokio::test]
async fn test_full_day_is_stored_with_hours() {
    let h = harness("2025-03-10 18:00").await;
    full_day(&h, 7, "2025-03-10").await;

    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let status = h.engine.tracker.current_shift(7).await.unwrap().unwrap();
    assert_eq!(status.shift.date, date);
    assert_eq!(status.state, ShiftState::Closed);
    assert_eq!(status.shift.worked_hours, 8.0);
    assert_eq!(status.hours.worked_hours, 8.0);
}

#[tokio::test]
async fn test_entrada_outside_geofence_is_rejected() {
    let h = harness("2025-03-10 08:00").await;
    let far = PunchEvent::new(PunchKind::Entrada, north_of(OFFICE, 300.0));

    let err = h.engine.tracker.punch(7, far).await.unwrap_err();
    let PunchError::GeofenceViolation {
        distance_m,
        tolerance_m,
        reference,
    } = err.clone()
    else {
        panic!("unexpected {err:?}");
    };
    assert!((distance_m - 300.0).abs() < 1.0, "{distance_m}");
    assert_eq!(tolerance_m, 50.0);
    assert_eq!(reference, "Regional Centro");

    let rejection = err.to_rejection();
    assert_eq!(rejection.error_kind, ErrorKind::GeofenceViolation);
    assert_eq!(rejection.context["tolerance_m"], 50.0);

    // nothing was written
    assert!(h.engine.tracker.current_shift(7).await.unwrap().is_none());
}

#[tokio::test]
async fn test_break_outside_geofence_needs_override() {
    let h = harness("2025-03-10 12:00").await;
    h.engine
        .tracker
        .punch(7, event(PunchKind::Entrada, "2025-03-10 08:00"))
        .await
        .unwrap();

    let outside = PunchEvent::new(PunchKind::AlmuerzoInicio, north_of(OFFICE, 400.0))
        .at(at("2025-03-10 12:00"));
    let err = h.engine.tracker.punch(7, outside.clone()).await.unwrap_err();
    assert!(matches!(err, PunchError::GeofenceViolation { .. }));

    let shift = h
        .engine
        .tracker
        .punch(7, outside.with_override())
        .await
        .unwrap();
    assert!(shift.almuerzo_inicio.is_some());
    assert!(shift.observations.contains("almuerzo_inicio"));
    assert_eq!(shift.state(), ShiftState::OnBreak(BreakKind::Almuerzo));
}

#[tokio::test]
async fn test_salida_cannot_be_overridden() {
    let h = harness("2025-03-10 17:00").await;
    for (kind, ts) in [
        (PunchKind::Entrada, "2025-03-10 08:00"),
        (PunchKind::AlmuerzoInicio, "2025-03-10 12:00"),
        (PunchKind::AlmuerzoFin, "2025-03-10 13:00"),
    ] {
        h.engine.tracker.punch(7, event(kind, ts)).await.unwrap();
    }

    let outside = PunchEvent::new(PunchKind::Salida, north_of(OFFICE, 400.0))
        .at(at("2025-03-10 17:00"))
        .with_override();
    let err = h.engine.tracker.punch(7, outside).await.unwrap_err();
    assert!(matches!(err, PunchError::GeofenceViolation { .. }));
}

#[tokio::test]
async fn test_work_site_and_visitor_tolerances() {
    let h = harness("2025-03-10 08:00").await;

    add_worker(&h, 8, false).await;
    let obra = north_of(OFFICE, 5_000.0);
    assign_site(&h, 8, obra, 200.0).await;
    h.engine
        .tracker
        .punch(8, PunchEvent::new(PunchKind::Entrada, north_of(obra, 150.0)))
        .await
        .expect("inside the site radius");

    add_worker(&h, 9, true).await;
    h.engine
        .tracker
        .punch(9, PunchEvent::new(PunchKind::Entrada, north_of(OFFICE, 800.0)))
        .await
        .expect("visitors get at least 1000 m");
}

#[tokio::test]
async fn test_unknown_worker_fails_geofence() {
    let h = harness("2025-03-10 08:00").await;
    let err = h
        .engine
        .tracker
        .punch(99, PunchEvent::new(PunchKind::Entrada, OFFICE))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GeofenceViolation);
}

#[tokio::test]
async fn test_invalid_coordinate_rejected() {
    let h = harness("2025-03-10 08:00").await;
    let bad = jornada::models::coordinate::Coordinate {
        lat: 91.0,
        lon: 0.0,
    };
    let err = h
        .engine
        .tracker
        .punch(7, PunchEvent::new(PunchKind::Entrada, bad))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_duplicate_entrada_through_store() {
    let h = harness("2025-03-10 08:10").await;
    h.engine
        .tracker
        .punch(7, event(PunchKind::Entrada, "2025-03-10 08:00"))
        .await
        .unwrap();
    let err = h
        .engine
        .tracker
        .punch(7, event(PunchKind::Entrada, "2025-03-10 08:05"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateShift);
}

#[tokio::test]
async fn test_concurrent_entradas_create_one_shift() {
    let h = harness("2025-03-10 08:00").await;
    let a = h.engine.tracker.clone();
    let b = h.engine.tracker.clone();

    let (ra, rb) = tokio::join!(
        a.punch(7, event(PunchKind::Entrada, "2025-03-10 08:00")),
        b.punch(7, event(PunchKind::Entrada, "2025-03-10 08:00")),
    );
    let ok = [ra.is_ok(), rb.is_ok()].iter().filter(|x| **x).count();
    assert_eq!(ok, 1);
    let err = ra.err().or(rb.err()).unwrap();
    assert!(matches!(err, PunchError::DuplicateShift { .. }));
}

#[tokio::test]
async fn test_night_shift_punches_land_on_entrada_day() {
    let h = harness("2025-03-11 06:30").await;
    for (kind, ts) in [
        (PunchKind::Entrada, "2025-03-10 22:00"),
        (PunchKind::AlmuerzoInicio, "2025-03-11 01:00"),
        (PunchKind::AlmuerzoFin, "2025-03-11 01:30"),
        (PunchKind::Salida, "2025-03-11 06:00"),
    ] {
        h.engine.tracker.punch(7, event(kind, ts)).await.unwrap();
    }

    let from = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let to = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
    let summary = h.engine.tracker.summary(7, from, to, None).await.unwrap();

    assert_eq!(summary.days_worked, 1);
    let row = &summary.rows[0];
    assert_eq!(row.date, from);
    assert_eq!(row.hours.worked_hours, 7.5);
    assert_eq!(row.hours.night_hours, 7.5);
    assert_eq!(row.hours.day_hours, 0.0);
}

#[tokio::test]
async fn test_open_shift_status_is_live() {
    let h = harness("2025-03-10 10:00").await;
    h.engine
        .tracker
        .punch(7, event(PunchKind::Entrada, "2025-03-10 08:00"))
        .await
        .unwrap();

    let status = h.engine.tracker.current_shift(7).await.unwrap().unwrap();
    assert_eq!(status.state, ShiftState::Open);
    assert_eq!(status.hours.worked_hours, 2.0);

    h.advance(chrono::Duration::hours(3));
    let later = h.engine.tracker.current_shift(7).await.unwrap().unwrap();
    assert_eq!(later.hours.worked_hours, 5.0);
}

#[tokio::test]
async fn test_summary_with_custom_legal_hours() {
    let h = harness("2025-03-31 20:00").await;
    full_day(&h, 7, "2025-03-10").await;
    full_day(&h, 7, "2025-03-11").await;

    let from = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
    let summary = h.engine.tracker.summary(7, from, to, Some(7.0)).await.unwrap();

    assert_eq!(summary.days_worked, 2);
    assert_eq!(summary.totals.worked_hours, 16.0);
    assert_eq!(summary.totals.overtime_hours, 2.0);
    assert_eq!(summary.average_hours_per_day, 8.0);
}

#[tokio::test]
async fn test_audit_log_records_punches() {
    let h = harness("2025-03-10 18:00").await;
    full_day(&h, 7, "2025-03-10").await;

    let log = h.engine.store.audit_log().await.unwrap();
    assert!(log.iter().any(|e| e.operation == "entrada"));
    assert!(log.iter().any(|e| e.operation == "salida"));
}

#[tokio::test]
async fn test_timestamp_ahead_of_server_is_rejected() {
    let h = harness("2025-03-10 08:00").await;
    punch_live(&h, 7, PunchKind::Entrada, "2025-03-10 08:00").await;

    for ahead in [
        PunchEvent::new(PunchKind::AlmuerzoInicio, OFFICE).at(at("2025-03-10 12:00")),
        event(PunchKind::AlmuerzoInicio, "2025-03-10 12:00"),
    ] {
        let err = h.engine.tracker.punch(7, ahead).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalTransition);
        assert!(err.to_string().contains("hora del servidor"), "{err}");
    }

    let status = h.engine.tracker.current_shift(7).await.unwrap().unwrap();
    assert_eq!(status.state, ShiftState::Open);
    assert!(status.shift.almuerzo_inicio.is_none());

    // a device a minute fast is tolerated
    let shift = h
        .engine
        .tracker
        .punch(7, event(PunchKind::DescansoMananaInicio, "2025-03-10 08:01"))
        .await
        .unwrap();
    assert_eq!(shift.descanso_manana_inicio, Some(at("2025-03-10 08:01")));
}

#[tokio::test]
async fn test_backdated_live_lunch_end_is_measured_on_server_time() {
    let h = harness("2025-03-10 08:00").await;
    punch_live(&h, 7, PunchKind::Entrada, "2025-03-10 08:00").await;
    punch_live(&h, 7, PunchKind::AlmuerzoInicio, "2025-03-10 12:00").await;

    h.clock.set(at("2025-03-10 14:30"));
    let backdated = PunchEvent::new(PunchKind::AlmuerzoFin, OFFICE).at(at("2025-03-10 12:59"));
    let err = h.engine.tracker.punch(7, backdated).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BreakDurationExceeded);
    // 12:00 to 14:28, the earliest the server accepts
    assert_eq!(err.to_rejection().context["elapsed_minutes"], 148);

    let status = h.engine.tracker.current_shift(7).await.unwrap().unwrap();
    assert_eq!(status.state, ShiftState::OnBreak(BreakKind::Almuerzo));
}

#[tokio::test]
async fn test_replayed_lunch_end_keeps_device_time() {
    let h = harness("2025-03-10 08:00").await;
    punch_live(&h, 7, PunchKind::Entrada, "2025-03-10 08:00").await;
    punch_live(&h, 7, PunchKind::AlmuerzoInicio, "2025-03-10 12:00").await;

    h.clock.set(at("2025-03-10 14:30"));
    let shift = h
        .engine
        .tracker
        .punch(7, event(PunchKind::AlmuerzoFin, "2025-03-10 12:59"))
        .await
        .unwrap();
    assert_eq!(shift.almuerzo_fin, Some(at("2025-03-10 12:59")));
}

#[tokio::test]
async fn test_gps_accuracy_goes_to_audit_log() {
    let h = harness("2025-03-10 08:00").await;
    let mut entrada = PunchEvent::new(PunchKind::Entrada, OFFICE);
    entrada.accuracy_m = Some(12.4);
    h.engine.tracker.punch(7, entrada).await.unwrap();

    h.clock.set(at("2025-03-10 09:00"));
    let mut pausa = PunchEvent::new(PunchKind::DescansoMananaInicio, OFFICE);
    pausa.accuracy_m = Some(30.0);
    h.engine.tracker.punch(7, pausa).await.unwrap();

    let log = h.engine.store.audit_log().await.unwrap();
    let entrada_row = log.iter().find(|e| e.operation == "entrada").unwrap();
    assert!(entrada_row.message.contains("GPS ±12 m"), "{}", entrada_row.message);
    let pausa_row = log
        .iter()
        .find(|e| e.operation == "descanso_manana_inicio")
        .unwrap();
    assert!(pausa_row.message.contains("GPS ±30 m"), "{}", pausa_row.message);
}

#[tokio::test]
async fn test_failed_audit_write_rolls_back_the_punch() {
    use jornada::config::Config;
    use jornada::core::clock::FixedClock;
    use jornada::core::logic::Engine;
    use jornada::db::SqliteStore;
    use jornada::db::store::ShiftStore;
    use jornada::models::worker::{RegionalSite, Worker};
    use std::sync::Arc;

    let db = common::setup_test_db("tracker_audit_rollback");
    let store = SqliteStore::open(&db, Default::default()).unwrap();
    store
        .add_regional(RegionalSite {
            id: 1,
            name: "Regional Centro".into(),
            point: Some(OFFICE),
        })
        .await
        .unwrap();
    store
        .add_worker(Worker {
            id: 7,
            name: "Ana Pérez".into(),
            email: "ana@example.com".into(),
            regional_id: Some(1),
            is_visitor: false,
        })
        .await
        .unwrap();
    let clock = Arc::new(FixedClock::new(at("2025-03-10 08:00")));
    let engine = Engine::with_store(store, &Config::default(), clock.clone());
    engine
        .tracker
        .punch(7, PunchEvent::new(PunchKind::Entrada, OFFICE))
        .await
        .unwrap();

    // make the audit insert for the lunch fail from a second connection
    let side = rusqlite::Connection::open(&db).unwrap();
    side.execute_batch(
        "CREATE TRIGGER refuse_lunch_log BEFORE INSERT ON log
         WHEN NEW.operation = 'almuerzo_inicio'
         BEGIN SELECT RAISE(ABORT, 'log refused'); END;",
    )
    .unwrap();

    clock.set(at("2025-03-10 12:00"));
    let err = engine
        .tracker
        .punch(7, PunchEvent::new(PunchKind::AlmuerzoInicio, OFFICE))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransientPersistenceFailure);

    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let shift = engine.store.get_shift(7, date).await.unwrap().unwrap();
    assert!(shift.almuerzo_inicio.is_none());

    drop(side);
    std::fs::remove_file(&db).ok();
}
