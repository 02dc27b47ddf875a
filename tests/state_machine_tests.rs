mod common;
use common::at;

use chrono::{Duration, NaiveDate};
use jornada::core::state_machine::{Rules, apply, apply_observed, force_close};
use jornada::errors::PunchError;
use jornada::models::punch::{BreakKind, PunchKind};
use jornada::models::shift::{Shift, ShiftState};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

/// Applies `(kind, "HH:MM")` punches in order on 2025-03-10.
fn run(punches: &[(PunchKind, &str)]) -> Result<Shift, PunchError> {
    let rules = Rules::default();
    let mut current: Option<Shift> = None;
    for (kind, time) in punches {
        let next = apply(
            current.as_ref(),
            7,
            day(),
            *kind,
            at(&format!("2025-03-10 {time}")),
            &rules,
        )?;
        current = Some(next);
    }
    Ok(current.expect("at least one punch"))
}

#[test]
fn test_full_legal_sequence() {
    let shift = run(&[
        (PunchKind::Entrada, "07:00"),
        (PunchKind::DescansoMananaInicio, "09:30"),
        (PunchKind::DescansoMananaFin, "09:45"),
        (PunchKind::AlmuerzoInicio, "12:00"),
        (PunchKind::AlmuerzoFin, "13:00"),
        (PunchKind::DescansoTardeInicio, "15:00"),
        (PunchKind::DescansoTardeFin, "15:15"),
        (PunchKind::Salida, "17:00"),
    ])
    .expect("legal sequence");

    assert_eq!(shift.state(), ShiftState::Closed);
    assert!(shift.is_closed());
    for kind in PunchKind::ALL {
        assert!(shift.get(kind).is_some(), "{kind} missing");
    }
}

#[test]
fn test_optional_breaks_can_be_skipped() {
    let shift = run(&[
        (PunchKind::Entrada, "08:00"),
        (PunchKind::AlmuerzoInicio, "12:00"),
        (PunchKind::AlmuerzoFin, "13:00"),
        (PunchKind::Salida, "17:00"),
    ])
    .expect("lunch only");
    assert!(shift.descanso_manana_inicio.is_none());
    assert!(shift.descanso_tarde_inicio.is_none());
}

#[test]
fn test_second_entrada_is_duplicate() {
    let err = run(&[(PunchKind::Entrada, "07:00"), (PunchKind::Entrada, "07:05")]).unwrap_err();
    assert_eq!(
        err,
        PunchError::DuplicateShift {
            worker_id: 7,
            date: "2025-03-10".into()
        }
    );
}

#[test]
fn test_entrada_after_closed_shift_is_still_duplicate() {
    let err = run(&[
        (PunchKind::Entrada, "07:00"),
        (PunchKind::AlmuerzoInicio, "12:00"),
        (PunchKind::AlmuerzoFin, "12:30"),
        (PunchKind::Salida, "15:00"),
        (PunchKind::Entrada, "16:00"),
    ])
    .unwrap_err();
    assert!(matches!(err, PunchError::DuplicateShift { .. }));
}

#[test]
fn test_punch_without_shift_is_illegal() {
    let err = run(&[(PunchKind::AlmuerzoInicio, "12:00")]).unwrap_err();
    assert!(matches!(
        err,
        PunchError::IllegalTransition {
            punch: PunchKind::AlmuerzoInicio,
            ..
        }
    ));
}

#[test]
fn test_lunch_of_exactly_sixty_minutes_is_accepted() {
    let shift = run(&[
        (PunchKind::Entrada, "07:00"),
        (PunchKind::AlmuerzoInicio, "12:00"),
        (PunchKind::AlmuerzoFin, "13:00"),
    ])
    .expect("60 minutes is within the cap");
    assert_eq!(shift.state(), ShiftState::Open);
}

#[test]
fn test_lunch_of_sixty_one_minutes_is_rejected() {
    let err = run(&[
        (PunchKind::Entrada, "07:00"),
        (PunchKind::AlmuerzoInicio, "12:00"),
        (PunchKind::AlmuerzoFin, "13:01"),
    ])
    .unwrap_err();
    assert_eq!(
        err,
        PunchError::BreakDurationExceeded {
            elapsed_minutes: 61,
            cap_minutes: 60
        }
    );
}

#[test]
fn test_long_morning_break_has_no_cap() {
    run(&[
        (PunchKind::Entrada, "07:00"),
        (PunchKind::DescansoMananaInicio, "09:00"),
        (PunchKind::DescansoMananaFin, "10:30"),
    ])
    .expect("only lunch is capped");
}

#[test]
fn test_salida_before_lunch_end_is_illegal() {
    let err = run(&[
        (PunchKind::Entrada, "07:00"),
        (PunchKind::AlmuerzoInicio, "12:00"),
        (PunchKind::Salida, "12:30"),
    ])
    .unwrap_err();
    assert!(matches!(
        err,
        PunchError::IllegalTransition {
            punch: PunchKind::Salida,
            ..
        }
    ));

    let err = run(&[(PunchKind::Entrada, "07:00"), (PunchKind::Salida, "15:00")]).unwrap_err();
    assert!(matches!(err, PunchError::IllegalTransition { .. }));
}

#[test]
fn test_break_end_without_start_is_illegal() {
    let err = run(&[
        (PunchKind::Entrada, "07:00"),
        (PunchKind::DescansoMananaFin, "09:00"),
    ])
    .unwrap_err();
    assert!(matches!(err, PunchError::IllegalTransition { .. }));
}

#[test]
fn test_only_one_break_open_at_a_time() {
    let err = run(&[
        (PunchKind::Entrada, "07:00"),
        (PunchKind::DescansoMananaInicio, "09:00"),
        (PunchKind::AlmuerzoInicio, "09:10"),
    ])
    .unwrap_err();
    assert!(matches!(err, PunchError::IllegalTransition { .. }));
}

#[test]
fn test_break_cannot_repeat() {
    let err = run(&[
        (PunchKind::Entrada, "07:00"),
        (PunchKind::DescansoMananaInicio, "09:00"),
        (PunchKind::DescansoMananaFin, "09:15"),
        (PunchKind::DescansoMananaInicio, "10:00"),
    ])
    .unwrap_err();
    assert!(matches!(err, PunchError::IllegalTransition { .. }));
}

#[test]
fn test_afternoon_break_requires_lunch() {
    let err = run(&[
        (PunchKind::Entrada, "07:00"),
        (PunchKind::DescansoTardeInicio, "11:00"),
    ])
    .unwrap_err();
    assert!(matches!(err, PunchError::IllegalTransition { .. }));
}

#[test]
fn test_nothing_after_salida() {
    let err = run(&[
        (PunchKind::Entrada, "07:00"),
        (PunchKind::AlmuerzoInicio, "12:00"),
        (PunchKind::AlmuerzoFin, "13:00"),
        (PunchKind::Salida, "16:00"),
        (PunchKind::DescansoTardeInicio, "16:10"),
    ])
    .unwrap_err();
    assert!(matches!(err, PunchError::IllegalTransition { .. }));
}

#[test]
fn test_punch_earlier_than_last_is_illegal() {
    let err = run(&[
        (PunchKind::Entrada, "07:00"),
        (PunchKind::AlmuerzoInicio, "12:00"),
        (PunchKind::AlmuerzoFin, "11:30"),
    ])
    .unwrap_err();
    assert!(matches!(err, PunchError::IllegalTransition { .. }));
}

#[test]
fn test_on_break_state() {
    let shift = run(&[
        (PunchKind::Entrada, "07:00"),
        (PunchKind::AlmuerzoInicio, "12:00"),
    ])
    .unwrap();
    assert_eq!(shift.state(), ShiftState::OnBreak(BreakKind::Almuerzo));
    assert_eq!(shift.open_break(), Some(BreakKind::Almuerzo));
}

#[test]
fn test_force_close_skips_lunch_precondition() {
    let shift = run(&[(PunchKind::Entrada, "07:00")]).unwrap();
    let closed = force_close(&shift, at("2025-03-10 15:00"), "cierre automático").unwrap();

    assert_eq!(closed.salida, Some(at("2025-03-10 15:00")));
    assert!(closed.auto_closed);
    assert!(closed.observations.contains("cierre automático"));
}

#[test]
fn test_force_close_never_precedes_last_punch() {
    let shift = run(&[
        (PunchKind::Entrada, "07:00"),
        (PunchKind::AlmuerzoInicio, "15:30"),
    ])
    .unwrap();
    let closed = force_close(&shift, at("2025-03-10 15:00"), "cierre").unwrap();
    assert_eq!(closed.salida, Some(at("2025-03-10 15:30")));
    assert!(closed.almuerzo_fin.is_none());
}

#[test]
fn test_force_close_twice_is_illegal() {
    let shift = run(&[(PunchKind::Entrada, "07:00")]).unwrap();
    let closed = force_close(&shift, at("2025-03-10 15:00"), "cierre").unwrap();
    assert!(force_close(&closed, at("2025-03-10 16:00"), "cierre").is_err());
}

#[test]
fn test_custom_lunch_cap() {
    let rules = Rules {
        lunch_cap: Duration::minutes(30),
    };
    let opened = apply(None, 7, day(), PunchKind::Entrada, at("2025-03-10 07:00"), &rules).unwrap();
    let lunch = apply(
        Some(&opened),
        7,
        day(),
        PunchKind::AlmuerzoInicio,
        at("2025-03-10 12:00"),
        &rules,
    )
    .unwrap();
    let err = apply(
        Some(&lunch),
        7,
        day(),
        PunchKind::AlmuerzoFin,
        at("2025-03-10 12:45"),
        &rules,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PunchError::BreakDurationExceeded { cap_minutes: 30, .. }
    ));
}

#[test]
fn test_lunch_cap_uses_later_observed_instant() {
    let lunch = run(&[
        (PunchKind::Entrada, "07:00"),
        (PunchKind::AlmuerzoInicio, "12:00"),
    ])
    .unwrap();
    let rules = Rules::default();

    let err = apply_observed(
        Some(&lunch),
        7,
        day(),
        PunchKind::AlmuerzoFin,
        at("2025-03-10 12:50"),
        at("2025-03-10 13:20"),
        &rules,
    )
    .unwrap_err();
    assert_eq!(
        err,
        PunchError::BreakDurationExceeded {
            elapsed_minutes: 80,
            cap_minutes: 60,
        }
    );

    // an earlier observed instant never shortens the stamped one
    let shift = apply_observed(
        Some(&lunch),
        7,
        day(),
        PunchKind::AlmuerzoFin,
        at("2025-03-10 12:50"),
        at("2025-03-10 12:00"),
        &rules,
    )
    .unwrap();
    assert_eq!(shift.almuerzo_fin, Some(at("2025-03-10 12:50")));
}
