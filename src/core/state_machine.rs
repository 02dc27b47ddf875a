//! Legal ordering of punches within one shift.
//!
//! `NotStarted → Open → {MorningBreak, Lunch, AfternoonBreak}* → Closed`.
//! These functions never touch storage: they take the shift as currently
//! stored and return the shift as it must be written, or the rule that the
//! punch breaks.

use chrono::{Duration, NaiveDate};

use crate::core::clock::LocalTime;
use crate::errors::PunchError;
use crate::models::punch::{BreakEdge, BreakKind, PunchKind};
use crate::models::shift::Shift;

#[derive(Debug, Clone, Copy)]
pub struct Rules {
    /// Legal lunch cap, checked when `almuerzo_fin` is punched.
    pub lunch_cap: Duration,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            lunch_cap: Duration::minutes(60),
        }
    }
}

fn illegal(punch: PunchKind, reason: impl Into<String>) -> PunchError {
    PunchError::IllegalTransition {
        punch,
        reason: reason.into(),
    }
}

/// Applies `kind` at `at` to the worker's shift for `date`.
///
/// `current` is the stored shift for that worker-day, if any. On success the
/// returned shift carries the new field; `worked_hours` is left for the
/// caller to recompute.
pub fn apply(
    current: Option<&Shift>,
    worker_id: i64,
    date: NaiveDate,
    kind: PunchKind,
    at: LocalTime,
    rules: &Rules,
) -> Result<Shift, PunchError> {
    apply_observed(current, worker_id, date, kind, at, at, rules)
}

/// Like [`apply`], with the lunch cap measured up to `observed` when that is
/// later than the stamped `at`. The server passes its own clock here for live
/// punches so a backdated timestamp cannot shorten the lunch.
pub fn apply_observed(
    current: Option<&Shift>,
    worker_id: i64,
    date: NaiveDate,
    kind: PunchKind,
    at: LocalTime,
    observed: LocalTime,
    rules: &Rules,
) -> Result<Shift, PunchError> {
    if kind == PunchKind::Entrada {
        return match current {
            Some(_) => Err(PunchError::DuplicateShift {
                worker_id,
                date: date.format("%Y-%m-%d").to_string(),
            }),
            None => Ok(Shift::opened(worker_id, date, at)),
        };
    }

    let shift = match current {
        Some(s) if s.entrada.is_some() => s,
        _ => return Err(illegal(kind, "no hay una jornada iniciada")),
    };

    if shift.is_closed() {
        return Err(illegal(kind, "la jornada ya fue cerrada"));
    }

    if let Some(last) = shift.latest_punch()
        && at < last
    {
        return Err(illegal(
            kind,
            format!(
                "la hora {} es anterior al último registro ({})",
                at.format("%H:%M:%S"),
                last.format("%H:%M:%S")
            ),
        ));
    }

    match kind.break_edge() {
        Some((b, BreakEdge::Start)) => check_break_start(shift, b, kind)?,
        Some((b, BreakEdge::End)) => check_break_end(shift, b, kind, at, at.max(observed), rules)?,
        None => check_salida(shift, at)?,
    }

    let mut next = shift.clone();
    next.set(kind, at);
    Ok(next)
}

fn check_break_start(shift: &Shift, b: BreakKind, kind: PunchKind) -> Result<(), PunchError> {
    match shift.break_span(b) {
        (Some(_), Some(_)) => return Err(illegal(kind, format!("el {} ya fue registrado", b.label()))),
        (Some(_), None) => return Err(illegal(kind, format!("el {} ya está en curso", b.label()))),
        _ => {}
    }

    if let Some(open) = shift.open_break() {
        return Err(illegal(kind, format!("hay un {} en curso", open.label())));
    }

    if b == BreakKind::DescansoTarde && shift.almuerzo_fin.is_none() {
        return Err(illegal(
            kind,
            "el descanso de la tarde solo puede iniciar después del almuerzo",
        ));
    }

    Ok(())
}

fn check_break_end(
    shift: &Shift,
    b: BreakKind,
    kind: PunchKind,
    at: LocalTime,
    observed: LocalTime,
    rules: &Rules,
) -> Result<(), PunchError> {
    let start = match shift.break_span(b) {
        (None, _) => return Err(illegal(kind, format!("el {} no ha iniciado", b.label()))),
        (Some(_), Some(_)) => return Err(illegal(kind, format!("el {} ya finalizó", b.label()))),
        (Some(start), None) => start,
    };

    if at <= start {
        return Err(illegal(
            kind,
            "la hora de fin debe ser posterior a la de inicio",
        ));
    }

    let elapsed = observed - start;
    if b == BreakKind::Almuerzo && elapsed > rules.lunch_cap {
        return Err(PunchError::BreakDurationExceeded {
            elapsed_minutes: (elapsed.num_seconds() + 59) / 60,
            cap_minutes: rules.lunch_cap.num_minutes(),
        });
    }

    Ok(())
}

fn check_salida(shift: &Shift, at: LocalTime) -> Result<(), PunchError> {
    let kind = PunchKind::Salida;

    if shift.almuerzo_fin.is_none() {
        return Err(illegal(
            kind,
            "debe registrar el fin del almuerzo antes de la salida",
        ));
    }

    if let Some(open) = shift.open_break() {
        return Err(illegal(kind, format!("hay un {} en curso", open.label())));
    }

    if let Some(entrada) = shift.entrada
        && at <= entrada
    {
        return Err(illegal(kind, "la salida debe ser posterior a la entrada"));
    }

    Ok(())
}

/// Forced salida issued by the auto-close scan.
///
/// Skips the lunch precondition. The stamped salida is `requested`, pushed
/// forward to the latest recorded punch if the worker kept punching past it.
/// A break left open stays open: accounting counts it up to the salida.
pub fn force_close(shift: &Shift, requested: LocalTime, reason: &str) -> Result<Shift, PunchError> {
    let kind = PunchKind::Salida;

    if shift.entrada.is_none() {
        return Err(illegal(kind, "no hay una jornada iniciada"));
    }
    if shift.is_closed() || shift.auto_closed {
        return Err(illegal(kind, "la jornada ya fue cerrada"));
    }

    let salida = shift
        .latest_punch()
        .map_or(requested, |last| requested.max(last));

    let mut next = shift.clone();
    next.salida = Some(salida);
    next.auto_closed = true;
    next.append_observation(reason);
    Ok(next)
}
