//! Turns a shift's timestamps into hour buckets.
//!
//! Worked time is `evaluation − entrada − breaks`, where the evaluation
//! instant is `salida` for closed shifts and `now` for open ones. An
//! unfinished break runs until the evaluation instant. The gross interval is
//! split against the legal night window (21:00–06:00) and break time is taken
//! out of the day and night buckets in proportion to their share.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::core::clock::LocalTime;
use crate::models::punch::BreakKind;
use crate::models::shift::Shift;

pub const DEFAULT_LEGAL_DAILY_HOURS: f64 = 8.0;

pub const NIGHT_START_HOUR: u32 = 21;
pub const NIGHT_END_HOUR: u32 = 6;

/// Hour buckets for one shift, rounded to two decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HoursBreakdown {
    pub gross_hours: f64,
    pub break_hours: f64,
    pub worked_hours: f64,
    pub day_hours: f64,
    pub night_hours: f64,
    pub overtime_hours: f64,
    pub day_overtime_hours: f64,
    pub night_overtime_hours: f64,
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn hours(d: Duration) -> f64 {
    d.num_seconds() as f64 / 3600.0
}

/// `salida` once the shift is closed, `now` while it is open.
pub fn evaluation_instant(shift: &Shift, now: LocalTime) -> LocalTime {
    shift.salida.unwrap_or(now)
}

/// Total break time inside `[entrada, until]`.
pub fn break_duration(shift: &Shift, entrada: LocalTime, until: LocalTime) -> Duration {
    BreakKind::ALL
        .into_iter()
        .filter_map(|b| match shift.break_span(b) {
            (Some(start), end) => {
                let start = start.max(entrada);
                let end = end.unwrap_or(until).min(until);
                (end > start).then(|| end - start)
            }
            _ => None,
        })
        .fold(Duration::zero(), |acc, d| acc + d)
}

fn overlap(a_start: NaiveDateTime, a_end: NaiveDateTime, b_start: NaiveDateTime, b_end: NaiveDateTime) -> Duration {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    if end > start { end - start } else { Duration::zero() }
}

/// Time of `[start, end)` falling inside any 21:00–06:00 window, in wall time.
pub fn night_duration(start: LocalTime, end: LocalTime) -> Duration {
    if end <= start {
        return Duration::zero();
    }
    let (s, e) = (start.naive_local(), end.naive_local());
    let night_start = NaiveTime::from_hms_opt(NIGHT_START_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
    let night_end = NaiveTime::from_hms_opt(NIGHT_END_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);

    // The window opening the day before `start` reaches into its early hours.
    let mut day = s.date() - Duration::days(1);
    let last = e.date();
    let mut total = Duration::zero();
    while day <= last {
        let w_start = day.and_time(night_start);
        let w_end = (day + Duration::days(1)).and_time(night_end);
        total += overlap(s, e, w_start, w_end);
        day += Duration::days(1);
    }
    total
}

/// Computes the hour buckets of `shift` as of `now`.
///
/// Closed shifts ignore `now`, so the result is stable across calls.
pub fn compute(shift: &Shift, now: LocalTime, legal_daily_hours: f64) -> HoursBreakdown {
    let Some(entrada) = shift.entrada else {
        return HoursBreakdown::default();
    };
    let until = evaluation_instant(shift, now);
    if until <= entrada {
        return HoursBreakdown::default();
    }

    let gross = until - entrada;
    let breaks = break_duration(shift, entrada, until).min(gross);
    let worked = gross - breaks;
    let night_gross = night_duration(entrada, until);

    let night_net = if gross > Duration::zero() {
        hours(night_gross) * (worked.num_seconds() as f64 / gross.num_seconds() as f64)
    } else {
        0.0
    };

    let worked_hours = round2(hours(worked));
    let night_hours = round2(night_net);
    let day_hours = round2((worked_hours - night_hours).max(0.0));

    let legal = legal_daily_hours.max(0.0);
    let allowance_left = (legal - day_hours).max(0.0);

    HoursBreakdown {
        gross_hours: round2(hours(gross)),
        break_hours: round2(hours(breaks)),
        worked_hours,
        day_hours,
        night_hours,
        overtime_hours: round2((worked_hours - legal).max(0.0)),
        day_overtime_hours: round2((day_hours - legal).max(0.0)),
        night_overtime_hours: round2((night_hours - allowance_left).max(0.0)),
    }
}
