use chrono::NaiveDate;
use serde::Serialize;

use crate::core::calculator::accounting::{self, HoursBreakdown, round2};
use crate::core::clock::LocalTime;
use crate::models::shift::Shift;

#[derive(Debug, Clone, Serialize)]
pub struct DayRow {
    pub date: NaiveDate,
    pub auto_closed: bool,
    pub open: bool,
    pub hours: HoursBreakdown,
}

/// Totals over a date range. The average divides by days actually worked,
/// not calendar days.
#[derive(Debug, Clone, Serialize)]
pub struct RangeSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days_worked: usize,
    pub totals: HoursBreakdown,
    pub average_hours_per_day: f64,
    pub rows: Vec<DayRow>,
}

pub fn summarize(
    shifts: &[Shift],
    from: NaiveDate,
    to: NaiveDate,
    now: LocalTime,
    legal_daily_hours: f64,
) -> RangeSummary {
    let mut rows: Vec<DayRow> = shifts
        .iter()
        .filter(|s| s.entrada.is_some() && s.date >= from && s.date <= to)
        .map(|s| DayRow {
            date: s.date,
            auto_closed: s.auto_closed,
            open: !s.is_closed(),
            hours: accounting::compute(s, now, legal_daily_hours),
        })
        .collect();
    rows.sort_by_key(|r| r.date);

    let mut t = HoursBreakdown::default();
    for r in &rows {
        t.gross_hours += r.hours.gross_hours;
        t.break_hours += r.hours.break_hours;
        t.worked_hours += r.hours.worked_hours;
        t.day_hours += r.hours.day_hours;
        t.night_hours += r.hours.night_hours;
        t.overtime_hours += r.hours.overtime_hours;
        t.day_overtime_hours += r.hours.day_overtime_hours;
        t.night_overtime_hours += r.hours.night_overtime_hours;
    }
    let totals = HoursBreakdown {
        gross_hours: round2(t.gross_hours),
        break_hours: round2(t.break_hours),
        worked_hours: round2(t.worked_hours),
        day_hours: round2(t.day_hours),
        night_hours: round2(t.night_hours),
        overtime_hours: round2(t.overtime_hours),
        day_overtime_hours: round2(t.day_overtime_hours),
        night_overtime_hours: round2(t.night_overtime_hours),
    };

    let days_worked = rows.len();
    let average_hours_per_day = if days_worked == 0 {
        0.0
    } else {
        round2(totals.worked_hours / days_worked as f64)
    };

    RangeSummary {
        from,
        to,
        days_worked,
        totals,
        average_hours_per_day,
        rows,
    }
}
