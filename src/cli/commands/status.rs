use crate::cli::commands::Ctx;
use crate::errors::AppResult;
use crate::models::punch::PunchKind;
use crate::models::shift::ShiftState;
use crate::ui::messages::{field, info};
use crate::utils::time::{fmt_hours, hours_to_hhmm};

fn describe(state: ShiftState) -> String {
    match state {
        ShiftState::NotStarted => "not started".into(),
        ShiftState::Open => "open".into(),
        ShiftState::OnBreak(b) => format!("on break ({})", b.label()),
        ShiftState::Closed => "closed".into(),
    }
}

pub async fn handle(worker: i64, ctx: &Ctx) -> AppResult<()> {
    let engine = ctx.engine()?;
    let Some(status) = engine.tracker.current_shift(worker).await? else {
        info(format!("Worker {} has no shift today.", worker));
        return Ok(());
    };

    let s = &status.shift;
    println!("📅 Shift {} of worker {} - {}", s.id, s.worker_id, s.date);
    field("state", describe(status.state));
    for kind in PunchKind::ALL {
        if let Some(ts) = s.get(kind) {
            field(kind.as_str(), ts.format("%Y-%m-%d %H:%M:%S"));
        }
    }
    if s.auto_closed {
        field("auto closed", "yes");
    }
    let h = &status.hours;
    field("worked", format!("{} ({})", fmt_hours(h.worked_hours), hours_to_hhmm(h.worked_hours)));
    field("breaks", fmt_hours(h.break_hours));
    field("day", fmt_hours(h.day_hours));
    field("night", fmt_hours(h.night_hours));
    field("overtime", fmt_hours(h.overtime_hours));
    if !s.observations.is_empty() {
        field("observations", &s.observations);
    }
    Ok(())
}
