use crate::cli::commands::Ctx;
use crate::cli::parser::Commands;
use crate::core::clock;
use crate::errors::{AppError, AppResult};
use crate::models::coordinate::Coordinate;
use crate::models::punch::{PunchEvent, PunchKind};
use crate::ui::messages::{field, rejection, success};
use crate::utils::time::fmt_hours;

pub async fn handle(cmd: &Commands, ctx: &Ctx) -> AppResult<()> {
    let Commands::Punch {
        worker,
        kind,
        lat,
        lon,
        accuracy,
        at,
        observations,
        geofence_override,
    } = cmd
    else {
        return Ok(());
    };

    let kind = PunchKind::parse(kind).ok_or_else(|| AppError::InvalidPunchKind(kind.clone()))?;

    let mut event = PunchEvent::new(
        kind,
        Coordinate {
            lat: *lat,
            lon: *lon,
        },
    );
    event.accuracy_m = *accuracy;
    event.observations = observations.clone();
    event.geofence_override = *geofence_override;
    if let Some(raw) = at {
        event = event.replayed_at(clock::parse_local(raw)?);
    }

    let engine = ctx.engine()?;
    match engine.tracker.punch(*worker, event).await {
        Ok(shift) => {
            let at = shift.get(kind).map(|t| t.format("%Y-%m-%d %H:%M").to_string());
            success(format!(
                "{} recorded for worker {} at {}.",
                kind,
                worker,
                at.unwrap_or_default()
            ));
            field("shift", shift.id);
            field("date", shift.date);
            field("worked hours", fmt_hours(shift.worked_hours));
            Ok(())
        }
        Err(e) => {
            rejection(&e.to_rejection());
            Err(AppError::Punch(e))
        }
    }
}
