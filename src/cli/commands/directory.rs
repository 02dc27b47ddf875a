use crate::cli::commands::Ctx;
use crate::cli::parser::Commands;
use crate::db::SqliteStore;
use crate::errors::{AppError, AppResult};
use crate::models::coordinate::Coordinate;
use crate::models::worker::{RegionalSite, WorkSite, Worker};
use crate::ui::messages::success;

fn coordinate(lat: f64, lon: f64) -> AppResult<Coordinate> {
    Ok(Coordinate::new(lat, lon)?)
}

/// Handles `regional`, `worker` and `site`.
pub async fn handle(cmd: &Commands, ctx: &Ctx) -> AppResult<()> {
    let store = SqliteStore::open(&ctx.cfg.database, ctx.cfg.geofence_policy())?;

    match cmd {
        Commands::Regional { id, name, lat, lon } => {
            let point = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(coordinate(*lat, *lon)?),
                (None, None) => None,
                _ => {
                    return Err(AppError::Config(
                        "--lat and --lon must be given together".into(),
                    ));
                }
            };
            store
                .add_regional(RegionalSite {
                    id: *id,
                    name: name.clone(),
                    point,
                })
                .await?;
            success(format!("Regional {} '{}' saved.", id, name));
        }
        Commands::Worker {
            id,
            name,
            email,
            regional,
            visitor,
        } => {
            store
                .add_worker(Worker {
                    id: *id,
                    name: name.clone(),
                    email: email.clone(),
                    regional_id: *regional,
                    is_visitor: *visitor,
                })
                .await?;
            success(format!("Worker {} '{}' saved.", id, name));
        }
        Commands::Site {
            worker,
            name,
            lat,
            lon,
            tolerance,
        } => {
            let tolerance_m = tolerance.unwrap_or(ctx.cfg.default_tolerance_m);
            store
                .set_work_site(WorkSite {
                    worker_id: *worker,
                    name: name.clone(),
                    point: coordinate(*lat, *lon)?,
                    tolerance_m,
                })
                .await?;
            success(format!(
                "Site '{}' assigned to worker {} ({} m).",
                name, worker, tolerance_m
            ));
        }
        _ => {}
    }
    Ok(())
}
