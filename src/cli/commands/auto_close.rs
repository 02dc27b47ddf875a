use crate::cli::commands::Ctx;
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};

pub async fn handle(ctx: &Ctx) -> AppResult<()> {
    let engine = ctx.engine()?;
    let report = engine.auto_closer.run_once().await;

    if report.shifts_closed == 0 && report.failures.is_empty() {
        info("No shifts to close.");
        return Ok(());
    }

    for d in &report.details {
        success(format!(
            "Shift {} of worker {} ({}) closed at {} - {} h",
            d.shift_id,
            d.worker_id,
            d.shift_date,
            d.forced_close_time.format("%Y-%m-%d %H:%M"),
            d.worked_hours
        ));
    }
    for f in &report.failures {
        warning(format!(
            "Shift {} of worker {} could not be closed: {}",
            f.shift_id, f.worker_id, f.error
        ));
    }
    println!("Shifts closed: {}", report.shifts_closed);
    Ok(())
}
