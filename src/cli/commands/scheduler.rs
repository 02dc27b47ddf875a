use crate::cli::commands::Ctx;
use crate::errors::AppResult;
use crate::ui::messages::info;

/// Runs the recurring tasks until Ctrl-C.
pub async fn handle(ctx: &Ctx) -> AppResult<()> {
    let engine = ctx.engine()?;
    let mut scheduler = engine.scheduler();

    info(format!(
        "Scheduler running ({}), every {} s. Ctrl-C to stop.",
        scheduler.task_names().join(", "),
        ctx.cfg.auto_close_interval_secs
    ));
    scheduler.start();

    tokio::signal::ctrl_c().await?;

    info("Stopping scheduler…");
    scheduler.stop().await;
    Ok(())
}
