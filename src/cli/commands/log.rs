use crate::cli::commands::Ctx;
use crate::cli::parser::Commands;
use crate::core::log::LogLogic;
use crate::db::SqliteStore;
use crate::errors::AppResult;

pub async fn handle(cmd: &Commands, ctx: &Ctx) -> AppResult<()> {
    if matches!(cmd, Commands::Log { print: true }) {
        let store = SqliteStore::open(&ctx.cfg.database, ctx.cfg.geofence_policy())?;
        let entries = store.audit_log().await?;

        println!("📜 Internal log:\n");
        for line in LogLogic::render(&entries) {
            println!("{line}");
        }
    }

    Ok(())
}
