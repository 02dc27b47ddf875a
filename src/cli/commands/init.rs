use crate::cli::commands::Ctx;
use crate::config::Config;
use crate::db::SqliteStore;
use crate::errors::AppResult;
use crate::ui::messages::{success, warning};

/// Handle the `init` command
///
/// This initializes:
///  - the config directory and file (skipped in test mode)
///  - the SQLite database with all pending migrations
pub async fn handle(ctx: &Ctx) -> AppResult<()> {
    ctx.cfg.init_all(!ctx.test)?;

    println!("⚙️  Initializing jornada…");
    if !ctx.test {
        println!("📄 Config file : {}", Config::config_file().display());
    }
    println!("🗄️  Database   : {}", &ctx.cfg.database);

    let store = SqliteStore::open(&ctx.cfg.database, ctx.cfg.geofence_policy())?;

    // audit log is not blocking
    if let Err(e) = store
        .log_event(
            "init",
            "Database initialized",
            &format!("Database initialized at {}", &ctx.cfg.database),
        )
        .await
    {
        warning(format!("Failed to write internal log: {}", e));
    }

    success(format!("Database initialized at {}", &ctx.cfg.database));
    Ok(())
}
