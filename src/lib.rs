//! jornada library root.
//! Exposes the CLI parser, the async `run()` entry point and the engine modules.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod offline;
pub mod ui;
pub mod utils;

use std::sync::Arc;

use clap::Parser;
use crate::cli::commands::{self, Ctx};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::core::clock::{self, Clock, FixedClock, SystemClock};
use crate::errors::AppResult;
use tracing_subscriber::EnvFilter;

/// Central command dispatcher
pub async fn dispatch(cli: &Cli, ctx: &Ctx) -> AppResult<()> {
    match &cli.command {
        Commands::Init => commands::init::handle(ctx).await,
        Commands::Regional { .. } | Commands::Worker { .. } | Commands::Site { .. } => {
            commands::directory::handle(&cli.command, ctx).await
        }
        Commands::Punch { .. } => commands::punch::handle(&cli.command, ctx).await,
        Commands::Status { worker } => commands::status::handle(*worker, ctx).await,
        Commands::Report { .. } => commands::report::handle(&cli.command, ctx).await,
        Commands::AutoClose => commands::auto_close::handle(ctx).await,
        Commands::Scheduler => commands::scheduler::handle(ctx).await,
        Commands::Log { .. } => commands::log::handle(&cli.command, ctx).await,
    }
}

/// Diagnostics go to stderr, filtered by `JORNADA_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("JORNADA_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Entry point used by main.rs
pub async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    let mut cfg = Config::load()?;
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    let clock: Arc<dyn Clock> = match &cli.now {
        Some(raw) => Arc::new(FixedClock::new(clock::parse_local(raw)?)),
        None => Arc::new(SystemClock),
    };

    let ctx = Ctx {
        cfg,
        clock,
        test: cli.test,
    };
    dispatch(&cli, &ctx).await
}
