use chrono::Datelike;

use crate::cli::commands::Ctx;
use crate::cli::parser::Commands;
use crate::core::clock;
use crate::errors::{AppError, AppResult};
use crate::utils::date::parse_period;
use crate::utils::time::fmt_hours;

pub async fn handle(cmd: &Commands, ctx: &Ctx) -> AppResult<()> {
    let Commands::Report {
        worker,
        period,
        legal_hours,
        json,
    } = cmd
    else {
        return Ok(());
    };

    let (from, to) = match period {
        Some(p) => parse_period(p).map_err(AppError::InvalidDate)?,
        None => {
            let today = clock::civil_date(&ctx.clock.now());
            parse_period(&format!("{:04}-{:02}", today.year(), today.month()))
                .map_err(AppError::InvalidDate)?
        }
    };

    let engine = ctx.engine()?;
    let summary = engine.tracker.summary(*worker, from, to, *legal_hours).await?;

    if *json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("📅 Hours for worker {} from {} to {}:\n", worker, from, to);
    println!(
        "{:<10}  {:>7}  {:>7}  {:>7}  {:>7}  {:>7}  {:>7}  {}",
        "DATE", "WORKED", "DAY", "NIGHT", "OT", "OT-DAY", "OT-NGT", "FLAGS"
    );
    for row in &summary.rows {
        let mut flags = Vec::new();
        if row.open {
            flags.push("open");
        }
        if row.auto_closed {
            flags.push("auto");
        }
        let h = &row.hours;
        println!(
            "{:<10}  {:>7}  {:>7}  {:>7}  {:>7}  {:>7}  {:>7}  {}",
            row.date.format("%Y-%m-%d"),
            fmt_hours(h.worked_hours),
            fmt_hours(h.day_hours),
            fmt_hours(h.night_hours),
            fmt_hours(h.overtime_hours),
            fmt_hours(h.day_overtime_hours),
            fmt_hours(h.night_overtime_hours),
            flags.join(",")
        );
    }

    let t = &summary.totals;
    println!(
        "\n{:<10}  {:>7}  {:>7}  {:>7}  {:>7}  {:>7}  {:>7}",
        "TOTAL",
        fmt_hours(t.worked_hours),
        fmt_hours(t.day_hours),
        fmt_hours(t.night_hours),
        fmt_hours(t.overtime_hours),
        fmt_hours(t.day_overtime_hours),
        fmt_hours(t.night_overtime_hours),
    );
    println!(
        "Days worked: {}   Average per day: {}",
        summary.days_worked,
        fmt_hours(summary.average_hours_per_day)
    );
    Ok(())
}
