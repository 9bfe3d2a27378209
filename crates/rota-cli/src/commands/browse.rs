use std::sync::Arc;

use anyhow::Result;
use owo_colors::OwoColorize;
use rota_core::models::ResolvedWeekSchedule;
use rota_core::repository::SqliteRepository;
use rota_core::service::ScheduleService;
use rota_core::sync::{CacheRead, ScheduleSync, WeekView};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use super::Context;
use crate::cli::BrowseCommand;
use crate::parser::parse_week;
use crate::views::table::display_schedule;

type WeekSync = ScheduleSync<ScheduleService<SqliteRepository>>;

const HELP: &str = "n: next week, p: previous week, t: this week, r: refresh, x: revert overrides, g DATE: go to date, q: quit";

/// Line-driven week browser over the cached sync layer. Neighbouring weeks
/// are prefetched, so stepping back and forth is served from the cache.
pub async fn browse(ctx: &Context, command: BrowseCommand) -> Result<()> {
    let sync: WeekSync = ScheduleSync::with_clock(
        ctx.family_id(),
        ctx.service.clone(),
        ctx.config.sync_config(),
        Arc::new(ctx.clock),
    );
    let listener = sync.listen(ctx.service.events().subscribe());

    let start = parse_week(command.week.as_deref(), ctx.today())?;
    show(ctx, &sync, sync.navigate(start)).await;
    println!("{}", HELP.bright_black());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let view = match line.split_once(' ').map_or((line, ""), |(cmd, rest)| (cmd, rest.trim())) {
            ("n", _) => sync.navigate_by(1),
            ("p", _) => sync.navigate_by(-1),
            ("t", _) => sync.navigate_today(),
            ("r", _) => match sync.displayed() {
                Some(week) => {
                    sync.refresh(week);
                    sync.navigate(week)
                }
                None => sync.navigate_today(),
            },
            ("x", _) => {
                let Some(week) = sync.displayed() else {
                    continue;
                };
                match ctx.service.revert_week(ctx.family_id(), week).await {
                    Ok(true) => println!("{} Week of {} reverted to its template", "✓".green().bold(), week),
                    Ok(false) => println!("No overrides stored for the week of {}.", week),
                    Err(e) => {
                        warn!(%week, error = %e, "revert from browser failed");
                        eprintln!("{} {}", "Error:".red().bold(), e);
                    }
                }
                sync.refresh(week);
                sync.navigate(week)
            }
            ("g", date) => match parse_week(Some(date), ctx.today()) {
                Ok(week) => sync.navigate(week),
                Err(e) => {
                    eprintln!("{} {}", "Error:".red().bold(), e);
                    continue;
                }
            },
            ("q", _) | ("quit", _) => break,
            ("", _) => continue,
            _ => {
                println!("{}", HELP.bright_black());
                continue;
            }
        };
        show(ctx, &sync, view).await;
    }

    listener.abort();
    Ok(())
}

async fn show(ctx: &Context, sync: &WeekSync, view: WeekView) {
    debug!(week = %view.week_start, "showing week");
    if view.read.is_loading() {
        if let Some(placeholder) = view.visible() {
            println!(
                "{}",
                format!(
                    "Loading week of {} (showing week of {})...",
                    view.week_start, placeholder.week_start_date
                )
                .bright_black()
            );
        }
        sync.wait_idle().await;
    }

    let Some(view) = sync.view() else {
        return;
    };
    match &view.read {
        CacheRead::Present(schedule) => render(ctx, schedule),
        CacheRead::Stale { schedule, error } => {
            render(ctx, schedule);
            match error {
                Some(error) => println!("{} refresh failed: {}", "!".yellow().bold(), error),
                None => println!("{} this week has changed, refreshing", "!".yellow().bold()),
            }
        }
        CacheRead::Failed { error } => {
            eprintln!("{} week of {}: {}", "Error:".red().bold(), view.week_start, error);
        }
        CacheRead::Loading { .. } | CacheRead::Absent => {
            println!("Week of {} is not loaded yet.", view.week_start);
        }
    }
}

fn render(ctx: &Context, schedule: &ResolvedWeekSchedule) {
    display_schedule(schedule, ctx.today());
}
