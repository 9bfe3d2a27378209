use anyhow::{Context as _, Result};
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use rota_core::calendar;
use rota_core::models::{ApplyOverrideRequest, OverrideAction, TaskOverride};
use rota_core::repository::{MemberRepository, OverrideRepository, TaskRepository};
use uuid::Uuid;

use super::Context;
use crate::cli::{ApplyOverrideCommand, OverrideSubcommand};
use crate::parser::{parse_date, parse_time, parse_week};
use crate::util::{resolve_member, resolve_task};
use crate::views::table::{display_overrides, display_schedule};

pub async fn override_command(ctx: &Context, command: OverrideSubcommand) -> Result<()> {
    match command {
        OverrideSubcommand::Apply(command) => apply_override(ctx, command).await,
        OverrideSubcommand::Revert(command) => {
            let week = parse_week(command.week.as_deref(), ctx.today())?;
            if !command.force && !confirm(&format!("Drop all overrides for the week of {}?", week)) {
                println!("Revert cancelled.");
                return Ok(());
            }

            if ctx.service.revert_week(ctx.family_id(), week).await? {
                println!("{} Week of {} reverted to its template", "✓".green().bold(), week);
            } else {
                println!("No overrides stored for the week of {}.", week);
            }
            Ok(())
        }
        OverrideSubcommand::Show(command) => {
            let family_id = ctx.family_id();
            let week = parse_week(command.week.as_deref(), ctx.today())?;
            let stored = ctx.store().find_week_override(family_id, week).await?;
            let tasks = ctx.store().find_tasks(family_id, true).await?;
            let members = ctx.store().find_members(family_id).await?;
            display_overrides(stored.as_ref(), &tasks, &members);
            Ok(())
        }
    }
}

async fn apply_override(ctx: &Context, command: ApplyOverrideCommand) -> Result<()> {
    let force = command.force;
    let request = match command.file.clone() {
        Some(path) => {
            let body = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut request: ApplyOverrideRequest = serde_json::from_str(&body)
                .with_context(|| format!("Failed to parse override request in {}", path.display()))?;
            request.replace_existing |= command.replace;
            request
        }
        None => inline_request(ctx, command).await?,
    };

    if request.replace_existing
        && !force
        && !confirm(&format!(
            "Replace all overrides for the week of {}?",
            request.week_start_date
        ))
    {
        println!("Override cancelled.");
        return Ok(());
    }

    let count = request.task_overrides.len();
    let schedule = ctx.service.apply_override(ctx.family_id(), request).await?;

    println!(
        "{} Applied {} override{} to the week of {}",
        "✓".green().bold(),
        count,
        if count == 1 { "" } else { "s" },
        schedule.week_start_date
    );
    display_schedule(&schedule, ctx.today());
    Ok(())
}

/// Builds a one-override request from command-line flags. The week is the
/// one containing `--date`.
async fn inline_request(ctx: &Context, command: ApplyOverrideCommand) -> Result<ApplyOverrideRequest> {
    let family_id = ctx.family_id();

    let date_arg = command.date.as_deref().unwrap_or("today");
    let date = parse_date(date_arg, ctx.today())?;
    let task_arg = command.task.as_deref().unwrap_or_default();
    let task = resolve_task(ctx.store(), family_id, task_arg).await?;
    let from = member_id(ctx, command.from.as_deref()).await?;
    let to = member_id(ctx, command.to.as_deref()).await?;

    let action = command.action.map(Into::into).unwrap_or(OverrideAction::Add);
    let mut task_override = TaskOverride {
        assigned_date: date,
        task_id: task.id,
        action,
        original_member_id: from,
        new_member_id: to,
        override_time: None,
        override_duration: command.duration,
    };
    if let Some(at) = command.at.as_deref() {
        task_override = task_override.with_time(parse_time(at)?);
    }

    Ok(ApplyOverrideRequest {
        week_start_date: calendar::week_start_of(date),
        task_overrides: vec![task_override],
        replace_existing: command.replace,
    })
}

async fn member_id(ctx: &Context, needle: Option<&str>) -> Result<Option<Uuid>> {
    match needle {
        Some(needle) => Ok(Some(resolve_member(ctx.store(), ctx.family_id(), needle).await?.id)),
        None => Ok(None),
    }
}

fn confirm(prompt: &str) -> bool {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}
