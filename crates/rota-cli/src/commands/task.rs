use anyhow::Result;
use owo_colors::{OwoColorize, Style};
use rota_core::calendar::format_clock_time;
use rota_core::models::{NewTaskData, UpdateTaskData};
use rota_core::repository::TaskRepository;

use super::Context;
use crate::cli::{AddTaskCommand, DeactivateTaskCommand, EditTaskCommand, ListTasksCommand, TaskSubcommand};
use crate::parser::parse_time;
use crate::util::{resolve_task, short_id};
use crate::views::table::display_tasks;

pub async fn task_command(ctx: &Context, command: TaskSubcommand) -> Result<()> {
    match command {
        TaskSubcommand::Add(command) => add_task(ctx, command).await,
        TaskSubcommand::List(command) => list_tasks(ctx, command).await,
        TaskSubcommand::Edit(command) => edit_task(ctx, command).await,
        TaskSubcommand::Deactivate(command) => deactivate_task(ctx, command).await,
    }
}

async fn add_task(ctx: &Context, command: AddTaskCommand) -> Result<()> {
    let task = ctx
        .store()
        .add_task(NewTaskData {
            family_id: ctx.family_id(),
            name: command.name,
            icon: command.icon,
            color: command.color,
            default_start_time: parse_time(&command.at)?,
            default_duration: command.duration,
        })
        .await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    println!("{} Created task: {}", "✓".style(success_style), task.name.bright_white().bold());
    println!("  {} Task ID: {}", "→".style(info_style), short_id(task.id).yellow());
    println!(
        "  {} Default: {} for {} min",
        "→".style(info_style),
        format_clock_time(task.default_start_time).cyan(),
        task.default_duration
    );
    Ok(())
}

async fn list_tasks(ctx: &Context, command: ListTasksCommand) -> Result<()> {
    let tasks = ctx.store().find_tasks(ctx.family_id(), command.all).await?;
    display_tasks(&tasks);
    Ok(())
}

async fn edit_task(ctx: &Context, command: EditTaskCommand) -> Result<()> {
    let task = resolve_task(ctx.store(), ctx.family_id(), &command.task).await?;

    let update = UpdateTaskData {
        name: command.name,
        icon: if command.icon_clear { Some(None) } else { command.icon.map(Some) },
        color: if command.color_clear { Some(None) } else { command.color.map(Some) },
        default_start_time: command.at.as_deref().map(parse_time).transpose()?,
        default_duration: command.duration,
    };

    let updated = ctx.store().update_task(task.id, update).await?;
    ctx.service.notify_template_change(ctx.family_id());

    println!("{} Updated task: {}", "✓".green().bold(), updated.name.bright_white().bold());
    Ok(())
}

async fn deactivate_task(ctx: &Context, command: DeactivateTaskCommand) -> Result<()> {
    let task = resolve_task(ctx.store(), ctx.family_id(), &command.task).await?;
    if !task.active {
        println!("Task '{}' is already inactive.", task.name);
        return Ok(());
    }

    let task = ctx.store().deactivate_task(task.id).await?;
    ctx.service.notify_template_change(ctx.family_id());

    println!("{} Deactivated task: {}", "✓".green().bold(), task.name.bright_white().bold());
    println!(
        "  {} Existing templates and overrides keep showing it as inactive",
        "→".blue()
    );
    Ok(())
}
