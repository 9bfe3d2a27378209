use anyhow::{anyhow, Result};
use owo_colors::OwoColorize;
use rota_core::error::CoreError;
use rota_core::models::{NewDayTemplateData, NewDayTemplateItem};
use rota_core::repository::{MemberRepository, TaskRepository, TemplateRepository};

use super::Context;
use crate::cli::{AddDayItemCommand, DaySubcommand, RemoveDayItemCommand};
use crate::parser::parse_time;
use crate::util::{resolve_day_template, resolve_member, resolve_task, short_id};
use crate::views::table::display_day_templates;

pub async fn day_command(ctx: &Context, command: DaySubcommand) -> Result<()> {
    match command {
        DaySubcommand::Add(command) => {
            let template = ctx
                .store()
                .add_day_template(NewDayTemplateData {
                    family_id: ctx.family_id(),
                    name: command.name,
                    description: command.description,
                })
                .await?;
            println!(
                "{} Created day template: {} ({})",
                "✓".green().bold(),
                template.name.bright_white().bold(),
                short_id(template.id).yellow()
            );
            Ok(())
        }
        DaySubcommand::Item(command) => add_item(ctx, command).await,
        DaySubcommand::Unitem(command) => remove_item(ctx, command).await,
        DaySubcommand::List => {
            let family_id = ctx.family_id();
            let templates = ctx.store().find_day_templates(family_id).await?;
            let tasks = ctx.store().find_tasks(family_id, true).await?;
            let members = ctx.store().find_members(family_id).await?;
            display_day_templates(&templates, &tasks, &members);
            Ok(())
        }
    }
}

async fn add_item(ctx: &Context, command: AddDayItemCommand) -> Result<()> {
    let family_id = ctx.family_id();
    let template = resolve_day_template(ctx.store(), family_id, &command.day).await?;
    let task = resolve_task(ctx.store(), family_id, &command.task).await?;
    let member = match &command.member {
        Some(needle) => Some(resolve_member(ctx.store(), family_id, needle).await?),
        None => None,
    };

    let item = ctx
        .store()
        .add_day_template_item(
            template.id,
            NewDayTemplateItem {
                task_id: task.id,
                member_id: member.as_ref().map(|m| m.id),
                override_time: command.at.as_deref().map(parse_time).transpose()?,
                override_duration: command.duration,
            },
        )
        .await?;
    ctx.service.notify_template_change(family_id);

    println!(
        "{} Added {} to {} at position {}{}",
        "✓".green().bold(),
        task.name.bright_white().bold(),
        template.name,
        item.position + 1,
        member.map(|m| format!(" for {}", m.name)).unwrap_or_default()
    );
    Ok(())
}

async fn remove_item(ctx: &Context, command: RemoveDayItemCommand) -> Result<()> {
    let template = resolve_day_template(ctx.store(), ctx.family_id(), &command.day).await?;
    let item = command
        .position
        .checked_sub(1)
        .and_then(|index| template.items.get(index))
        .ok_or_else(|| {
            anyhow!(CoreError::NotFound(format!(
                "Day template '{}' has no item #{}",
                template.name, command.position
            )))
        })?;

    ctx.store().remove_day_template_item(item.id).await?;
    ctx.service.notify_template_change(ctx.family_id());

    println!("{} Removed item #{} from {}", "✓".green().bold(), command.position, template.name);
    Ok(())
}
