use anyhow::Result;
use owo_colors::OwoColorize;
use rota_core::calendar;
use rota_core::models::NewWeekTemplateData;
use rota_core::repository::TemplateRepository;

use super::Context;
use crate::cli::{AddWeekCommand, WeekSubcommand};
use crate::parser::parse_weekday;
use crate::util::{resolve_day_template, resolve_week_template, short_id};
use crate::views::table::display_week_templates;

pub async fn week_command(ctx: &Context, command: WeekSubcommand) -> Result<()> {
    let family_id = ctx.family_id();
    match command {
        WeekSubcommand::Add(command) => add_week(ctx, command).await?,
        WeekSubcommand::SetDay(command) => {
            let week = resolve_week_template(ctx.store(), family_id, &command.week).await?;
            let day_of_week = parse_weekday(&command.weekday)?;
            let day = resolve_day_template(ctx.store(), family_id, &command.day).await?;

            ctx.store().set_week_template_day(week.id, day_of_week, day.id).await?;
            ctx.service.notify_template_change(family_id);
            println!(
                "{} {}: {} now uses {}",
                "✓".green().bold(),
                week.name,
                weekday_name(day_of_week),
                day.name.bright_white().bold()
            );
        }
        WeekSubcommand::ClearDay(command) => {
            let week = resolve_week_template(ctx.store(), family_id, &command.week).await?;
            let day_of_week = parse_weekday(&command.weekday)?;

            ctx.store().clear_week_template_day(week.id, day_of_week).await?;
            ctx.service.notify_template_change(family_id);
            println!("{} {}: cleared {}", "✓".green().bold(), week.name, weekday_name(day_of_week));
        }
        WeekSubcommand::List => {
            let weeks = ctx.store().find_week_templates(family_id).await?;
            let days = ctx.store().find_day_templates(family_id).await?;
            display_week_templates(&weeks, &days);
        }
    }
    Ok(())
}

async fn add_week(ctx: &Context, command: AddWeekCommand) -> Result<()> {
    let template = ctx
        .store()
        .add_week_template(NewWeekTemplateData {
            family_id: ctx.family_id(),
            name: command.name,
            is_default: command.default,
            apply_rule: command.rule.map(Into::into),
            priority: command.priority,
        })
        .await?;
    ctx.service.notify_template_change(ctx.family_id());

    println!(
        "{} Created week template: {} ({})",
        "✓".green().bold(),
        template.name.bright_white().bold(),
        short_id(template.id).yellow()
    );
    if template.is_default {
        println!("  {} Used when no other template applies", "→".blue());
    }
    Ok(())
}

fn weekday_name(day_of_week: u8) -> String {
    calendar::weekday_from_day_of_week(day_of_week)
        .map_or_else(|| day_of_week.to_string(), |d| d.to_string())
}
