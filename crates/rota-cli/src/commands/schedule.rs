use anyhow::Result;

use super::Context;
use crate::cli::{ScheduleCommand, ShiftsCommand};
use crate::parser::{parse_date, parse_week};
use crate::views::table::{display_schedule, display_shifts};

pub async fn show_schedule(ctx: &Context, command: ScheduleCommand) -> Result<()> {
    let week = parse_week(command.week.as_deref(), ctx.today())?;
    let schedule = ctx.service.schedule(ctx.family_id(), week).await?;

    if command.json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
    } else {
        display_schedule(&schedule, ctx.today());
    }
    Ok(())
}

pub async fn show_shifts(ctx: &Context, command: ShiftsCommand) -> Result<()> {
    let date = match command.date.as_deref() {
        Some(input) => parse_date(input, ctx.today())?,
        None => ctx.today(),
    };
    let shifts = ctx.service.shifts_for_date(ctx.family_id(), date).await?;
    display_shifts(date, &shifts);
    Ok(())
}
