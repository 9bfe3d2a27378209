use anyhow::Result;

use super::Context;
use crate::cli::SplitCommand;
use crate::parser::parse_week;
use crate::views::table::display_split;

pub async fn show_split(ctx: &Context, command: SplitCommand) -> Result<()> {
    let week = parse_week(command.week.as_deref(), ctx.today())?;
    let mut options = ctx.config.split_options();
    if let Some(window) = command.window {
        options.window_weeks = window;
    }

    let split = ctx.service.task_split(ctx.family_id(), week, options).await?;
    display_split(&split);
    Ok(())
}
