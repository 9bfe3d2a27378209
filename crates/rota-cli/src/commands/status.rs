use anyhow::{anyhow, Result};
use rota_core::error::CoreError;

use super::Context;
use crate::cli::StatusCommand;
use crate::util::resolve_member;
use crate::views::table::display_status;

pub async fn show_status(ctx: &Context, command: StatusCommand) -> Result<()> {
    let needle = command
        .member
        .or_else(|| ctx.config.member.clone())
        .ok_or_else(|| {
            anyhow!(CoreError::InvalidInput(
                "No member given. Pass --member or set `member` in rota.toml".to_string()
            ))
        })?;
    let member = resolve_member(ctx.store(), ctx.family_id(), &needle).await?;

    let now = ctx.now();
    let status = ctx.service.shift_status(ctx.family_id(), member.id, now).await?;
    display_status(&member, &status, now);
    Ok(())
}
