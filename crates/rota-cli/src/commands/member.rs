use anyhow::Result;
use owo_colors::OwoColorize;
use rota_core::models::NewMemberData;
use rota_core::repository::MemberRepository;

use super::Context;
use crate::cli::MemberSubcommand;
use crate::util::short_id;
use crate::views::table::display_members;

pub async fn member_command(ctx: &Context, command: MemberSubcommand) -> Result<()> {
    match command {
        MemberSubcommand::Add(command) => {
            let member = ctx
                .store()
                .add_member(NewMemberData {
                    family_id: ctx.family_id(),
                    name: command.name,
                    is_virtual: command.is_virtual,
                })
                .await?;
            let kind = if member.is_virtual { "virtual member" } else { "member" };
            println!(
                "{} Added {}: {} ({})",
                "✓".green().bold(),
                kind,
                member.name.bright_white().bold(),
                short_id(member.id).yellow()
            );
        }
        MemberSubcommand::List => {
            let members = ctx.store().find_members(ctx.family_id()).await?;
            display_members(&members);
        }
    }
    Ok(())
}
