use chrono::{DateTime, Utc};
use poise::serenity_prelude::{GuildId, RoleId};
use tracing::{info, warn};

use crate::models::{Context, Data, Error};
use crate::utils::message_formatter::usage;
use crate::utils::role_logic::find_held_role;
use crate::utils::validation::{parse_hex_colour, require_guild, validate_role_name};

use super::{CommandArgs, Invoker, respond};

const PERMISSION_FAILURE: &str =
    "Something went wrong - I don't seem to have the permission to modify your role.";

/// Rename your birthday role during your birthday
#[poise::command(prefix_command, rename = "rolename")]
pub async fn role_name(ctx: Context<'_>, #[rest] name: Option<String>) -> Result<(), Error> {
    let name = name.unwrap_or_default();
    let reply = role_name_reply(
        ctx.data(),
        &Invoker::from_context(ctx),
        &CommandArgs::new(&name),
        Utc::now(),
    )
    .await;
    respond(ctx, Some(reply)).await
}

/// Recolour your birthday role during your birthday
#[poise::command(prefix_command, rename = "rolecolor", aliases("rolecolour"))]
pub async fn role_color(ctx: Context<'_>, #[rest] colour: Option<String>) -> Result<(), Error> {
    let colour = colour.unwrap_or_default();
    let reply = role_colour_reply(
        ctx.data(),
        &Invoker::from_context(ctx),
        &CommandArgs::new(&colour),
        Utc::now(),
    )
    .await;
    respond(ctx, Some(reply)).await
}

/// Badge role the author may edit right now, or the reply explaining why not
async fn editable_badge(
    data: &Data,
    invoker: &Invoker,
    now: DateTime<Utc>,
) -> Result<(GuildId, RoleId), String> {
    let guild_id = require_guild(invoker.guild_id).map_err(|e| e.to_string())?;

    let Some(record) = data.store.birthday(invoker.author_id).filter(|r| r.is_done()) else {
        return Err(format!(
            "You haven't configured your birthday yet. Please use **{}birthday** to do so.",
            data.settings.prefix
        ));
    };

    let in_window = record
        .window
        .is_some_and(|window| window.contains(now.timestamp_millis()));
    if !in_window {
        return Err("You can only use this command during your birthday!".to_string());
    }

    let member = match data.transport.fetch_member(guild_id, invoker.author_id).await {
        Ok(member) => member,
        Err(e) => {
            warn!("Failed to fetch member {}: {}", invoker.author_id, e);
            None
        }
    };
    let pool = data.store.config().await.badge_role_ids;
    member
        .and_then(|member| find_held_role(&member.roles, &pool))
        .map(|role| (guild_id, role))
        .ok_or_else(|| "You don't seem to have a birthday role you can edit.".to_string())
}

/// Rename the author's badge role during their birthday
pub async fn role_name_reply(
    data: &Data,
    invoker: &Invoker,
    args: &CommandArgs<'_>,
    now: DateTime<Utc>,
) -> String {
    let (guild_id, role) = match editable_badge(data, invoker, now).await {
        Ok(found) => found,
        Err(reply) => return reply,
    };

    if args.rest.trim().is_empty() {
        return format!(
            "To give your role a new name, type:\n{}",
            usage(&data.settings.prefix, "rolename", "new name")
        );
    }
    let name = match validate_role_name(args.rest) {
        Ok(name) => name,
        Err(e) => return e.to_string(),
    };

    let reason = format!("Birthday role renamed by {}.", invoker.author_name);
    match data.transport.rename_role(guild_id, role, name, &reason).await {
        Ok(()) => {
            info!("{} renamed badge role {} to {}", invoker.author_id, role, name);
            "I've changed the name of your birthday role!".to_string()
        }
        Err(e) => {
            warn!("Failed to rename role {}: {}", role, e);
            PERMISSION_FAILURE.to_string()
        }
    }
}

/// Recolour the author's badge role during their birthday
pub async fn role_colour_reply(
    data: &Data,
    invoker: &Invoker,
    args: &CommandArgs<'_>,
    now: DateTime<Utc>,
) -> String {
    let (guild_id, role) = match editable_badge(data, invoker, now).await {
        Ok(found) => found,
        Err(reply) => return reply,
    };

    let Some(raw) = args.args.first() else {
        return format!(
            "To give your role a new color, type:\n{}\nYou can find the hex code for a color (for example, `#9a72cc`) here:\nhttps://www.color-hex.com/",
            usage(&data.settings.prefix, "rolecolor", "#hexcode")
        );
    };
    let colour = match parse_hex_colour(raw) {
        Ok(colour) => colour,
        Err(e) => return e.to_string(),
    };

    let reason = format!("Birthday role recoloured by {}.", invoker.author_name);
    match data.transport.recolor_role(guild_id, role, colour, &reason).await {
        Ok(()) => {
            info!("{} recoloured badge role {} to {:06x}", invoker.author_id, role, colour);
            "I've changed the color of your birthday role!".to_string()
        }
        Err(e) => {
            warn!("Failed to recolour role {}: {}", role, e);
            PERMISSION_FAILURE.to_string()
        }
    }
}
