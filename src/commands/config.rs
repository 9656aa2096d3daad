use poise::serenity_prelude::{ChannelId, RoleId};
use tracing::{error, info, warn};

use crate::models::{Context, Data, Error};
use crate::utils::message_formatter::{
    USER_PLACEHOLDER, channel_mention, fits_announcement_limit, render_announcement, usage,
};
use crate::utils::messages::{build_database_error, build_missing_settings_line, format_error};
use crate::utils::role_logic::{BADGE_ROLE_NAME, discover_roles};
use crate::utils::validation::{parse_channel_reference, require_guild};

use super::{CommandArgs, Invoker, respond};

/// Combined reply and preview length that still fits one message
const MAX_PREVIEW_LENGTH: usize = 1800;

/// Set the birthday announcement message
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn message(ctx: Context<'_>, #[rest] template: Option<String>) -> Result<(), Error> {
    let template = template.unwrap_or_default();
    let reply = message_reply(
        ctx.data(),
        &Invoker::from_context(ctx),
        &CommandArgs::new(&template),
    )
    .await;
    respond(ctx, Some(reply)).await
}

/// Set the channel birthdays are announced in
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn channel(ctx: Context<'_>, #[rest] target: Option<String>) -> Result<(), Error> {
    let target = target.unwrap_or_default();
    let reply = channel_reply(
        ctx.data(),
        &Invoker::from_context(ctx),
        &CommandArgs::new(&target),
    )
    .await;
    respond(ctx, Some(reply)).await
}

/// Find the birthday roles of this server
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn roles(ctx: Context<'_>) -> Result<(), Error> {
    let reply = roles_reply(ctx.data(), &Invoker::from_context(ctx)).await;
    respond(ctx, Some(reply)).await
}

/// Start announcing birthdays
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    let reply = set_enabled(ctx.data(), true).await;
    respond(ctx, Some(reply)).await
}

/// Stop announcing birthdays
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    let reply = set_enabled(ctx.data(), false).await;
    respond(ctx, Some(reply)).await
}

async fn persist_config(data: &Data) -> Result<(), String> {
    data.store.save_config().await.map_err(|e| {
        error!("Failed to save configuration: {}", e);
        build_database_error()
    })
}

/// Set the announcement template and preview it
pub async fn message_reply(data: &Data, invoker: &Invoker, args: &CommandArgs<'_>) -> String {
    let prefix = &data.settings.prefix;
    let author = invoker.author_id.get();
    let candidate = args.rest.trim();

    let too_large = !candidate.is_empty() && !fits_announcement_limit(candidate, author);
    if !candidate.is_empty() && !too_large {
        data.store
            .update_config(|config| config.announcement_template = Some(candidate.to_string()))
            .await;
        if let Err(reply) = persist_config(data).await {
            return reply;
        }
        info!("Announcement template updated by {}", invoker.author_id);
    }

    let config = data.store.config().await;
    let mut response = format!(
        "• You can type `{}` in the birthday message where you want me to mention the person.\n{}\n",
        USER_PLACEHOLDER,
        build_missing_settings_line(&config.missing_settings(), prefix)
    );

    if too_large {
        response.push_str(&format!(
            "The message gets way too big when I convert `{}` to real mentions! Please pick a shorter message.",
            USER_PLACEHOLDER
        ));
    } else if let Some(template) = &config.announcement_template {
        let expanded = render_announcement(template, author);
        if response.chars().count() + expanded.chars().count() > MAX_PREVIEW_LENGTH {
            response.push_str("You've successfully set a birthday message but it's too large to preview!");
        } else {
            response.push_str(
                "Birthday messages will look like this (remember I'll post a random image alongside the message too):\n\n",
            );
            response.push_str(&expanded);
        }
    } else {
        response.push_str("To set a birthday message, type:\n");
        response.push_str(&usage(prefix, "message", "Happy birthday @user@!"));
    }
    response
}

/// Set the announcement channel, recording the community it belongs to
pub async fn channel_reply(data: &Data, invoker: &Invoker, args: &CommandArgs<'_>) -> String {
    let guild_id = match require_guild(invoker.guild_id) {
        Ok(guild_id) => guild_id,
        Err(e) => return e.to_string(),
    };
    let prefix = &data.settings.prefix;
    let text = args.rest.trim();

    let outcome = if text.is_empty() {
        format!(
            "To set the channel for birthday messages, type:\n{}",
            usage(prefix, "channel", "#the-channel-name")
        )
    } else {
        let target = parse_channel_reference(text).map(ChannelId::new);
        let valid = match target {
            Some(channel_id) => match data.transport.is_text_channel(channel_id).await {
                Ok(valid) => valid,
                Err(e) => {
                    warn!("Failed to resolve channel {}: {}", channel_id, e);
                    false
                }
            },
            None => false,
        };

        match target.filter(|_| valid) {
            Some(channel_id) => {
                data.store
                    .update_config(|config| {
                        config.announcement_channel_id = Some(channel_id);
                        config.community_id = Some(guild_id);
                    })
                    .await;
                if let Err(reply) = persist_config(data).await {
                    return reply;
                }
                info!(
                    "Announcement channel set to {} in guild {}",
                    channel_id, guild_id
                );
                format!(
                    "Birthday messages will be posted to {}.",
                    channel_mention(channel_id.get())
                )
            }
            None => "That doesn't seem to be a valid text channel. Please retry.".to_string(),
        }
    };

    let config = data.store.config().await;
    format!(
        "{}\n{}",
        build_missing_settings_line(&config.missing_settings(), prefix),
        outcome
    )
}

/// Find the badge pool and the title roles by name
pub async fn roles_reply(data: &Data, invoker: &Invoker) -> String {
    let guild_id = match require_guild(invoker.guild_id) {
        Ok(guild_id) => guild_id,
        Err(e) => return e.to_string(),
    };

    let listed = match data.transport.list_roles(guild_id).await {
        Ok(roles) => roles,
        Err(e) => {
            warn!("Failed to list roles in guild {}: {}", guild_id, e);
            return format_error("I couldn't read the roles of this server.");
        }
    };
    let discovered = discover_roles(listed.iter().map(|role| (role.id.get(), role.name.as_str())));

    let mut response = format!(
        "I'm searching for some roles in this server.\n\
         I need 3 roles with the names **Birthday Boy**, **Birthday Girl** and **Birthday Cutie**.\n\
         I'm also looking for a few roles with the name **{}** - users will be able to edit those.\n\n",
        BADGE_ROLE_NAME
    );

    let missing = discovered.missing_titles();
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(|name| format!("**{}**", name)).collect();
        response.push_str(&format!("I couldn't find the role(s) {}.\n", names.join(", ")));
    }
    if discovered.badges.is_empty() {
        response.push_str(&format!("I didn't find any role named **{}**.\n", BADGE_ROLE_NAME));
    }

    let Some(titles) = discovered.complete_titles().filter(|_| !discovered.badges.is_empty()) else {
        return response;
    };

    let badge_count = discovered.badges.len();
    data.store
        .update_config(|config| {
            config.badge_role_ids = discovered.badges.iter().copied().map(RoleId::new).collect();
            config.title_role_ids = titles.into_iter().map(RoleId::new).collect();
        })
        .await;
    if let Err(reply) = persist_config(data).await {
        return reply;
    }
    info!(
        "Discovered {} badge roles and all title roles in guild {}",
        badge_count, guild_id
    );

    response.push_str(&format!(
        "I've spotted all the special roles I need! I also found {} birthday role(s) which I'll automatically manage.",
        badge_count
    ));
    response
}

/// Switch announcements on or off
pub async fn set_enabled(data: &Data, enabled: bool) -> String {
    data.store.update_config(|config| config.enabled = enabled).await;
    if let Err(reply) = persist_config(data).await {
        return reply;
    }
    info!("Birthday announcements enabled: {}", enabled);
    if enabled {
        "I'll now begin announcing birthdays if all configurations are complete.".to_string()
    } else {
        "I'll now stop announcing birthdays.".to_string()
    }
}
