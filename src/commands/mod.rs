// Prefix command modules
mod birthday;
mod config;
mod meta;
mod reminder;
mod roles;

use poise::serenity_prelude::{ChannelId, GuildId, UserId};
use tracing::{debug, error, warn};

use crate::models::{Context, Data, Error};
use crate::utils::messages::{build_admin_only_error, build_owner_only_error};
use crate::utils::validation::ValidationError;

/// Every prefix command the bot answers to
pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        meta::help(),
        birthday::birthday(),
        birthday::next_birthday(),
        reminder::reminder(),
        reminder::periodic_reminder(),
        roles::role_name(),
        roles::role_color(),
        config::message(),
        config::channel(),
        config::roles(),
        config::enable(),
        config::disable(),
        meta::check_birthdays(),
        meta::check_reminders(),
        meta::recalculate(),
        meta::load(),
        meta::save(),
        meta::cleanup(),
    ]
}

/// Who ran a command and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoker {
    pub author_id: UserId,
    pub author_name: String,
    pub channel_id: ChannelId,
    /// `None` for direct messages
    pub guild_id: Option<GuildId>,
}

impl Invoker {
    pub fn from_context(ctx: Context<'_>) -> Self {
        Self {
            author_id: ctx.author().id,
            author_name: ctx.author().name.clone(),
            channel_id: ctx.channel_id(),
            guild_id: ctx.guild_id(),
        }
    }
}

/// Text after the command name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandArgs<'a> {
    /// Whitespace-separated tokens
    pub args: Vec<&'a str>,
    /// Raw text, newlines kept
    pub rest: &'a str,
}

impl<'a> CommandArgs<'a> {
    pub fn new(raw: &'a str) -> Self {
        let rest = raw.trim_start();
        Self {
            args: rest.split_whitespace().collect(),
            rest,
        }
    }
}

/// Post a command's reply in the channel it was invoked from
async fn respond(ctx: Context<'_>, reply: Option<String>) -> Result<(), Error> {
    if let Some(reply) = reply {
        ctx.say(reply).await?;
    }
    Ok(())
}

/// Turn failed checks into replies; unknown commands stay silent
pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    let (ctx, reply) = match error {
        poise::FrameworkError::NotAnOwner { ctx, .. } => (ctx, build_owner_only_error()),
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            (ctx, build_admin_only_error())
        }
        poise::FrameworkError::GuildOnly { ctx, .. } => {
            (ctx, ValidationError::NotInGuild.to_string())
        }
        poise::FrameworkError::UnknownCommand { msg_content, .. } => {
            debug!("Ignoring unknown command {:?}", msg_content);
            return;
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Command {} failed: {}", ctx.command().name, error);
            return;
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", e);
            }
            return;
        }
    };

    if let Err(e) = ctx.say(reply).await {
        warn!("Failed to reply to {}: {}", ctx.command().name, e);
    }
}
