use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::models::{Context, Data, Error, ReminderRecord};
use crate::utils::messages::build_database_error;
use crate::utils::schedule_utils::{ReminderOffset, ReminderOffsetError};
use crate::utils::validation::{require_guild, validate_reminder_text};

use super::{CommandArgs, Invoker, respond};

/// Get pinged in this channel after a delay like `1d10h20m`
#[poise::command(prefix_command)]
pub async fn reminder(ctx: Context<'_>, #[rest] request: Option<String>) -> Result<(), Error> {
    let request = request.unwrap_or_default();
    let reply = reminder_reply(
        ctx.data(),
        &Invoker::from_context(ctx),
        &CommandArgs::new(&request),
        false,
        Utc::now(),
    )
    .await;
    respond(ctx, Some(reply)).await
}

/// A reminder that repeats with the same delay
#[poise::command(
    prefix_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    rename = "periodicreminder"
)]
pub async fn periodic_reminder(
    ctx: Context<'_>,
    #[rest] request: Option<String>,
) -> Result<(), Error> {
    let request = request.unwrap_or_default();
    let reply = reminder_reply(
        ctx.data(),
        &Invoker::from_context(ctx),
        &CommandArgs::new(&request),
        true,
        Utc::now(),
    )
    .await;
    respond(ctx, Some(reply)).await
}

fn reminder_usage(prefix: &str, command: &str) -> String {
    format!(
        "`{}{} 1d10h20m It is time!`\n\
         This would make me ping you saying \"It is time!\" in 1 day, 10 hours and 20 minutes from now.\n\
         You can use the units `year/y`, `month/mo`, `day/d`, `hour/h`, and `minute/m`.",
        prefix, command
    )
}

/// Schedule a reminder in the current channel; `periodic` ones repeat with the same offset
pub async fn reminder_reply(
    data: &Data,
    invoker: &Invoker,
    args: &CommandArgs<'_>,
    periodic: bool,
    now: DateTime<Utc>,
) -> String {
    if let Err(e) = require_guild(invoker.guild_id) {
        return e.to_string();
    }
    let command = if periodic { "periodicreminder" } else { "reminder" };
    let usage = reminder_usage(&data.settings.prefix, command);

    let [raw_offset, words @ ..] = args.args.as_slice() else {
        return usage;
    };
    if words.is_empty() {
        return usage;
    }

    let offset = match ReminderOffset::parse(raw_offset) {
        Ok(offset) => offset,
        Err(ReminderOffsetError::Malformed) => {
            return format!("This time seems to be invalid. Try something like:\n{}", usage);
        }
        Err(e) => return e.to_string(),
    };

    let text = words.join(" ");
    let text = match validate_reminder_text(&text) {
        Ok(text) => text.to_string(),
        Err(e) => return e.to_string(),
    };

    let Some(trigger) = offset.apply(now) else {
        return ReminderOffsetError::TooLate.to_string();
    };

    let reminder = ReminderRecord {
        text,
        trigger_at: trigger.timestamp_millis(),
        author_id: invoker.author_id,
        channel_id: invoker.channel_id,
        is_periodic: periodic,
        offset: periodic.then_some(offset),
    };

    match data.store.add_reminder(reminder).await {
        Ok(id) => {
            info!(
                "Reminder {} set by {} for {} (periodic: {})",
                id, invoker.author_id, trigger, periodic
            );
            "Your reminder has been set!".to_string()
        }
        Err(e) => {
            error!("Failed to save reminder: {}", e);
            build_database_error()
        }
    }
}
