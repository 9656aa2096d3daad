use chrono::{DateTime, Datelike, Utc};
use tracing::{error, info, warn};

use crate::models::{Context, Data, Error};
use crate::schedule::{announce_birthdays, recalculate_windows, run_reminder_sweep};
use crate::utils::messages::{build_database_error, format_error, format_success};

use super::respond;

/// List the commands
#[poise::command(prefix_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    respond(ctx, Some(help_text(ctx.data()))).await
}

/// Run the birthday announcements now
#[poise::command(prefix_command, owners_only, rename = "checkbdays")]
pub async fn check_birthdays(ctx: Context<'_>) -> Result<(), Error> {
    let reply = check_birthdays_reply(ctx.data(), Utc::now()).await;
    respond(ctx, Some(reply)).await
}

/// Send the reminders that are due now
#[poise::command(prefix_command, owners_only, rename = "checkreminders")]
pub async fn check_reminders(ctx: Context<'_>) -> Result<(), Error> {
    let reply = check_reminders_reply(ctx.data(), Utc::now()).await;
    respond(ctx, Some(reply)).await
}

/// Recompute every birthday window for this year
#[poise::command(prefix_command, owners_only)]
pub async fn recalculate(ctx: Context<'_>) -> Result<(), Error> {
    let reply = recalculate_reply(ctx.data(), Utc::now()).await;
    respond(ctx, Some(reply)).await
}

/// Reload every record from the database
#[poise::command(prefix_command, owners_only)]
pub async fn load(ctx: Context<'_>) -> Result<(), Error> {
    let reply = load_reply(ctx.data(), Utc::now()).await;
    respond(ctx, Some(reply)).await
}

/// Write every record to the database
#[poise::command(prefix_command, owners_only)]
pub async fn save(ctx: Context<'_>) -> Result<(), Error> {
    let reply = save_reply(ctx.data()).await;
    respond(ctx, Some(reply)).await
}

/// Forget members who left the server
#[poise::command(prefix_command, owners_only)]
pub async fn cleanup(ctx: Context<'_>) -> Result<(), Error> {
    let reply = cleanup_reply(ctx.data()).await;
    respond(ctx, Some(reply)).await
}

/// List the commands by audience
pub fn help_text(data: &Data) -> String {
    let p = &data.settings.prefix;
    format!(
        "**Birthday commands**\n\
         `{p}birthday` - configure your birthday in DMs\n\
         `{p}birthday @user` - see when someone's birthday is\n\
         `{p}nextbirthday` - see whose birthday is coming up next\n\
         `{p}rolename name` / `{p}rolecolor #hex` - edit your birthday role during your birthday\n\
         `{p}reminder 1d2h text` - get pinged here later\n\n\
         **Administrator commands**\n\
         `{p}message`, `{p}channel`, `{p}roles` - configure announcements\n\
         `{p}enable` / `{p}disable` - switch announcements on or off\n\
         `{p}periodicreminder 7d text` - a reminder that repeats"
    )
}

/// Run the announce sweep now, even while announcements are disabled
pub async fn check_birthdays_reply(data: &Data, now: DateTime<Utc>) -> String {
    if !data.store.config().await.is_complete() {
        return format_error("I cannot do this because some configurations are missing.");
    }
    match announce_birthdays(data, now).await {
        Ok(()) => format_success("Birthday check finished."),
        Err(e) => {
            warn!("Manual birthday check failed: {}", e);
            format_error("The birthday check failed, see the logs for details.")
        }
    }
}

pub async fn check_reminders_reply(data: &Data, now: DateTime<Utc>) -> String {
    match run_reminder_sweep(data, now).await {
        Ok(()) => format_success("Reminder check finished."),
        Err(e) => {
            warn!("Manual reminder check failed: {}", e);
            format_error("The reminder check failed, see the logs for details.")
        }
    }
}

/// Recompute every window for the current year
pub async fn recalculate_reply(data: &Data, now: DateTime<Utc>) -> String {
    match recalculate_windows(data, now).await {
        Ok(count) => format_success(&format!("Recalculated {} birthday window(s).", count)),
        Err(e) => {
            error!("Failed to recalculate windows: {}", e);
            build_database_error()
        }
    }
}

/// Replace in-memory records with what persistence holds
pub async fn load_reply(data: &Data, now: DateTime<Utc>) -> String {
    match data.store.load(now.year()).await {
        Ok(()) => format_success("Reloaded all records."),
        Err(e) => {
            error!("Failed to reload records: {}", e);
            build_database_error()
        }
    }
}

pub async fn save_reply(data: &Data) -> String {
    match data.store.save_all().await {
        Ok(()) => format_success("Saved all records."),
        Err(e) => {
            error!("Failed to save records: {}", e);
            build_database_error()
        }
    }
}

/// Delete the records of members who left the community
pub async fn cleanup_reply(data: &Data) -> String {
    let Some(guild_id) = data.store.config().await.community_id else {
        return format_error("I cannot do this because some configurations are missing.");
    };

    let mut removed = 0;
    for user_id in data.store.birthday_ids() {
        match data.transport.fetch_member(guild_id, user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                if let Err(e) = data.store.delete_birthday(user_id).await {
                    error!("Failed to delete birthday record {}: {}", user_id, e);
                    return build_database_error();
                }
                removed += 1;
            }
            Err(e) => warn!("Failed to fetch member {}, keeping record: {}", user_id, e),
        }
    }
    info!("Cleanup removed {} birthday records", removed);
    format_success(&format!("Removed {} record(s) of members who left.", removed))
}
