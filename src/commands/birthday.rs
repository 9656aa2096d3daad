use chrono::{DateTime, Datelike, Utc};
use poise::serenity_prelude::{GuildId, UserId};
use tracing::{info, warn};

use crate::handlers::DATE_PROMPT;
use crate::models::{BirthdayRecord, Context, Data, Error, OnboardingState};
use crate::utils::datetime::format_date_display;
use crate::utils::message_formatter::mention;
use crate::utils::messages::format_error;
use crate::utils::timezone::{compute_window_in, display_timezone};
use crate::utils::validation::parse_user_mention;

use super::{CommandArgs, Invoker, respond};

const ONBOARDING_INTRO: &str = "Alright, let's configure your birthday notification!\nFirstly, ";

/// Configure your birthday in DMs, or see when someone else's is
#[poise::command(prefix_command)]
pub async fn birthday(ctx: Context<'_>, #[rest] target: Option<String>) -> Result<(), Error> {
    let target = target.unwrap_or_default();
    let reply = birthday_reply(
        ctx.data(),
        &Invoker::from_context(ctx),
        &CommandArgs::new(&target),
    )
    .await;
    respond(ctx, reply).await
}

/// See whose birthday is coming up next
#[poise::command(prefix_command, rename = "nextbirthday")]
pub async fn next_birthday(ctx: Context<'_>) -> Result<(), Error> {
    let reply = next_birthday_reply(ctx.data(), &Invoker::from_context(ctx), Utc::now()).await;
    respond(ctx, Some(reply)).await
}

/// No arguments starts onboarding; otherwise the arguments name a member to look up
pub async fn birthday_reply(
    data: &Data,
    invoker: &Invoker,
    args: &CommandArgs<'_>,
) -> Option<String> {
    if args.args.is_empty() {
        start_onboarding(data, invoker).await
    } else {
        Some(lookup(data, invoker, args).await)
    }
}

async fn start_onboarding(data: &Data, invoker: &Invoker) -> Option<String> {
    let state = data
        .store
        .birthday(invoker.author_id)
        .map(|record| record.onboarding)
        .unwrap_or_default();

    if state == OnboardingState::Done {
        return Some("You've already configured your birthday!".to_string());
    }
    if state.is_pending() {
        return Some("Please finish the configuration process in your DMs first!".to_string());
    }

    let prompt = format!("{}{}", ONBOARDING_INTRO, lowercase_first(DATE_PROMPT));
    if let Err(e) = data.transport.send_direct(invoker.author_id, &prompt).await {
        warn!("Failed to open a DM with {}: {}", invoker.author_id, e);
        return Some(format_error(
            "I can't send you direct messages. Please allow DMs from server members and try again.",
        ));
    }

    let mut record = BirthdayRecord::new(invoker.author_id);
    record.onboarding = OnboardingState::AwaitingDate;
    data.store.insert_birthday(record);
    info!("Started birthday onboarding for {}", invoker.author_id);
    None
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Community used to resolve members by name
async fn lookup_guild(data: &Data, invoker: &Invoker) -> Option<GuildId> {
    match invoker.guild_id {
        Some(guild_id) => Some(guild_id),
        None => data.store.config().await.community_id,
    }
}

async fn lookup(data: &Data, invoker: &Invoker, args: &CommandArgs<'_>) -> String {
    const UNKNOWN: &str = "Sorry, I don't recognise that user at all!";

    let target = match args.args.as_slice() {
        [single] if single.starts_with("<@") => parse_user_mention(single).map(UserId::new),
        _ => {
            let Some(guild_id) = lookup_guild(data, invoker).await else {
                return "Please use this command in a server instead.".to_string();
            };
            match data
                .transport
                .find_member_by_name(guild_id, &args.args.join(" "))
                .await
            {
                Ok(member) => member.map(|m| m.user_id),
                Err(e) => {
                    warn!("Member lookup failed in guild {}: {}", guild_id, e);
                    None
                }
            }
        }
    };

    let Some(user_id) = target else {
        return UNKNOWN.to_string();
    };

    match data.store.birthday(user_id) {
        Some(record) if record.is_done() => match (record.date(), record.timezone) {
            (Some((day, month)), Some(timezone)) => format!(
                "Their birthday will happen on {}, in the {} timezone!",
                format_date_display(month, day),
                display_timezone(&timezone)
            ),
            _ => "That person hasn't configured their birthday yet.".to_string(),
        },
        _ => "That person hasn't configured their birthday yet.".to_string(),
    }
}

/// Start of the record's next window at or after `now`, in UTC milliseconds
fn next_occurrence(record: &BirthdayRecord, now: DateTime<Utc>) -> Option<i64> {
    let now_ms = now.timestamp_millis();
    if let Some(window) = record.window
        && window.start >= now_ms
    {
        return Some(window.start);
    }
    let (day, month) = record.date()?;
    let timezone = record.timezone.as_deref()?;
    [now.year(), now.year() + 1]
        .into_iter()
        .filter_map(|year| compute_window_in(day, month, timezone, year).ok())
        .map(|window| window.start)
        .find(|start| *start >= now_ms)
}

/// Announce whose birthday comes next across every configured member
pub async fn next_birthday_reply(data: &Data, invoker: &Invoker, now: DateTime<Utc>) -> String {
    let next = data
        .store
        .birthdays()
        .into_iter()
        .filter(BirthdayRecord::is_done)
        .filter_map(|record| next_occurrence(&record, now).map(|start| (start, record)))
        .min_by_key(|(start, _)| *start);

    let Some((_, record)) = next else {
        return "I have no upcoming birthdays configured.".to_string();
    };
    let (Some((day, month)), Some(timezone)) = (record.date(), record.timezone.as_deref()) else {
        return "I have no upcoming birthdays configured.".to_string();
    };

    let name = match lookup_guild(data, invoker).await {
        Some(guild_id) => match data.transport.fetch_member(guild_id, record.user_id).await {
            Ok(Some(member)) => member.display_name,
            Ok(None) => mention(record.user_id.get()),
            Err(e) => {
                warn!("Failed to fetch member {}: {}", record.user_id, e);
                mention(record.user_id.get())
            }
        },
        None => mention(record.user_id.get()),
    };

    format!(
        "The next birthday is that of {}. It will happen on {}, in the {} timezone.",
        name,
        format_date_display(month, day),
        display_timezone(timezone)
    )
}
