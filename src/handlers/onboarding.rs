use chrono::{DateTime, Datelike, Timelike, Utc};
use poise::serenity_prelude::UserId;
use tracing::{debug, error, info, warn};

use crate::models::{BirthdayRecord, Data, Gender, OnboardingState};
use crate::utils::datetime::{format_clock, format_date_display, parse_birth_date, parse_clock_time};
use crate::utils::messages::build_database_error;
use crate::utils::timezone::{TimezoneTable, compute_window, display_timezone};
use crate::utils::validation::parse_yes_no;

pub const INVALID_REPLY: &str = "Sorry, I didn't quite understand that. Could you please try again?";

pub const DATE_PROMPT: &str = "What's your birth **day** and **month**?\n\n\
    Please answer in a format like `30/1` or `July 20`.";

pub const TIME_PROMPT: &str = "Good! Now, I need to know your timezone.\n\
    What time is it **right now** where you live?\n\n\
    Please answer in a format like `14:25` or `5:40 pm`.";

pub const TIME_RETRY_PROMPT: &str = "I need to know your timezone.\n\n\
    Please answer in a format like `14:25` or `5:40 pm`.";

pub const GENDER_PROMPT: &str = "Finally, what's your gender?\n\
    I accept the answers **male**, **female** and **other**.";

pub const GENDER_RETRY_PROMPT: &str = "What's your gender?\n\
    I accept the answers **male**, **female** and **other**.";

pub const FINISHED_REPLY: &str = "You're all set! I'll try to notify everyone when it's your birthday.";

const CONFIRM_SUFFIX: &str = "\nPlease answer yes or no to confirm.";

/// Result of feeding one message to the dialogue
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub record: BirthdayRecord,
    pub reply: String,
    /// The record just reached `Done`
    pub finished: bool,
}

impl StepOutcome {
    fn stay(record: &BirthdayRecord) -> Self {
        Self {
            record: record.clone(),
            reply: INVALID_REPLY.to_string(),
            finished: false,
        }
    }

    fn moved(record: BirthdayRecord, reply: impl Into<String>) -> Self {
        Self {
            record,
            reply: reply.into(),
            finished: false,
        }
    }
}

/// Advance one user's dialogue by one message.
///
/// Returns `None` when the record isn't mid-dialogue.
pub fn advance(
    record: &BirthdayRecord,
    text: &str,
    now: DateTime<Utc>,
    timezones: &TimezoneTable,
) -> Option<StepOutcome> {
    let mut next = record.clone();

    let outcome = match record.onboarding {
        OnboardingState::None | OnboardingState::Done => return None,

        OnboardingState::AwaitingDate => match parse_birth_date(text) {
            Some((day, month)) => {
                next.day = Some(day);
                next.month = Some(month);
                next.onboarding = OnboardingState::ConfirmingDate;
                let reply = format!(
                    "Okay, so it's {}?{}",
                    format_date_display(month, day),
                    CONFIRM_SUFFIX
                );
                StepOutcome::moved(next, reply)
            }
            None => StepOutcome::stay(record),
        },

        OnboardingState::ConfirmingDate => match parse_yes_no(text) {
            Some(true) => {
                next.onboarding = OnboardingState::AwaitingTime;
                StepOutcome::moved(next, TIME_PROMPT)
            }
            Some(false) => {
                next.onboarding = OnboardingState::AwaitingDate;
                StepOutcome::moved(next, DATE_PROMPT)
            }
            None => StepOutcome::stay(record),
        },

        OnboardingState::AwaitingTime => {
            let resolved = parse_clock_time(text).and_then(|clock| {
                let (day, month) = record.date()?;
                let entry = timezones.infer(clock.hour, clock.minute, now)?;
                let window = compute_window(day, month, &entry.tz, now.year()).ok()?;
                Some((clock, entry, window))
            });
            match resolved {
                Some((clock, entry, window)) => {
                    debug!(
                        "Inferred timezone {} (UTC offset {} minutes) for user {}",
                        entry.name,
                        entry.offset_minutes(now),
                        record.user_id
                    );
                    let local = now.with_timezone(&entry.tz);
                    next.timezone = Some(entry.name.to_string());
                    next.window = Some(window);
                    next.announced = window.end < now.timestamp_millis();
                    next.twelve_hour_clock = clock.twelve_hour;
                    next.onboarding = OnboardingState::ConfirmingTime;
                    let reply = format!(
                        "It seems you're in the **{}** timezone. It's {} there right now.{}",
                        display_timezone(entry.name),
                        format_clock(local.hour(), local.minute(), clock.twelve_hour),
                        CONFIRM_SUFFIX
                    );
                    StepOutcome::moved(next, reply)
                }
                None => StepOutcome::stay(record),
            }
        }

        OnboardingState::ConfirmingTime => match parse_yes_no(text) {
            Some(true) => {
                next.onboarding = OnboardingState::AwaitingGender;
                StepOutcome::moved(next, GENDER_PROMPT)
            }
            Some(false) => {
                next.onboarding = OnboardingState::AwaitingTime;
                StepOutcome::moved(next, TIME_RETRY_PROMPT)
            }
            None => StepOutcome::stay(record),
        },

        OnboardingState::AwaitingGender => {
            let gender = Gender::classify(text);
            next.gender = Some(gender);
            next.onboarding = OnboardingState::ConfirmingGender;
            let reply = format!("Okay, so your gender is {}?{}", gender.label(), CONFIRM_SUFFIX);
            StepOutcome::moved(next, reply)
        }

        OnboardingState::ConfirmingGender => match parse_yes_no(text) {
            Some(true) => {
                next.onboarding = OnboardingState::Done;
                StepOutcome {
                    record: next,
                    reply: FINISHED_REPLY.to_string(),
                    finished: true,
                }
            }
            Some(false) => {
                next.onboarding = OnboardingState::AwaitingGender;
                StepOutcome::moved(next, GENDER_RETRY_PROMPT)
            }
            None => StepOutcome::stay(record),
        },
    };

    Some(outcome)
}

/// Route a direct message to the author's pending dialogue.
///
/// Returns `false` when the author has nothing pending.
pub async fn handle_onboarding_reply(
    data: &Data,
    user_id: UserId,
    text: &str,
    now: DateTime<Utc>,
) -> bool {
    let Some(record) = data.store.birthday(user_id) else {
        return false;
    };
    let Some(outcome) = advance(&record, text, now, &data.timezones) else {
        return false;
    };

    let mut reply = outcome.reply;
    data.store.insert_birthday(outcome.record);

    if outcome.finished {
        if let Err(e) = data.store.save_birthday(user_id).await {
            error!("Failed to save birthday for user {}: {}", user_id, e);
            reply = build_database_error();
        } else {
            info!("User {} finished configuring their birthday", user_id);
        }
    }

    if let Err(e) = data.transport.send_direct(user_id, &reply).await {
        warn!("Failed to reply to user {} in DMs: {}", user_id, e);
    }
    true
}
