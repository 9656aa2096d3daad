use chrono::{DateTime, Datelike, Utc};
use poise::serenity_prelude::{ChannelId, GuildId, UserId};
use tracing::{error, info, warn};

use crate::database::StoreError;
use crate::models::{
    BirthdayRecord, Configuration, Data, Error, Gender, RoleLifecycleState,
};
use crate::transport::{MemberInfo, TransportError};
use crate::utils::datetime::is_new_years_day;
use crate::utils::message_formatter::render_announcement;
use crate::utils::role_logic::{
    BADGE_ROLE_NAME, LifecycleAction, advance_badge_index, current_badge_index,
    determine_lifecycle_action, find_held_role,
};
use crate::utils::timezone::compute_window_in;

const MISSING_PERMISSIONS: &str =
    "I was going to announce a birthday but it seems I'm missing role permissions.";

/// Whether windows are stale: the stored year is behind and it is January 1st (UTC)
pub fn should_recalculate(config: &Configuration, now: DateTime<Utc>) -> bool {
    config
        .last_calculated_year
        .is_none_or(|year| year < now.year())
        && is_new_years_day(now)
}

/// Yearly sweep: recompute every window once the year rolls over
pub async fn run_yearly_recompute(data: &Data, now: DateTime<Utc>) -> Result<(), Error> {
    let config = data.store.config().await;
    if !config.is_complete() || !should_recalculate(&config, now) {
        return Ok(());
    }
    let count = recalculate_windows(data, now).await?;
    info!("Recomputed {} birthday windows for {}", count, now.year());
    Ok(())
}

/// Recompute the window of every record with a date and timezone for the current year.
///
/// Windows already over are marked announced so they aren't celebrated late.
/// Records still holding birthday roles keep their window until the badge is
/// taken back, at which point [`refresh_window`] rolls them forward.
pub async fn recalculate_windows(data: &Data, now: DateTime<Utc>) -> Result<usize, StoreError> {
    let year = now.year();
    let mut count = 0;

    for record in data.store.birthdays() {
        if record.role_state != RoleLifecycleState::None {
            info!(
                "Keeping the window of {} until its birthday roles are removed",
                record.user_id
            );
            continue;
        }
        if refresh_window(data, &record, year, now) {
            data.store.save_birthday(record.user_id).await?;
            count += 1;
        }
    }

    data.store
        .update_config(|config| config.last_calculated_year = Some(year))
        .await;
    data.store.save_config().await?;
    Ok(count)
}

/// Move a record's window to `year`, returning whether it had a date and timezone
fn refresh_window(data: &Data, record: &BirthdayRecord, year: i32, now: DateTime<Utc>) -> bool {
    let (Some((day, month)), Some(timezone)) = (record.date(), record.timezone.as_deref()) else {
        return false;
    };
    let window = match compute_window_in(day, month, timezone, year) {
        Ok(window) => window,
        Err(e) => {
            warn!("Skipping window for {}: {}", record.user_id, e);
            return false;
        }
    };
    let now_ms = now.timestamp_millis();
    data.store.update_birthday(record.user_id, |r| {
        r.window = Some(window);
        r.announced = window.end < now_ms;
    });
    true
}

/// Quarter-hourly sweep, only while announcements are enabled and configured
pub async fn run_birthday_sweep(data: &Data, now: DateTime<Utc>) -> Result<(), Error> {
    if !data.store.config().await.can_announce() {
        return Ok(());
    }
    announce_birthdays(data, now).await
}

/// Announce birthdays that started and walk expired roles back, one member at a time
pub async fn announce_birthdays(data: &Data, now: DateTime<Utc>) -> Result<(), Error> {
    let config = data.store.config().await;
    let (Some(guild_id), Some(channel_id)) = (config.community_id, config.announcement_channel_id)
    else {
        return Ok(());
    };
    let now_ms = now.timestamp_millis();

    for user_id in data.store.birthday_ids() {
        let Some(record) = data.store.birthday(user_id).filter(BirthdayRecord::is_done) else {
            continue;
        };
        let Some(window) = record.window else {
            continue;
        };

        let action = determine_lifecycle_action(record.announced, record.role_state, &window, now_ms);
        if action == LifecycleAction::NoAction {
            continue;
        }

        let member = match data.transport.fetch_member(guild_id, user_id).await {
            Ok(Some(member)) => member,
            Ok(None) => {
                info!("Skipping {} who is no longer in guild {}", user_id, guild_id);
                continue;
            }
            Err(e) => {
                warn!("Failed to fetch member {}: {}", user_id, e);
                continue;
            }
        };

        match action {
            LifecycleAction::Announce => {
                announce_birthday(data, guild_id, channel_id, &member, record.gender).await
            }
            LifecycleAction::RevokeTitle => revoke_title_role(data, guild_id, &member).await,
            LifecycleAction::RevokeBadge => revoke_badge_role(data, guild_id, &member, now).await,
            LifecycleAction::NoAction => {}
        }
    }
    Ok(())
}

async fn save_record(data: &Data, user_id: UserId) {
    if let Err(e) = data.store.save_birthday(user_id).await {
        error!("Failed to save birthday record {}: {}", user_id, e);
    }
}

async fn announce_birthday(
    data: &Data,
    guild_id: GuildId,
    channel_id: ChannelId,
    member: &MemberInfo,
    gender: Option<Gender>,
) {
    let user_id = member.user_id;
    if let Err(e) = grant_birthday_roles(data, guild_id, user_id, gender).await {
        warn!("Failed to grant birthday roles to {}: {}", user_id, e);
        if let Err(e) = data
            .transport
            .send_message(channel_id, MISSING_PERMISSIONS, None)
            .await
        {
            warn!("Failed to report missing permissions in {}: {}", channel_id, e);
        }
        return;
    }

    data.store.update_birthday(user_id, |r| r.announced = true);
    save_record(data, user_id).await;

    let Some(template) = data.store.config().await.announcement_template else {
        return;
    };
    let text = render_announcement(&template, user_id.get());
    let image = data.images.random();
    match data.transport.send_message(channel_id, &text, image).await {
        Ok(()) => info!("Announced the birthday of {}", user_id),
        Err(e) => warn!("Failed to announce the birthday of {}: {}", user_id, e),
    }
}

/// Grant the title role for `gender` and the next badge from the pool
async fn grant_birthday_roles(
    data: &Data,
    guild_id: GuildId,
    user_id: UserId,
    gender: Option<Gender>,
) -> Result<(), TransportError> {
    let config = data.store.config().await;
    let index = current_badge_index(config.last_role_index_used, config.badge_role_ids.len());
    let title = config
        .title_role_ids
        .get(gender.unwrap_or(Gender::Other).title_index())
        .copied()
        .ok_or(TransportError::NotFound)?;
    let badge = config
        .badge_role_ids
        .get(index)
        .copied()
        .ok_or(TransportError::NotFound)?;

    data.transport
        .grant_role(guild_id, user_id, title, "Static birthday role.")
        .await?;
    data.transport
        .grant_role(guild_id, user_id, badge, "Editable birthday role.")
        .await?;
    if let Err(e) = data
        .transport
        .rename_role(
            guild_id,
            badge,
            BADGE_ROLE_NAME,
            "Resetting the editable birthday role name.",
        )
        .await
    {
        warn!("Failed to reset the name of badge role {}: {}", badge, e);
    }

    data.store
        .update_birthday(user_id, |r| r.role_state = RoleLifecycleState::Given);
    data.store
        .update_config(|c| c.last_role_index_used = advance_badge_index(index, c.badge_role_ids.len()))
        .await;
    if let Err(e) = data.store.save_config().await {
        error!("Failed to save badge cursor: {}", e);
    }
    Ok(())
}

async fn revoke_title_role(data: &Data, guild_id: GuildId, member: &MemberInfo) {
    let user_id = member.user_id;
    data.store
        .update_birthday(user_id, |r| r.role_state = RoleLifecycleState::ExpiringPrimary);

    let titles = data.store.config().await.title_role_ids;
    let result = match find_held_role(&member.roles, &titles) {
        Some(role) => {
            data.transport
                .revoke_role(guild_id, user_id, role, "Birthday ended.")
                .await
        }
        None => Ok(()),
    };

    match result {
        Ok(()) => {
            data.store
                .update_birthday(user_id, |r| r.role_state = RoleLifecycleState::ExpiringSecondary);
            info!("Removed the birthday title role of {}", user_id);
        }
        Err(e) => warn!("Failed to remove the title role of {}, retrying next sweep: {}", user_id, e),
    }
    save_record(data, user_id).await;
}

async fn revoke_badge_role(
    data: &Data,
    guild_id: GuildId,
    member: &MemberInfo,
    now: DateTime<Utc>,
) {
    let user_id = member.user_id;
    let badges = data.store.config().await.badge_role_ids;
    let result = match find_held_role(&member.roles, &badges) {
        Some(role) => {
            data.transport
                .revoke_role(guild_id, user_id, role, "Birthday role period ended.")
                .await
        }
        None => Ok(()),
    };

    match result {
        Ok(()) => {
            data.store
                .update_birthday(user_id, |r| r.role_state = RoleLifecycleState::None);
            // The yearly recompute skipped this record while roles were held
            if let Some(record) = data.store.birthday(user_id) {
                refresh_window(data, &record, now.year(), now);
            }
            save_record(data, user_id).await;
            info!("Removed the birthday badge role of {}", user_id);
        }
        Err(e) => warn!("Failed to remove the badge role of {}, retrying next sweep: {}", user_id, e),
    }
}
