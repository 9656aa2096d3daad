use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::models::{Data, Error};
use crate::utils::message_formatter::render_reminder;

/// Fire every due reminder; periodic ones are renewed, one-off ones deleted
pub async fn run_reminder_sweep(data: &Data, now: DateTime<Utc>) -> Result<(), Error> {
    let now_ms = now.timestamp_millis();

    for (id, reminder) in data.store.reminders() {
        if reminder.trigger_at > now_ms {
            continue;
        }

        match data.transport.is_text_channel(reminder.channel_id).await {
            Ok(true) => {}
            Ok(false) => {
                info!(
                    "Dropping reminder {} for missing channel {}",
                    id, reminder.channel_id
                );
                delete_reminder(data, &id).await;
                continue;
            }
            Err(e) => {
                warn!("Failed to resolve channel {}: {}", reminder.channel_id, e);
                continue;
            }
        }

        let text = render_reminder(reminder.author_id.get(), &reminder.text);
        if let Err(e) = data
            .transport
            .send_message(reminder.channel_id, &text, None)
            .await
        {
            warn!("Failed to deliver reminder {}, keeping it: {}", id, e);
            continue;
        }

        let next = reminder
            .offset
            .as_ref()
            .filter(|_| reminder.is_periodic)
            .and_then(|offset| offset.next_trigger(now));

        match next {
            Some(next) => {
                data.store
                    .update_reminder(&id, |r| r.trigger_at = next.timestamp_millis());
                if let Err(e) = data.store.save_reminder(&id).await {
                    error!("Failed to save renewed reminder {}: {}", id, e);
                }
            }
            None => delete_reminder(data, &id).await,
        }
    }
    Ok(())
}

async fn delete_reminder(data: &Data, id: &str) {
    if let Err(e) = data.store.delete_reminder(id).await {
        error!("Failed to delete reminder {}: {}", id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReminderRecord;
    use crate::test_utils::{ANNOUNCE_CHANNEL, Call, MEMBER, at, test_data};
    use crate::utils::schedule_utils::ReminderOffset;
    use poise::serenity_prelude::ChannelId;

    fn reminder(trigger: DateTime<Utc>, periodic: bool) -> ReminderRecord {
        ReminderRecord {
            text: "Stand-up time".to_string(),
            trigger_at: trigger.timestamp_millis(),
            author_id: MEMBER,
            channel_id: ANNOUNCE_CHANNEL,
            is_periodic: periodic,
            offset: periodic.then(|| ReminderOffset::parse("1d").unwrap()),
        }
    }

    #[tokio::test]
    async fn test_due_one_off_reminder_fires_once() {
        let (data, transport, _) = test_data();
        data.store
            .add_reminder(reminder(at(2026, 3, 1, 9, 0), false))
            .await
            .unwrap();

        run_reminder_sweep(&data, at(2026, 3, 1, 8, 59)).await.unwrap();
        assert!(transport.calls().is_empty());

        run_reminder_sweep(&data, at(2026, 3, 1, 9, 0)).await.unwrap();
        assert_eq!(
            transport.calls(),
            vec![Call::Send {
                channel: ANNOUNCE_CHANNEL,
                text: "<@5> Stand-up time".to_string(),
                image: None,
            }]
        );
        assert!(data.store.reminders().is_empty());
    }

    #[tokio::test]
    async fn test_periodic_reminder_is_renewed() {
        let (data, transport, _) = test_data();
        let id = data
            .store
            .add_reminder(reminder(at(2026, 3, 1, 9, 0), true))
            .await
            .unwrap();

        let fired = at(2026, 3, 1, 9, 0);
        run_reminder_sweep(&data, fired).await.unwrap();

        assert_eq!(transport.sent_texts().len(), 1);
        let reminders = data.store.reminders();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].0, id);
        assert_eq!(
            reminders[0].1.trigger_at,
            at(2026, 3, 2, 9, 0).timestamp_millis() - 5_000
        );
    }

    #[tokio::test]
    async fn test_reminder_for_deleted_channel_is_dropped() {
        let (data, transport, _) = test_data();
        let mut orphan = reminder(at(2026, 3, 1, 9, 0), false);
        orphan.channel_id = ChannelId::new(404);
        data.store.add_reminder(orphan).await.unwrap();

        run_reminder_sweep(&data, at(2026, 3, 1, 9, 15)).await.unwrap();

        assert!(transport.calls().is_empty());
        assert!(data.store.reminders().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delete_does_not_stop_the_sweep() {
        let (data, transport, nodes) = test_data();
        let mut orphan = reminder(at(2026, 3, 1, 8, 0), false);
        orphan.channel_id = ChannelId::new(404);
        data.store.add_reminder(orphan).await.unwrap();
        data.store
            .add_reminder(reminder(at(2026, 3, 1, 9, 0), false))
            .await
            .unwrap();
        data.store
            .add_reminder(reminder(at(2026, 3, 1, 9, 5), false))
            .await
            .unwrap();
        nodes.set_fail_deletes(true);

        run_reminder_sweep(&data, at(2026, 3, 1, 9, 15)).await.unwrap();

        assert_eq!(transport.sent_texts().len(), 2);
        assert!(data.store.reminders().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_reminder() {
        let (data, transport, _) = test_data();
        transport.set_fail_sends(true);
        data.store
            .add_reminder(reminder(at(2026, 3, 1, 9, 0), false))
            .await
            .unwrap();

        run_reminder_sweep(&data, at(2026, 3, 1, 9, 15)).await.unwrap();
        assert_eq!(data.store.reminders().len(), 1);
    }
}
