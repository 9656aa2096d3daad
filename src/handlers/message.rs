use chrono::{DateTime, Utc};
use poise::serenity_prelude::{GuildId, Message, UserId};

use crate::models::Data;

use super::onboarding::handle_onboarding_reply;

/// A chat message reduced to what the dialogue needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub author_id: UserId,
    /// `None` for direct messages
    pub guild_id: Option<GuildId>,
    pub text: String,
}

impl InboundMessage {
    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }
}

/// Handle a message created event
pub async fn handle_message(message: &Message, data: &Data) {
    if message.author.bot {
        return;
    }

    let inbound = InboundMessage {
        author_id: message.author.id,
        guild_id: message.guild_id,
        text: message.content.clone(),
    };

    route_message(data, &inbound, Utc::now()).await;
}

/// Feed non-command direct messages to the author's dialogue.
///
/// Prefixed messages belong to the command framework, even mid-dialogue.
async fn route_message(data: &Data, message: &InboundMessage, now: DateTime<Utc>) {
    if message.text.starts_with(&data.settings.prefix) || !message.is_direct() {
        return;
    }
    handle_onboarding_reply(data, message.author_id, &message.text, now).await;
}
