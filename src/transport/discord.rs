use async_trait::async_trait;
use serenity::builder::{CreateAttachment, CreateMessage, EditRole};
use serenity::http::{Http, HttpError};
use serenity::model::channel::{Channel, ChannelType};
use serenity::model::guild::Member;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use std::path::Path;
use std::sync::Arc;

use super::{ChatTransport, MemberInfo, RoleInfo, TransportError};

/// Page size when listing community members
const MEMBER_PAGE_SIZE: u64 = 1000;

/// [`ChatTransport`] backed by the serenity HTTP client
#[derive(Clone)]
pub struct SerenityTransport {
    http: Arc<Http>,
}

impl SerenityTransport {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn http(&self) -> &Http {
        &self.http
    }
}

impl From<serenity::Error> for TransportError {
    fn from(e: serenity::Error) -> Self {
        if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &e {
            match response.status_code.as_u16() {
                404 => return TransportError::NotFound,
                403 => return TransportError::Forbidden(response.error.message.clone()),
                _ => {}
            }
        }
        TransportError::Api(e.to_string())
    }
}

fn member_info(member: &Member) -> MemberInfo {
    MemberInfo {
        user_id: member.user.id,
        display_name: member.display_name().to_string(),
        roles: member.roles.clone(),
    }
}

/// Treat a 404 as an absent entity
fn optional<T>(result: Result<T, serenity::Error>) -> Result<Option<T>, TransportError> {
    match result.map_err(TransportError::from) {
        Ok(value) => Ok(Some(value)),
        Err(TransportError::NotFound) => Ok(None),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl ChatTransport for SerenityTransport {
    async fn send_message(
        &self,
        channel: ChannelId,
        text: &str,
        image: Option<&Path>,
    ) -> Result<(), TransportError> {
        let mut message = CreateMessage::new().content(text);
        if let Some(path) = image {
            message = message.add_file(CreateAttachment::path(path).await?);
        }
        channel.send_message(self.http(), message).await?;
        Ok(())
    }

    async fn send_direct(&self, user: UserId, text: &str) -> Result<(), TransportError> {
        let dm = user.create_dm_channel(self.http()).await?;
        dm.send_message(self.http(), CreateMessage::new().content(text))
            .await?;
        Ok(())
    }

    async fn fetch_member(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Option<MemberInfo>, TransportError> {
        let member = optional(guild.member(self.http(), user).await)?;
        Ok(member.as_ref().map(member_info))
    }

    async fn find_member_by_name(
        &self,
        guild: GuildId,
        name: &str,
    ) -> Result<Option<MemberInfo>, TransportError> {
        let name = name.to_lowercase();
        let mut members: Vec<Member> = Vec::new();
        let mut after: Option<UserId> = None;
        loop {
            let page = guild
                .members(self.http(), Some(MEMBER_PAGE_SIZE), after)
                .await?;
            let full_page = page.len() as u64 == MEMBER_PAGE_SIZE;
            after = page.last().map(|m| m.user.id);
            members.extend(page);
            if !full_page {
                break;
            }
        }

        let found = members
            .iter()
            .find(|m| m.user.name.to_lowercase() == name)
            .or_else(|| {
                members
                    .iter()
                    .find(|m| m.nick.as_ref().is_some_and(|nick| nick.to_lowercase() == name))
            });
        Ok(found.map(member_info))
    }

    async fn grant_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), TransportError> {
        self.http
            .add_member_role(guild, user, role, Some(reason))
            .await?;
        Ok(())
    }

    async fn revoke_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), TransportError> {
        self.http
            .remove_member_role(guild, user, role, Some(reason))
            .await?;
        Ok(())
    }

    async fn rename_role(
        &self,
        guild: GuildId,
        role: RoleId,
        name: &str,
        reason: &str,
    ) -> Result<(), TransportError> {
        let edit = EditRole::new().name(name).audit_log_reason(reason);
        guild.edit_role(self.http(), role, edit).await?;
        Ok(())
    }

    async fn recolor_role(
        &self,
        guild: GuildId,
        role: RoleId,
        colour: u32,
        reason: &str,
    ) -> Result<(), TransportError> {
        let edit = EditRole::new().colour(colour).audit_log_reason(reason);
        guild.edit_role(self.http(), role, edit).await?;
        Ok(())
    }

    async fn list_roles(&self, guild: GuildId) -> Result<Vec<RoleInfo>, TransportError> {
        let mut roles: Vec<_> = guild.roles(self.http()).await?.into_values().collect();
        roles.sort_by_key(|role| (role.position, role.id));
        Ok(roles
            .into_iter()
            .map(|role| RoleInfo {
                id: role.id,
                name: role.name,
            })
            .collect())
    }

    async fn is_text_channel(&self, channel: ChannelId) -> Result<bool, TransportError> {
        let channel = optional(channel.to_channel(self.http()).await)?;
        Ok(matches!(
            channel,
            Some(Channel::Guild(ref gc)) if gc.kind == ChannelType::Text
        ))
    }
}
