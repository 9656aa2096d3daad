/// Chat platform seam used by commands and sweeps
mod discord;

pub use discord::SerenityTransport;

use async_trait::async_trait;
use poise::serenity_prelude::{ChannelId, GuildId, RoleId, UserId};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("not found")]
    NotFound,
    #[error("missing permissions: {0}")]
    Forbidden(String),
    #[error("chat api error: {0}")]
    Api(String),
}

/// A community member as the core needs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub user_id: UserId,
    pub display_name: String,
    pub roles: Vec<RoleId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInfo {
    pub id: RoleId,
    pub name: String,
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(
        &self,
        channel: ChannelId,
        text: &str,
        image: Option<&Path>,
    ) -> Result<(), TransportError>;

    async fn send_direct(&self, user: UserId, text: &str) -> Result<(), TransportError>;

    /// `None` when the user is not (or no longer) in the community
    async fn fetch_member(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Option<MemberInfo>, TransportError>;

    /// Match a username first, then a nickname (case-insensitive)
    async fn find_member_by_name(
        &self,
        guild: GuildId,
        name: &str,
    ) -> Result<Option<MemberInfo>, TransportError>;

    async fn grant_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), TransportError>;

    async fn revoke_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), TransportError>;

    async fn rename_role(
        &self,
        guild: GuildId,
        role: RoleId,
        name: &str,
        reason: &str,
    ) -> Result<(), TransportError>;

    async fn recolor_role(
        &self,
        guild: GuildId,
        role: RoleId,
        colour: u32,
        reason: &str,
    ) -> Result<(), TransportError>;

    async fn list_roles(&self, guild: GuildId) -> Result<Vec<RoleInfo>, TransportError>;

    /// `false` for missing channels and anything that isn't a text channel
    async fn is_text_channel(&self, channel: ChannelId) -> Result<bool, TransportError>;
}
