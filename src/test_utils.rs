use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use poise::serenity_prelude::{ChannelId, GuildId, RoleId, UserId};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::commands::Invoker;
use crate::database::MemoryStore;
use crate::models::{Data, ImagePool, Settings};
use crate::services::BirthdayStore;
use crate::transport::{ChatTransport, MemberInfo, RoleInfo, TransportError};
use crate::utils::timezone::TimezoneTable;

pub const GUILD: GuildId = GuildId::new(900);
pub const ANNOUNCE_CHANNEL: ChannelId = ChannelId::new(901);
pub const OWNER: UserId = UserId::new(1);
pub const MEMBER: UserId = UserId::new(5);
pub const CHANNEL: ChannelId = ChannelId::new(77);

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send { channel: ChannelId, text: String, image: Option<PathBuf> },
    Direct { user: UserId, text: String },
    Grant { user: UserId, role: RoleId },
    Revoke { user: UserId, role: RoleId },
    Rename { role: RoleId, name: String },
    Recolor { role: RoleId, colour: u32 },
}

/// Recording transport with scriptable members, roles and failures
#[derive(Default)]
pub struct FakeTransport {
    pub calls: Mutex<Vec<Call>>,
    pub members: Mutex<HashMap<UserId, MemberInfo>>,
    pub roles: Mutex<Vec<RoleInfo>>,
    pub text_channels: Mutex<HashSet<ChannelId>>,
    pub fail_role_changes: Mutex<bool>,
    pub fail_sends: Mutex<bool>,
}

impl FakeTransport {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.add_text_channel(ANNOUNCE_CHANNEL);
        fake
    }

    pub fn add_member(&self, user: UserId, name: &str) {
        self.members.lock().unwrap().insert(
            user,
            MemberInfo {
                user_id: user,
                display_name: name.to_string(),
                roles: Vec::new(),
            },
        );
    }

    pub fn add_role(&self, id: u64, name: &str) {
        self.roles.lock().unwrap().push(RoleInfo {
            id: RoleId::new(id),
            name: name.to_string(),
        });
    }

    pub fn add_text_channel(&self, channel: ChannelId) {
        self.text_channels.lock().unwrap().insert(channel);
    }

    pub fn set_fail_role_changes(&self, fail: bool) {
        *self.fail_role_changes.lock().unwrap() = fail;
    }

    pub fn set_fail_sends(&self, fail: bool) {
        *self.fail_sends.lock().unwrap() = fail;
    }

    pub fn member_roles(&self, user: UserId) -> Vec<RoleId> {
        self.members
            .lock()
            .unwrap()
            .get(&user)
            .map(|m| m.roles.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send { text, .. } | Call::Direct { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Last text sent anywhere
    pub fn last_text(&self) -> String {
        self.sent_texts().pop().unwrap_or_default()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_roles(&self) -> Result<(), TransportError> {
        if *self.fail_role_changes.lock().unwrap() {
            return Err(TransportError::Forbidden("Missing Permissions".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn send_message(
        &self,
        channel: ChannelId,
        text: &str,
        image: Option<&Path>,
    ) -> Result<(), TransportError> {
        if *self.fail_sends.lock().unwrap() {
            return Err(TransportError::Api("send failed".to_string()));
        }
        self.record(Call::Send {
            channel,
            text: text.to_string(),
            image: image.map(Path::to_path_buf),
        });
        Ok(())
    }

    async fn send_direct(&self, user: UserId, text: &str) -> Result<(), TransportError> {
        if *self.fail_sends.lock().unwrap() {
            return Err(TransportError::Forbidden("cannot message this user".to_string()));
        }
        self.record(Call::Direct {
            user,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn fetch_member(
        &self,
        _guild: GuildId,
        user: UserId,
    ) -> Result<Option<MemberInfo>, TransportError> {
        Ok(self.members.lock().unwrap().get(&user).cloned())
    }

    async fn find_member_by_name(
        &self,
        _guild: GuildId,
        name: &str,
    ) -> Result<Option<MemberInfo>, TransportError> {
        let name = name.to_lowercase();
        Ok(self
            .members
            .lock()
            .unwrap()
            .values()
            .find(|m| m.display_name.to_lowercase() == name)
            .cloned())
    }

    async fn grant_role(
        &self,
        _guild: GuildId,
        user: UserId,
        role: RoleId,
        _reason: &str,
    ) -> Result<(), TransportError> {
        self.check_roles()?;
        if let Some(member) = self.members.lock().unwrap().get_mut(&user) {
            member.roles.push(role);
        }
        self.record(Call::Grant { user, role });
        Ok(())
    }

    async fn revoke_role(
        &self,
        _guild: GuildId,
        user: UserId,
        role: RoleId,
        _reason: &str,
    ) -> Result<(), TransportError> {
        self.check_roles()?;
        if let Some(member) = self.members.lock().unwrap().get_mut(&user) {
            member.roles.retain(|r| *r != role);
        }
        self.record(Call::Revoke { user, role });
        Ok(())
    }

    async fn rename_role(
        &self,
        _guild: GuildId,
        role: RoleId,
        name: &str,
        _reason: &str,
    ) -> Result<(), TransportError> {
        self.check_roles()?;
        self.record(Call::Rename {
            role,
            name: name.to_string(),
        });
        Ok(())
    }

    async fn recolor_role(
        &self,
        _guild: GuildId,
        role: RoleId,
        colour: u32,
        _reason: &str,
    ) -> Result<(), TransportError> {
        self.check_roles()?;
        self.record(Call::Recolor { role, colour });
        Ok(())
    }

    async fn list_roles(&self, _guild: GuildId) -> Result<Vec<RoleInfo>, TransportError> {
        Ok(self.roles.lock().unwrap().clone())
    }

    async fn is_text_channel(&self, channel: ChannelId) -> Result<bool, TransportError> {
        Ok(self.text_channels.lock().unwrap().contains(&channel))
    }
}

/// Bot state over a memory store and a fake transport
pub fn test_data() -> (Data, Arc<FakeTransport>, Arc<MemoryStore>) {
    let nodes = Arc::new(MemoryStore::new());
    let transport = Arc::new(FakeTransport::new());
    let data = Data {
        store: Arc::new(BirthdayStore::new(nodes.clone())),
        transport: transport.clone(),
        settings: Arc::new(Settings {
            prefix: "$".to_string(),
            owner_ids: vec![OWNER],
        }),
        timezones: Arc::new(TimezoneTable::standard()),
        images: Arc::new(ImagePool::default()),
    };
    (data, transport, nodes)
}

/// Fill in every setting the announce sweep needs
pub async fn configure_community(data: &Data) {
    data.store
        .update_config(|config| {
            config.enabled = true;
            config.badge_role_ids = vec![RoleId::new(10), RoleId::new(11)];
            config.title_role_ids = vec![RoleId::new(20), RoleId::new(21), RoleId::new(22)];
            config.announcement_template = Some("Happy birthday @user@!".to_string());
            config.announcement_channel_id = Some(ANNOUNCE_CHANNEL);
            config.community_id = Some(GUILD);
        })
        .await;
}

/// Invocation by `author`, inside `guild_id` or in DMs
pub fn invoker(author: UserId, guild_id: Option<GuildId>) -> Invoker {
    Invoker {
        author_id: author,
        author_name: "alice".to_string(),
        channel_id: CHANNEL,
        guild_id,
    }
}

/// Regular member in the community
pub fn in_guild() -> Invoker {
    invoker(MEMBER, Some(GUILD))
}

pub fn in_dm() -> Invoker {
    invoker(MEMBER, None)
}

