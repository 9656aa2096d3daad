use poise::serenity_prelude::{ChannelId, GuildId, RoleId, UserId};
use serde::{Deserialize, Serialize};
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::services::BirthdayStore;
use crate::transport::ChatTransport;
use crate::utils::schedule_utils::ReminderOffset;
use crate::utils::timezone::{BirthdayWindow, TimezoneTable};

/// Gender picked during onboarding, used only to choose a title role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Classify free text; anything unrecognised is `Other`
    pub fn classify(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "male" | "m" => Gender::Male,
            "female" | "f" => Gender::Female,
            _ => Gender::Other,
        }
    }

    /// Index into the configured title roles
    pub fn title_index(self) -> usize {
        match self {
            Gender::Male => 0,
            Gender::Female => 1,
            Gender::Other => 2,
        }
    }

    /// Shown back to the member when confirming
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

/// Step of the direct-message onboarding dialogue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnboardingState {
    #[default]
    None,
    AwaitingDate,
    ConfirmingDate,
    AwaitingTime,
    ConfirmingTime,
    AwaitingGender,
    ConfirmingGender,
    Done,
}

impl OnboardingState {
    /// Whether the user is in the middle of the dialogue
    pub fn is_pending(self) -> bool {
        !matches!(self, OnboardingState::None | OnboardingState::Done)
    }
}

/// Which birthday roles a member currently holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoleLifecycleState {
    #[default]
    None,
    /// Title and badge roles granted
    Given,
    /// Window ended, title role removal pending
    ExpiringPrimary,
    /// Only the badge role is left
    ExpiringSecondary,
}

/// One tracked member's birthday
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthdayRecord {
    pub user_id: UserId,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub window: Option<BirthdayWindow>,
    #[serde(default)]
    pub announced: bool,
    #[serde(default)]
    pub onboarding: OnboardingState,
    #[serde(default)]
    pub role_state: RoleLifecycleState,
    /// Whether the user answered the time prompt in 12-hour form
    #[serde(default)]
    pub twelve_hour_clock: bool,
}

impl BirthdayRecord {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            day: None,
            month: None,
            timezone: None,
            gender: None,
            window: None,
            announced: false,
            onboarding: OnboardingState::None,
            role_state: RoleLifecycleState::None,
            twelve_hour_clock: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.onboarding == OnboardingState::Done
    }

    /// `(day, month)` when both are known
    pub fn date(&self) -> Option<(u32, u32)> {
        Some((self.day?, self.month?))
    }
}

/// Per-community birthday settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Configuration {
    pub enabled: bool,
    pub badge_role_ids: Vec<RoleId>,
    pub title_role_ids: Vec<RoleId>,
    pub announcement_template: Option<String>,
    pub announcement_channel_id: Option<ChannelId>,
    pub community_id: Option<GuildId>,
    pub last_calculated_year: Option<i32>,
    pub last_role_index_used: usize,
}

/// A piece of configuration still missing before announcements can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSetting {
    Roles,
    Message,
    Channel,
}

impl Configuration {
    /// Configuration written when the community has none yet
    pub fn initial(year: i32) -> Self {
        Self {
            enabled: true,
            last_calculated_year: Some(year),
            ..Self::default()
        }
    }

    pub fn missing_settings(&self) -> Vec<MissingSetting> {
        let mut missing = Vec::new();
        if self.badge_role_ids.is_empty() || self.title_role_ids.len() != 3 {
            missing.push(MissingSetting::Roles);
        }
        if self.announcement_template.is_none() {
            missing.push(MissingSetting::Message);
        }
        if self.announcement_channel_id.is_none() || self.community_id.is_none() {
            missing.push(MissingSetting::Channel);
        }
        missing
    }

    /// Everything the announce sweep needs is set (ignores `enabled`)
    pub fn is_complete(&self) -> bool {
        self.missing_settings().is_empty()
    }

    /// Complete and switched on
    pub fn can_announce(&self) -> bool {
        self.enabled && self.is_complete()
    }
}

/// A message to post in a channel at a later time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRecord {
    pub text: String,
    /// UTC milliseconds
    pub trigger_at: i64,
    pub author_id: UserId,
    pub channel_id: ChannelId,
    #[serde(default)]
    pub is_periodic: bool,
    #[serde(default)]
    pub offset: Option<ReminderOffset>,
}

/// Process-level settings read from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub prefix: String,
    pub owner_ids: Vec<UserId>,
}

/// Decorative images attached to announcements
#[derive(Debug, Clone, Default)]
pub struct ImagePool {
    pub paths: Vec<PathBuf>,
}

impl ImagePool {
    /// Collect the files in `dir`, skipping thumbnail databases
    pub fn from_dir(dir: &Path) -> std::io::Result<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && !is_thumbnail_db(path))
            .collect();
        paths.sort();
        Ok(Self { paths })
    }

    /// A random image, if any were found
    pub fn random(&self) -> Option<&Path> {
        self.paths
            .choose(&mut rand::thread_rng())
            .map(PathBuf::as_path)
    }
}

fn is_thumbnail_db(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("db"))
}

/// Bot state shared across all handlers
#[derive(Clone)]
pub struct Data {
    /// In-memory record tables backed by persistence
    pub store: Arc<BirthdayStore>,
    /// Chat platform collaborator
    pub transport: Arc<dyn ChatTransport>,
    pub settings: Arc<Settings>,
    pub timezones: Arc<TimezoneTable>,
    pub images: Arc<ImagePool>,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
