/// Pure functions for birthday role logic (Discord-agnostic)
use crate::models::RoleLifecycleState;
use crate::utils::timezone::BirthdayWindow;

/// Name every pooled badge role carries, and is reset to on grant
pub const BADGE_ROLE_NAME: &str = "Birthday Role";

/// Title role names in gender index order
pub const TITLE_ROLE_NAMES: [&str; 3] = ["Birthday Boy", "Birthday Girl", "Birthday Cutie"];

/// What the announce sweep should do for one member this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    /// Grant roles and post the announcement
    Announce,
    /// The window ended; take the title role back
    RevokeTitle,
    /// The finalize instant passed; take the badge role back
    RevokeBadge,
    NoAction,
}

/// Determine the next lifecycle step for a configured member
pub fn determine_lifecycle_action(
    announced: bool,
    role_state: RoleLifecycleState,
    window: &BirthdayWindow,
    now_ms: i64,
) -> LifecycleAction {
    if !announced && window.contains(now_ms) {
        return LifecycleAction::Announce;
    }
    match role_state {
        RoleLifecycleState::Given | RoleLifecycleState::ExpiringPrimary if window.end < now_ms => {
            LifecycleAction::RevokeTitle
        }
        RoleLifecycleState::ExpiringSecondary if window.finalize < now_ms => {
            LifecycleAction::RevokeBadge
        }
        _ => LifecycleAction::NoAction,
    }
}

/// Round-robin cursor into the badge pool, wrapping when the pool shrank
pub fn current_badge_index(last_used: usize, pool_len: usize) -> usize {
    if last_used >= pool_len { 0 } else { last_used }
}

/// Cursor value after `index` was handed out
pub fn advance_badge_index(index: usize, pool_len: usize) -> usize {
    if pool_len == 0 { 0 } else { (index + 1) % pool_len }
}

/// Roles found by name in a community
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredRoles {
    pub badges: Vec<u64>,
    pub titles: [Option<u64>; 3],
}

impl DiscoveredRoles {
    /// Title role names that weren't found
    pub fn missing_titles(&self) -> Vec<&'static str> {
        self.titles
            .iter()
            .zip(TITLE_ROLE_NAMES)
            .filter(|(id, _)| id.is_none())
            .map(|(_, name)| name)
            .collect()
    }

    /// All three title roles in index order, if every one exists
    pub fn complete_titles(&self) -> Option<Vec<u64>> {
        self.titles.iter().copied().collect()
    }
}

/// Sort community roles into the badge pool and the three title roles (names compared case-insensitively)
pub fn discover_roles<'a>(roles: impl IntoIterator<Item = (u64, &'a str)>) -> DiscoveredRoles {
    let mut found = DiscoveredRoles::default();
    for (id, name) in roles {
        let name = name.trim().to_lowercase();
        if name == BADGE_ROLE_NAME.to_lowercase() {
            found.badges.push(id);
            continue;
        }
        if let Some(index) = TITLE_ROLE_NAMES
            .iter()
            .position(|title| title.to_lowercase() == name)
        {
            found.titles[index].get_or_insert(id);
        }
    }
    found
}

/// First held role that belongs to `pool`
pub fn find_held_role<T: Copy + PartialEq>(held: &[T], pool: &[T]) -> Option<T> {
    held.iter().copied().find(|role| pool.contains(role))
}
