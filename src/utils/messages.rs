/// Pure functions for formatting error and success messages (Discord-agnostic)
use crate::models::MissingSetting;
use crate::utils::message_formatter::join_with_and;

/// Format a validation error message with emoji
pub fn format_error(message: &str) -> String {
    format!("❌ {}", message)
}

/// Format a success message with emoji
pub fn format_success(message: &str) -> String {
    format!("✅ {}", message)
}

/// Reply for admin-gated commands
pub fn build_admin_only_error() -> String {
    format_error("You must be an administrator to use this command!")
}

/// Reply for owner-gated commands
pub fn build_owner_only_error() -> String {
    format_error("You must be a bot owner to use this command!")
}

/// Build a persistence error message (generic, doesn't expose internals)
pub fn build_database_error() -> String {
    format_error("I couldn't save that right now. Please try again later.")
}

fn describe_setting(setting: MissingSetting) -> &'static str {
    match setting {
        MissingSetting::Roles => "the birthday roles **($roles)**",
        MissingSetting::Message => "the birthday message **($message)**",
        MissingSetting::Channel => "the birthday announcement channel **($channel)**",
    }
}

/// Describe unset configuration, e.g. "the birthday roles **($roles)** and the birthday message **($message)**"
pub fn describe_missing_settings(missing: &[MissingSetting], prefix: &str) -> Option<String> {
    if missing.is_empty() {
        return None;
    }
    let names: Vec<String> = missing
        .iter()
        .map(|setting| describe_setting(*setting).replace('$', prefix))
        .collect();
    Some(join_with_and(&names))
}

/// Bullet line listing unset configuration, or nothing when complete
pub fn build_missing_settings_line(missing: &[MissingSetting], prefix: &str) -> String {
    describe_missing_settings(missing, prefix)
        .map(|names| format!("• You still haven't set {}.\n", names))
        .unwrap_or_default()
}
