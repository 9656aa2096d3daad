/// Pure functions for announcement and reply formatting (Discord-agnostic)

/// Token in the announcement template replaced with the birthday member's mention
pub const USER_PLACEHOLDER: &str = "@user@";

/// Longest rendered announcement the platform accepts with room for a mention
pub const MAX_ANNOUNCEMENT_LENGTH: usize = 1995;

/// Build a user mention from a raw id
pub fn mention(user_id: u64) -> String {
    format!("<@{}>", user_id)
}

/// Build a channel mention from a raw id
pub fn channel_mention(channel_id: u64) -> String {
    format!("<#{}>", channel_id)
}

/// Replace every placeholder in an announcement template
pub fn render_announcement(template: &str, user_id: u64) -> String {
    template.replace(USER_PLACEHOLDER, &mention(user_id))
}

/// Whether an announcement template renders to an acceptable length
pub fn fits_announcement_limit(template: &str, user_id: u64) -> bool {
    render_announcement(template, user_id).chars().count() <= MAX_ANNOUNCEMENT_LENGTH
}

/// Text posted when a reminder fires
pub fn render_reminder(author_id: u64, text: &str) -> String {
    format!("{} {}", mention(author_id), text)
}

/// Show how a command is typed, e.g. `` `$reminder 1d It is time!` ``
pub fn usage(prefix: &str, command: &str, args: &str) -> String {
    if args.is_empty() {
        format!("`{}{}`", prefix, command)
    } else {
        format!("`{}{} {}`", prefix, command, args)
    }
}

/// Join items as "a", "a and b" or "a, b and c"
pub fn join_with_and(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
