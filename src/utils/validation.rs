/// Pure input validation for replies and command arguments (Discord-agnostic)

use thiserror::Error;

/// Longest name a member may give their badge role
pub const MAX_ROLE_NAME_LENGTH: usize = 30;

/// Longest reminder text
pub const MAX_REMINDER_LENGTH: usize = 1000;

/// Validation error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please use this command in a server instead.")]
    NotInGuild,
    #[error(
        "That color hex code seems to be invalid. Please pick one from here:\nhttps://www.color-hex.com/"
    )]
    InvalidColour,
    #[error("That role name is way too long, please pick a shorter one.")]
    RoleNameTooLong,
    #[error("That message is way too long!")]
    ReminderTooLong,
}

/// Extract a community ID, returning an error outside of one
pub fn require_guild<T>(guild_id: Option<T>) -> Result<T, ValidationError> {
    guild_id.ok_or(ValidationError::NotInGuild)
}

/// Accept exactly `yes`/`y` or `no`/`n`
pub fn parse_yes_no(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "yes" | "y" => Some(true),
        "no" | "n" => Some(false),
        _ => None,
    }
}

/// Parse `#abc` or `#aabbcc` into an RGB value.
///
/// Pure black is nudged to `#010101` since the platform treats 0 as "no colour".
pub fn parse_hex_colour(raw: &str) -> Result<u32, ValidationError> {
    let hex = raw.replace('#', "");
    let hex = hex.trim().to_lowercase();
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidColour);
    }

    let expanded = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => hex,
        _ => return Err(ValidationError::InvalidColour),
    };

    let colour = u32::from_str_radix(&expanded, 16).map_err(|_| ValidationError::InvalidColour)?;
    Ok(if colour == 0 { 0x010101 } else { colour })
}

/// Validate a new badge role name
pub fn validate_role_name(name: &str) -> Result<&str, ValidationError> {
    let name = name.trim();
    if name.chars().count() > MAX_ROLE_NAME_LENGTH {
        return Err(ValidationError::RoleNameTooLong);
    }
    Ok(name)
}

/// Validate reminder text
pub fn validate_reminder_text(text: &str) -> Result<&str, ValidationError> {
    if text.chars().count() > MAX_REMINDER_LENGTH {
        return Err(ValidationError::ReminderTooLong);
    }
    Ok(text)
}

fn parse_mention(raw: &str, sigils: &[&str]) -> Option<u64> {
    let inner = raw.trim().strip_prefix('<')?.strip_suffix('>')?;
    let digits = sigils.iter().find_map(|sigil| inner.strip_prefix(sigil))?;
    digits.parse::<u64>().ok().filter(|id| *id != 0)
}

/// Parse `<@123>` or `<@!123>` into a user id
pub fn parse_user_mention(raw: &str) -> Option<u64> {
    parse_mention(raw, &["@!", "@"])
}

/// Parse `<#123>` or a bare `123` into a channel id
pub fn parse_channel_reference(raw: &str) -> Option<u64> {
    parse_mention(raw, &["#"]).or_else(|| raw.trim().parse::<u64>().ok().filter(|id| *id != 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_guild() {
        assert!(require_guild::<u64>(None).is_err());
        assert_eq!(require_guild(Some(123u64)), Ok(123));
    }

    #[test]
    fn test_parse_yes_no() {
        assert_eq!(parse_yes_no("yes"), Some(true));
        assert_eq!(parse_yes_no(" Y "), Some(true));
        assert_eq!(parse_yes_no("NO"), Some(false));
        assert_eq!(parse_yes_no("n"), Some(false));
        assert_eq!(parse_yes_no("yeah"), None);
        assert_eq!(parse_yes_no("yes please"), None);
        assert_eq!(parse_yes_no(""), None);
    }

    #[test]
    fn test_parse_hex_colour() {
        assert_eq!(parse_hex_colour("#9a72cc"), Ok(0x9a72cc));
        assert_eq!(parse_hex_colour("9A72CC"), Ok(0x9a72cc));
        assert_eq!(parse_hex_colour("#abc"), Ok(0xaabbcc));
        assert_eq!(parse_hex_colour("#000"), Ok(0x010101));
        assert_eq!(parse_hex_colour("000000"), Ok(0x010101));
        assert_eq!(parse_hex_colour("#abcd"), Err(ValidationError::InvalidColour));
        assert_eq!(parse_hex_colour("#ggg"), Err(ValidationError::InvalidColour));
        assert_eq!(parse_hex_colour(""), Err(ValidationError::InvalidColour));
    }

    #[test]
    fn test_validate_role_name() {
        assert_eq!(validate_role_name(" Party Person "), Ok("Party Person"));
        assert!(validate_role_name(&"x".repeat(30)).is_ok());
        assert_eq!(
            validate_role_name(&"x".repeat(31)),
            Err(ValidationError::RoleNameTooLong)
        );
    }

    #[test]
    fn test_error_texts() {
        assert_eq!(
            ValidationError::NotInGuild.to_string(),
            "Please use this command in a server instead."
        );
        assert_eq!(
            ValidationError::InvalidColour.to_string(),
            "That color hex code seems to be invalid. Please pick one from here:\nhttps://www.color-hex.com/"
        );
        assert_eq!(ValidationError::ReminderTooLong.to_string(), "That message is way too long!");
    }

    #[test]
    fn test_validate_reminder_text() {
        assert!(validate_reminder_text(&"x".repeat(1000)).is_ok());
        assert_eq!(
            validate_reminder_text(&"x".repeat(1001)),
            Err(ValidationError::ReminderTooLong)
        );
    }

    #[test]
    fn test_parse_user_mention() {
        assert_eq!(parse_user_mention("<@123>"), Some(123));
        assert_eq!(parse_user_mention("<@!123>"), Some(123));
        assert_eq!(parse_user_mention("<#123>"), None);
        assert_eq!(parse_user_mention("<@0>"), None);
        assert_eq!(parse_user_mention("alice"), None);
    }

    #[test]
    fn test_parse_channel_reference() {
        assert_eq!(parse_channel_reference("<#456>"), Some(456));
        assert_eq!(parse_channel_reference("456"), Some(456));
        assert_eq!(parse_channel_reference("<@456>"), None);
        assert_eq!(parse_channel_reference("general"), None);
    }
}
