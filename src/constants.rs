use std::time::Duration;

/// Command prefix used when `COMMAND_PREFIX` is unset
pub const DEFAULT_PREFIX: &str = "$";

/// Directory scanned for announcement images when `ASSETS_DIR` is unset
pub const DEFAULT_ASSETS_DIR: &str = "assets";

/// Yearly recompute check, every quarter hour (UTC)
pub const YEARLY_RECOMPUTE_CRON: &str = "0 */15 * * * *";

/// Announce sweep, every quarter hour (UTC)
pub const BIRTHDAY_SWEEP_CRON: &str = "0 */15 * * * *";

/// Delay between reminder sweeps
pub const REMINDER_SWEEP_INTERVAL: Duration = Duration::from_secs(45);

/// Log directive for the application
pub const LOG_DIRECTIVE: &str = "birthday_bot=info";
