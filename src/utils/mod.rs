/// Utility modules for common functionality
pub mod datetime;
pub mod message_formatter;
pub mod messages;
pub mod permissions;
pub mod role_logic;
pub mod schedule_utils;
pub mod timezone;
pub mod validation;
