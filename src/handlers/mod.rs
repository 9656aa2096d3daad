/// Handler modules for Discord events and the onboarding dialogue
mod message;
mod onboarding;

// Re-export main handler functions
pub use message::handle_message;
pub use onboarding::DATE_PROMPT;
