/// Services that hold business state between handlers and the scheduler
mod birthday_store;

pub use birthday_store::BirthdayStore;
