pub mod alerts;
pub mod banners;
pub mod chat;
pub mod health;
pub mod log;
pub mod reminders;
pub mod stats;
