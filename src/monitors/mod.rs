//! Monitoring core: classification, alert deduplication, inactivity tracking
//! and reminder matching. Nothing in here performs I/O.

pub mod classifier;
pub mod dedup;
pub mod inactivity;
pub mod reminders;
