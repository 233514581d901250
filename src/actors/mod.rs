//! Actor-based monitoring loops
//!
//! Each loop runs as an independent tokio task and is controlled through an
//! mpsc command channel.
//!
//! ## Architecture Overview
//!
//! ```text
//!                  ┌──────────────────┐
//!                  │    Supervisor    │
//!                  └────────┬─────────┘
//!                           │ spawns
//!          ┌────────────────┼────────────────┐
//!          │                │                │
//!  ┌───────▼──────┐ ┌───────▼──────┐ ┌───────▼───────┐
//!  │ MonitorActor │ │ MonitorActor │ │ ReminderActor │
//!  │   (health)   │ │   (safety)   │ │               │
//!  └───────┬──────┘ └───────┬──────┘ └───────┬───────┘
//!          │                │                │
//!          └──── Arc<DedupState> ────┐       │
//!                           │        │       │
//!                  ┌────────▼───┐ ┌──▼───────▼──┐
//!                  │  EventLog  │ │  Notifier   │
//!                  └────────────┘ └─────────────┘
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: `TickNow`, `UpdateInterval`, `GetStats`, `Shutdown`
//! 2. **Request/Response**: oneshot channels for tick results and stats
//! 3. **Shared state**: the deduplicator and event log are shared by `Arc`

pub mod messages;
pub mod monitor;
pub mod reminder;
pub mod supervisor;

pub use messages::{ReminderDispatch, TickError, TickOutcome, TickStats};
pub use monitor::{MonitorContext, MonitorHandle};
pub use reminder::{Clock, ReminderHandle};
pub use supervisor::{Supervisor, SupervisorHandle};
