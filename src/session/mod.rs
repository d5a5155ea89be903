//! The session engine and its deferred-task machinery.
//!
//! ## Key Types
//!
//! - `Session`: Owns the state and applies every operation
//! - `Scheduler`: Deadline-ordered queue of generation-tagged tasks
//! - `SessionEvent`: Change notifications drained by the owner

pub mod engine;
pub mod events;
pub mod scheduler;

pub use engine::Session;
pub use events::{MatchOutcome, SessionEvent};
pub use scheduler::{ScheduledTask, Scheduler, TaskId, TaskKind};
