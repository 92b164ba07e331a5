//! Core types for taskcal.
//!
//! This crate holds everything that does not talk to the outside world:
//! - `task`: tasks, priority tiers and the classified task set
//! - `parser`: turning a classifier reply into a classified task set
//! - `schedule`: the priority-aware scheduling policy
//! - `prompt`: the fixed classification prompt
//! - `protocol`: the CLI <-> calendar provider protocol

pub mod error;
pub mod parser;
pub mod prompt;
pub mod protocol;
pub mod schedule;
pub mod task;

pub use error::{TaskCalError, TaskCalResult};
pub use parser::parse_reply;
pub use schedule::{SchedulePolicy, ScheduledEvent};
pub use task::{ClassifiedTaskSet, PriorityTier, Task};
