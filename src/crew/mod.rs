//! The product-design crew: roles, tasks and the sequential runner
//!
//! A kickoff runs market analysis, technical assessment and feasibility
//! evaluation in that order. Each task sees the topic plus the outputs of
//! the tasks before it.

pub mod errors;
pub mod events;
mod pipeline;
mod roles;
mod tasks;

pub use errors::CrewError;
pub use events::{silent, CrewEvent, EventCallback};
pub use pipeline::{Crew, CrewOutput, TaskOutput, Topic};
pub use roles::{base_prompt, Role, RoleKind, FORMAT_REMINDERS};
pub use tasks::{Task, TaskKind};
